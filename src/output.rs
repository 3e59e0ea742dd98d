//! Result types for one document and for a whole sync run.

use crate::error::AssetError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image mirroring outcome for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetSummary {
    /// Distinct remote URLs that now point at a local file.
    pub localized: usize,
    /// Distinct remote URLs left in place because mirroring failed.
    pub failures: Vec<AssetError>,
}

/// Why a document produced no file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The converter produced no content.
    EmptySource,
    /// Nothing but whitespace was left after normalisation.
    EmptyAfterNormalisation,
}

/// What happened to a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DocumentOutcome {
    /// A post file was written.
    Written { path: PathBuf, assets: AssetSummary },
    /// The document was skipped; no file was written.
    Skipped { reason: SkipReason },
    /// The document failed; siblings were still processed.
    Failed { error: String },
}

/// One line of the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub collection: String,
    pub id: String,
    pub title: String,
    pub outcome: DocumentOutcome,
}

/// A collection whose export could not be read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionError {
    pub collection: String,
    pub error: String,
}

/// Summary of a whole sync run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub documents: Vec<DocumentReport>,
    pub collection_errors: Vec<CollectionError>,
    pub total_duration_ms: u64,
}

impl SyncReport {
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Failed { .. }))
    }

    /// Asset failures across all written documents.
    pub fn asset_failures(&self) -> usize {
        self.documents
            .iter()
            .map(|d| match &d.outcome {
                DocumentOutcome::Written { assets, .. } => assets.failures.len(),
                _ => 0,
            })
            .sum()
    }

    /// `true` when no document and no collection failed.
    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.collection_errors.is_empty()
    }

    fn count(&self, pred: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(collection: &str, outcome: DocumentOutcome) -> DocumentReport {
        DocumentReport {
            collection: collection.into(),
            id: "id".into(),
            title: "t".into(),
            outcome,
        }
    }

    #[test]
    fn counts_by_outcome() {
        let r = SyncReport {
            documents: vec![
                report(
                    "a",
                    DocumentOutcome::Written {
                        path: PathBuf::from("x.md"),
                        assets: AssetSummary {
                            localized: 1,
                            failures: vec![AssetError::HttpStatus {
                                url: "u".into(),
                                status: 404,
                            }],
                        },
                    },
                ),
                report(
                    "a",
                    DocumentOutcome::Skipped {
                        reason: SkipReason::EmptySource,
                    },
                ),
                report("b", DocumentOutcome::Failed { error: "io".into() }),
            ],
            ..Default::default()
        };
        assert_eq!(r.written(), 1);
        assert_eq!(r.skipped(), 1);
        assert_eq!(r.failed(), 1);
        assert_eq!(r.asset_failures(), 1);
        assert!(!r.is_clean());
    }

    #[test]
    fn empty_report_is_clean() {
        assert!(SyncReport::default().is_clean());
    }
}
