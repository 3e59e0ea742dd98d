//! The run loop: every collection, every document, one at a time.
//!
//! Collections are processed in the order given, documents in listing
//! order. Nothing here is fatal to the run: a collection that cannot be read
//! is recorded and skipped, a document that fails is recorded and the next
//! one starts. The caller decides what a non-clean [`SyncReport`] means.

use crate::config::SyncConfig;
use crate::convert::PostSyncer;
use crate::document::Document;
use crate::output::{CollectionError, DocumentOutcome, DocumentReport, SyncReport};
use crate::pipeline::assets::AssetFetcher;
use crate::progress::ProgressCallback;
use crate::source::DocumentSource;
use chrono::{Local, NaiveDate};
use std::time::Instant;
use tracing::{info, warn};

/// Sync every collection, using today's local date as the last date fallback.
pub async fn sync_collections(
    source: &dyn DocumentSource,
    collection_ids: &[String],
    config: &SyncConfig,
    fetcher: &dyn AssetFetcher,
    progress: Option<&ProgressCallback>,
) -> SyncReport {
    let today = Local::now().date_naive();
    sync_collections_on(source, collection_ids, config, fetcher, progress, today).await
}

/// [`sync_collections`] with an explicit "today".
pub async fn sync_collections_on(
    source: &dyn DocumentSource,
    collection_ids: &[String],
    config: &SyncConfig,
    fetcher: &dyn AssetFetcher,
    progress: Option<&ProgressCallback>,
    today: NaiveDate,
) -> SyncReport {
    let start = Instant::now();
    let mut report = SyncReport::default();
    let mut syncer = PostSyncer::new(config, fetcher);

    if let Some(cb) = progress {
        cb.on_sync_start(collection_ids.len());
    }

    for collection in collection_ids {
        let records = match source.fetch_documents(collection).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Collection {} failed: {}", collection, e);
                if let Some(cb) = progress {
                    cb.on_collection_error(collection, &e.to_string());
                }
                report.collection_errors.push(CollectionError {
                    collection: collection.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        info!("Collection {}: {} posts", collection, records.len());
        if let Some(cb) = progress {
            cb.on_collection_start(collection, records.len());
        }

        for record in records {
            let doc = Document::from_record(record, today);
            let outcome = match syncer.sync_document(&doc).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Failed to sync '{}': {}", doc.title, e);
                    DocumentOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };

            if let Some(cb) = progress {
                match &outcome {
                    DocumentOutcome::Written { path, .. } => cb.on_document_written(&doc.title, path),
                    DocumentOutcome::Skipped { .. } => cb.on_document_skipped(&doc.title),
                    DocumentOutcome::Failed { error } => cb.on_document_error(&doc.title, error),
                }
            }

            report.documents.push(DocumentReport {
                collection: collection.clone(),
                id: doc.id,
                title: doc.title,
                outcome,
            });
        }
    }

    report.total_duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Synced {} posts from {} collections ({} skipped, {} failed) in {}ms",
        report.written(),
        collection_ids.len(),
        report.skipped(),
        report.failed(),
        report.total_duration_ms
    );

    if let Some(cb) = progress {
        cb.on_sync_complete(report.written(), report.skipped(), report.failed());
    }

    report
}
