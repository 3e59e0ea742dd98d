//! Record sources: where exported pages come from.
//!
//! Talking to the remote content API is someone else's job; this crate
//! starts from exported records. [`DocumentSource`] is the seam, and
//! [`JsonDirSource`] reads one JSON export file per collection.

use crate::document::DocumentRecord;
use crate::error::SyncError;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Supplies the records of one collection, in listing order.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Published records of `collection_id`.
    async fn fetch_documents(&self, collection_id: &str) -> Result<Vec<DocumentRecord>, SyncError>;
}

/// Reads `<dir>/<collection_id>.json`, a JSON array of [`DocumentRecord`]s.
///
/// Records with `"published": false` are dropped.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Export file for `collection_id`.
    pub fn export_path(&self, collection_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", collection_id.trim()))
    }
}

#[async_trait]
impl DocumentSource for JsonDirSource {
    async fn fetch_documents(&self, collection_id: &str) -> Result<Vec<DocumentRecord>, SyncError> {
        let path = self.export_path(collection_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SyncError::SourceNotFound { path });
            }
            Err(e) => return Err(SyncError::SourceReadFailed { path, source: e }),
        };

        let records: Vec<DocumentRecord> = serde_json::from_str(&raw)
            .map_err(|e| SyncError::InvalidRecords {
                path: path.clone(),
                source: e,
            })?;
        let total = records.len();
        let published: Vec<DocumentRecord> = records.into_iter().filter(|r| r.published).collect();
        debug!(
            "{}: {} records, {} published",
            path.display(),
            total,
            published.len()
        );
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reads_published_records_in_order() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("db1.json"),
            r#"[
                {"id": "a", "title": "First", "body": "x"},
                {"id": "b", "title": "Draft", "published": false, "body": "y"},
                {"id": "c", "title": "Third", "body": "z"}
            ]"#,
        )
        .unwrap();

        let source = JsonDirSource::new(tmp.path());
        let records = source.fetch_documents(" db1 ").await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn missing_export_is_reported() {
        let tmp = TempDir::new().unwrap();
        let err = JsonDirSource::new(tmp.path())
            .fetch_documents("nope")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn malformed_export_is_reported() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.json"), "{not json").unwrap();
        let err = JsonDirSource::new(tmp.path())
            .fetch_documents("bad")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidRecords { .. }));
    }
}
