//! Error types for the notion-post-sync library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SyncError`] — **Fatal for one document or one collection**: the
//!   record export cannot be read, or the post file cannot be written.
//!   Returned as `Err(SyncError)` from [`crate::convert::sync_document`] and
//!   recorded per document by the run loop, which then moves on.
//!
//! * [`AssetError`] — **Non-fatal**: a single image failed to download or
//!   could not be stored. The reference keeps its remote URL and the error is
//!   kept in [`crate::output::AssetSummary`] so callers can report it.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a single document (or a single collection read).
#[derive(Debug, Error)]
pub enum SyncError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// No export file exists for the requested collection.
    #[error("Collection export not found: '{path}'\nExport the collection first or check --source-dir.")]
    SourceNotFound { path: PathBuf },

    /// The export file exists but could not be read.
    #[error("Failed to read collection export '{path}': {source}")]
    SourceReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export file is not a JSON array of records.
    #[error("Collection export '{path}' is not valid: {source}")]
    InvalidRecords {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the category directory for a post.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the post file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another document of the same run already produced this path.
    #[error("Output path '{path}' was already written by another document in this run")]
    DuplicateOutput { path: PathBuf },

    /// Front matter could not be serialised.
    #[error("Failed to serialise front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single remote image.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum AssetError {
    /// The transfer itself failed (DNS, TLS, connection reset, …).
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The transfer exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The host answered with a non-success status (expired signed URL, …).
    #[error("Download of '{url}' returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The bytes arrived but could not be stored locally.
    #[error("Failed to store asset at '{path}': {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

impl AssetError {
    /// The remote URL this error relates to, when known.
    pub fn url(&self) -> Option<&str> {
        match self {
            AssetError::DownloadFailed { url, .. }
            | AssetError::DownloadTimeout { url, .. }
            | AssetError::HttpStatus { url, .. } => Some(url),
            AssetError::WriteFailed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_output_display() {
        let e = SyncError::DuplicateOutput {
            path: PathBuf::from("_posts/general/2024-01-01-a.md"),
        };
        let msg = e.to_string();
        assert!(msg.contains("2024-01-01-a.md"), "got: {msg}");
    }

    #[test]
    fn http_status_display() {
        let e = AssetError::HttpStatus {
            url: "https://files.example/img.png".into(),
            status: 403,
        };
        assert!(e.to_string().contains("403"));
        assert_eq!(e.url(), Some("https://files.example/img.png"));
    }

    #[test]
    fn timeout_display() {
        let e = AssetError::DownloadTimeout {
            url: "https://files.example/a.png".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn write_failed_has_no_url() {
        let e = AssetError::WriteFailed {
            path: PathBuf::from("assets/images/a/b.png"),
            reason: "disk full".into(),
        };
        assert!(e.url().is_none());
        assert!(e.to_string().contains("disk full"));
    }
}
