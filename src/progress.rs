//! Progress-callback trait for per-document sync events.
//!
//! Pass an [`Arc<dyn SyncProgressCallback>`] to
//! [`crate::sync::sync_collections`] to receive events as the run loop
//! walks collections and documents. The CLI uses it to drive a terminal
//! progress bar; library users can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use notion_post_sync::SyncProgressCallback;
//! use std::path::Path;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Counter(AtomicUsize);
//!
//! impl SyncProgressCallback for Counter {
//!     fn on_document_written(&self, _title: &str, _path: &Path) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the run loop as it processes collections and documents.
///
/// All methods have default no-op implementations so callers only
/// override what they care about.
pub trait SyncProgressCallback: Send + Sync {
    /// Called once before the first collection is read.
    fn on_sync_start(&self, collections: usize) {
        let _ = collections;
    }

    /// Called after a collection's records were fetched.
    fn on_collection_start(&self, collection: &str, documents: usize) {
        let _ = (collection, documents);
    }

    /// Called when a collection could not be read at all.
    fn on_collection_error(&self, collection: &str, error: &str) {
        let _ = (collection, error);
    }

    /// Called after a post file was written.
    fn on_document_written(&self, title: &str, path: &Path) {
        let _ = (title, path);
    }

    /// Called when a document produced no file because it was blank.
    fn on_document_skipped(&self, title: &str) {
        let _ = title;
    }

    /// Called when a document failed.
    fn on_document_error(&self, title: &str, error: &str) {
        let _ = (title, error);
    }

    /// Called once after every collection was attempted.
    fn on_sync_complete(&self, written: usize, skipped: usize, failed: usize) {
        let _ = (written, skipped, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SyncProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn SyncProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        written: AtomicUsize,
        skipped: AtomicUsize,
        errors: AtomicUsize,
    }

    impl SyncProgressCallback for TrackingCallback {
        fn on_document_written(&self, _title: &str, _path: &Path) {
            self.written.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_skipped(&self, _title: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _title: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_sync_start(2);
        cb.on_collection_start("db", 3);
        cb.on_collection_error("db2", "missing");
        cb.on_document_written("t", Path::new("a.md"));
        cb.on_document_skipped("t");
        cb.on_document_error("t", "boom");
        cb.on_sync_complete(1, 1, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_document_written("a", Path::new("a.md"));
        tracker.on_document_written("b", Path::new("b.md"));
        tracker.on_document_skipped("c");
        tracker.on_document_error("d", "io");
        assert_eq!(tracker.written.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_sync_start(1);
    }
}
