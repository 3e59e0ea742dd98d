//! # notion-post-sync
//!
//! Turn exported Notion pages into Jekyll-ready posts.
//!
//! Each page arrives as a record whose body is the markdown produced by a
//! block-to-markdown converter. That markdown renders badly as-is: quotes
//! swallow the next paragraph, consecutive blocks merge into one paragraph,
//! captions of toggle blocks show raw `**stars**`, and images point at
//! signed upload URLs that expire within the hour. This crate fixes all of
//! that and writes one post file per page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! record
//!  │
//!  ├─ 1. Protect     lift code fences and <details> blocks out
//!  ├─ 2. Reformat    quotes, paragraph breaks, blank lines
//!  ├─ 3. Assets      mirror expiring images under assets/images/<slug>/
//!  ├─ 4. Captions    inline markdown in <summary> → HTML
//!  ├─ 5. Disclosure  finish each <details> block
//!  ├─ 6. Restore     put protected regions back
//!  └─ 7. Write       front matter + body → _posts/<categories>/<date>-<slug>.md
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notion_post_sync::{sync_collections, HttpFetcher, JsonDirSource, SyncConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SyncConfig::default();
//!     let fetcher = HttpFetcher::new(config.download_timeout_secs)?;
//!     let source = JsonDirSource::new("exports");
//!     let ids = vec!["blog".to_string()];
//!
//!     let report = sync_collections(&source, &ids, &config, &fetcher, None).await;
//!     eprintln!("{} written, {} failed", report.written(), report.failed());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `notion2post` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod source;
pub mod sync;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DuplicatePolicy, ParagraphBreak, SyncConfig, SyncConfigBuilder};
pub use convert::{normalize_body, post_path, render_post, sync_document, FrontMatter, PostSyncer};
pub use document::{Document, DocumentRecord};
pub use error::{AssetError, SyncError};
pub use output::{AssetSummary, DocumentOutcome, DocumentReport, SkipReason, SyncReport};
pub use pipeline::assets::{AssetFetcher, HttpFetcher};
pub use progress::{NoopProgressCallback, ProgressCallback, SyncProgressCallback};
pub use source::{DocumentSource, JsonDirSource};
pub use sync::{sync_collections, sync_collections_on};
