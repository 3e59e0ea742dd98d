//! Document assembly: run the pipeline and write one post file.
//!
//! [`normalize_body`] drives the stages of [`crate::pipeline`] in their fixed
//! order; [`PostSyncer`] adds front matter, computes the output path, applies
//! the duplicate-path policy and writes the file.

use crate::config::{DuplicatePolicy, SyncConfig};
use crate::document::Document;
use crate::error::SyncError;
use crate::output::{AssetSummary, DocumentOutcome, SkipReason};
use crate::pipeline::assets::{suffixed_name, AssetFetcher, AssetLocalizer};
use crate::pipeline::{disclosure, inline, protect, reformat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Front matter written at the top of every post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub layout: String,
    pub title: String,
    pub date: String,
    /// One entry: the `/`-joined category path.
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub author: String,
}

impl FrontMatter {
    pub fn new(doc: &Document, config: &SyncConfig) -> Self {
        Self {
            layout: config.layout.clone(),
            title: doc.title.clone(),
            date: doc.date.format("%Y-%m-%d").to_string(),
            categories: vec![doc.category_path()],
            tags: doc.tags.clone(),
            author: config.author.clone(),
        }
    }

    /// `---\n<yaml>---\n`. YAML quoting keeps titles with `:`, `#` or
    /// quotes intact.
    pub fn render(&self) -> Result<String, SyncError> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(format!("---\n{yaml}---\n"))
    }
}

/// Run every normalisation stage over a document body.
///
/// Returns the finished body (ending in exactly one newline, or empty when
/// nothing is left) and the image mirroring summary.
pub async fn normalize_body(
    doc: &Document,
    config: &SyncConfig,
    fetcher: &dyn AssetFetcher,
) -> (String, AssetSummary) {
    // ── Step 1: Protect verbatim regions ─────────────────────────────────
    let (stripped, mut regions) = protect::extract(&doc.body);
    debug!(
        "'{}': protected {} code and {} disclosure regions",
        doc.slug,
        regions.code.len(),
        regions.disclosure.len()
    );

    // ── Step 2: Structural rules ─────────────────────────────────────────
    let text = reformat::reformat(&stripped, config.paragraph_break);

    // ── Step 3: Mirror remote images (never inside code) ─────────────────
    // Resolve in document order, then rewrite each region from the cache.
    let mut localizer = AssetLocalizer::new(config, fetcher, &doc.slug);
    localizer
        .resolve(&protect::expand_disclosure(&text, &regions))
        .await;
    let text = localizer.rewrite(&text);
    for block in regions.disclosure.iter_mut() {
        *block = localizer.rewrite(block);
    }

    // ── Step 4: Top-level captions ───────────────────────────────────────
    let text = inline::normalize_captions(&text);

    // ── Step 5: Disclosure blocks ────────────────────────────────────────
    disclosure::finish_all(&mut regions);

    // ── Step 6: Restore ──────────────────────────────────────────────────
    let body = protect::restore(&text, &regions);
    if protect::has_placeholders(&body) {
        warn!("'{}': unresolved placeholder left in body", doc.slug);
    }

    (finish_text(&body), localizer.into_summary())
}

fn finish_text(body: &str) -> String {
    let trimmed = body.trim_start_matches('\n').trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Front matter followed by the body.
pub fn render_post(doc: &Document, config: &SyncConfig, body: &str) -> Result<String, SyncError> {
    let front = FrontMatter::new(doc, config).render()?;
    Ok(format!("{front}\n{body}"))
}

/// `<posts_root>/<lower-cased categories>/<date>-<slug>.md`.
pub fn post_path(doc: &Document, config: &SyncConfig) -> PathBuf {
    let mut path = config.posts_root.clone();
    for segment in doc.categories.iter().filter_map(|c| path_segment(&c.to_lowercase())) {
        path.push(segment);
    }
    let slug = path_segment(&doc.slug).unwrap_or_else(|| "untitled".to_string());
    path.push(format!("{}-{}.md", doc.date.format("%Y-%m-%d"), slug));
    path
}

/// A single path component, or `None` for components that would escape or
/// vanish (`.`, `..`, empty).
fn path_segment(raw: &str) -> Option<String> {
    let s = raw.trim().replace(['/', '\\'], "-");
    match s.as_str() {
        "" | "." | ".." => None,
        _ => Some(s),
    }
}

/// Writes posts for one run.
///
/// Remembers every path written so far so two documents of the same run
/// never silently overwrite each other (see [`DuplicatePolicy`]).
pub struct PostSyncer<'a> {
    config: &'a SyncConfig,
    fetcher: &'a dyn AssetFetcher,
    claimed: HashSet<PathBuf>,
}

impl<'a> PostSyncer<'a> {
    pub fn new(config: &'a SyncConfig, fetcher: &'a dyn AssetFetcher) -> Self {
        Self {
            config,
            fetcher,
            claimed: HashSet::new(),
        }
    }

    /// Normalise `doc` and write its post file.
    ///
    /// # Returns
    /// `Ok(Written)` or `Ok(Skipped)` for blank documents.
    ///
    /// # Errors
    /// Only output failures: directory creation, file write, a duplicate
    /// path under [`DuplicatePolicy::Error`], front matter serialisation.
    pub async fn sync_document(&mut self, doc: &Document) -> Result<DocumentOutcome, SyncError> {
        if doc.body.trim().is_empty() {
            warn!("Skipped empty post: {}", doc.title);
            return Ok(DocumentOutcome::Skipped {
                reason: SkipReason::EmptySource,
            });
        }

        let (body, assets) = normalize_body(doc, self.config, self.fetcher).await;
        if body.trim().is_empty() {
            warn!("Skipped post left empty after normalisation: {}", doc.title);
            return Ok(DocumentOutcome::Skipped {
                reason: SkipReason::EmptyAfterNormalisation,
            });
        }

        let content = render_post(doc, self.config, &body)?;
        let path = self.claim(post_path(doc, self.config))?;
        write_post(&path, &content).await?;

        info!("Synced: {}", path.display());
        Ok(DocumentOutcome::Written { path, assets })
    }

    fn claim(&mut self, path: PathBuf) -> Result<PathBuf, SyncError> {
        if self.claimed.insert(path.clone()) {
            return Ok(path);
        }
        match self.config.duplicate_policy {
            DuplicatePolicy::Overwrite => {
                warn!("Overwriting post written earlier in this run: {}", path.display());
                Ok(path)
            }
            DuplicatePolicy::Error => Err(SyncError::DuplicateOutput { path }),
            DuplicatePolicy::Suffix => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| SyncError::Internal(format!("no file name in {path:?}")))?;
                let alternative = (1..)
                    .map(|n| path.with_file_name(suffixed_name(&name, n)))
                    .find(|p| !self.claimed.contains(p))
                    .ok_or_else(|| SyncError::Internal("suffix space exhausted".into()))?;
                warn!(
                    "Duplicate post path {}, writing {} instead",
                    path.display(),
                    alternative.display()
                );
                self.claimed.insert(alternative.clone());
                Ok(alternative)
            }
        }
    }
}

/// Convenience wrapper for a single document outside a run.
pub async fn sync_document(
    doc: &Document,
    config: &SyncConfig,
    fetcher: &dyn AssetFetcher,
) -> Result<DocumentOutcome, SyncError> {
    PostSyncer::new(config, fetcher).sync_document(doc).await
}

/// Write `content` to `path`, creating parent directories.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_post(path: &Path, content: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SyncError::OutputDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, content)
        .await
        .map_err(|e| SyncError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| SyncError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetError;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct NoNetwork;

    #[async_trait]
    impl AssetFetcher for NoNetwork {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
            Err(AssetError::DownloadFailed {
                url: url.to_string(),
                reason: "offline".into(),
            })
        }
    }

    fn doc(body: &str) -> Document {
        Document {
            id: "p1".into(),
            title: "Hello: \"World\"".into(),
            slug: "hello-world".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            categories: vec!["JAVA".into(), "Basics".into()],
            tags: vec!["rust".into(), "#notes".into()],
            body: body.into(),
        }
    }

    #[test]
    fn front_matter_round_trips() {
        let config = SyncConfig::default();
        let rendered = FrontMatter::new(&doc(""), &config).render().unwrap();
        assert!(rendered.starts_with("---\n"));
        assert!(rendered.ends_with("---\n"));

        let yaml = rendered.trim_start_matches("---\n").trim_end_matches("---\n");
        let parsed: FrontMatter = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed, FrontMatter::new(&doc(""), &config));
        assert_eq!(parsed.categories, vec!["JAVA/Basics"]);
        assert_eq!(parsed.date, "2024-01-01");
    }

    #[test]
    fn post_path_lowercases_categories() {
        let config = SyncConfig::default();
        assert_eq!(
            post_path(&doc(""), &config),
            PathBuf::from("_posts/java/basics/2024-01-01-hello-world.md")
        );
    }

    #[test]
    fn path_segments_cannot_escape_root() {
        let config = SyncConfig::default();
        let mut d = doc("");
        d.categories = vec!["..".into(), "a/b".into()];
        d.slug = "x/y".into();
        assert_eq!(
            post_path(&d, &config),
            PathBuf::from("_posts/a-b/2024-01-01-x-y.md")
        );
    }

    #[tokio::test]
    async fn normalize_body_keeps_code_and_reformats_text() {
        let config = SyncConfig::default();
        let body = ">quote\nline one\nline two\n```js\nconst a = 1;\n\n\n\nconst b = 2;\n```\n";
        let (out, assets) = normalize_body(&doc(body), &config, &NoNetwork).await;
        assert_eq!(
            out,
            "> quote\n\nline one  \nline two\n\n```js\nconst a = 1;\n\n\n\nconst b = 2;\n```\n"
        );
        assert!(assets.failures.is_empty());
    }

    #[tokio::test]
    async fn failed_image_keeps_remote_url() {
        let config = SyncConfig::default();
        let url = "https://prod-files-secure.s3.us-west-2.amazonaws.com/a/b/pic.png?sig=1";
        let (out, assets) = normalize_body(&doc(&format!("![p]({url})")), &config, &NoNetwork).await;
        assert_eq!(out, format!("![p]({url})\n"));
        assert_eq!(assets.failures.len(), 1);
    }

    #[tokio::test]
    async fn blank_body_is_skipped() {
        let config = SyncConfig::default();
        let outcome = sync_document(&doc(" \n\n "), &config, &NoNetwork).await.unwrap();
        assert!(matches!(
            outcome,
            DocumentOutcome::Skipped {
                reason: SkipReason::EmptySource
            }
        ));
    }

    #[test]
    fn finish_text_trims_outer_blank_lines() {
        assert_eq!(finish_text("\n\nbody\n\n\n"), "body\n");
        assert_eq!(finish_text("\n \n"), "");
    }
}
