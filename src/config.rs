//! Configuration types for the post sync.
//!
//! All sync behaviour is controlled through [`SyncConfig`], built via its
//! [`SyncConfigBuilder`]. Every knob lives in one struct so a run can be
//! logged and two runs compared field by field.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hosts that serve the content source's transient (signed, expiring)
/// uploads. Images on these hosts are mirrored locally.
pub const DEFAULT_UPLOAD_HOSTS: &[&str] = &[
    "prod-files-secure.s3.us-west-2.amazonaws.com",
    "s3.us-west-2.amazonaws.com/secure.notion-static.com",
    "file.notion.so",
];

/// Configuration for a sync run.
///
/// Built via [`SyncConfig::builder()`] or using [`SyncConfig::default()`].
///
/// # Example
/// ```rust
/// use notion_post_sync::SyncConfig;
///
/// let config = SyncConfig::builder()
///     .posts_root("site/_posts")
///     .author("editor")
///     .build()
///     .unwrap();
/// assert_eq!(config.layout, "post");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Root directory for post files. Default: `_posts`.
    ///
    /// Category segments are appended below it, lower-cased.
    pub posts_root: PathBuf,

    /// Root directory for mirrored images. Default: `assets/images`.
    pub assets_root: PathBuf,

    /// URL prefix written into markdown for mirrored images.
    /// Default: `/assets/images`.
    ///
    /// Must point at `assets_root` as the static-site generator serves it.
    pub assets_url_prefix: String,

    /// Value of the `author` front-matter key. Default: `frombunny`.
    pub author: String,

    /// Value of the `layout` front-matter key. Default: `post`.
    pub layout: String,

    /// URL fragments identifying transient upload hosts. An image whose URL
    /// contains any of them is downloaded and rewritten.
    pub upload_hosts: Vec<String>,

    /// Per-image download timeout in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// How consecutive paragraph lines are separated. Default: [`ParagraphBreak::HardBreak`].
    pub paragraph_break: ParagraphBreak,

    /// What to do when two documents of one run map to the same file.
    /// Default: [`DuplicatePolicy::Suffix`].
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            posts_root: PathBuf::from("_posts"),
            assets_root: PathBuf::from("assets/images"),
            assets_url_prefix: "/assets/images".to_string(),
            author: "frombunny".to_string(),
            layout: "post".to_string(),
            upload_hosts: DEFAULT_UPLOAD_HOSTS.iter().map(|h| h.to_string()).collect(),
            download_timeout_secs: 60,
            paragraph_break: ParagraphBreak::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Create a new builder for `SyncConfig`.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SyncConfig`].
#[derive(Debug)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn posts_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.posts_root = root.into();
        self
    }

    pub fn assets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.assets_root = root.into();
        self
    }

    pub fn assets_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.assets_url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.author = author.into();
        self
    }

    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.config.layout = layout.into();
        self
    }

    /// Replace the upload-host list.
    pub fn upload_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.upload_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Add one host to the upload-host list.
    pub fn upload_host(mut self, host: impl Into<String>) -> Self {
        self.config.upload_hosts.push(host.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn paragraph_break(mut self, style: ParagraphBreak) -> Self {
        self.config.paragraph_break = style;
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.duplicate_policy = policy;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SyncConfig, SyncError> {
        let c = &self.config;
        if c.posts_root.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig("posts root must not be empty".into()));
        }
        if c.assets_root.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig("assets root must not be empty".into()));
        }
        if c.download_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "download timeout must be ≥ 1 second".into(),
            ));
        }
        if c.upload_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(SyncError::InvalidConfig(
                "upload hosts must not contain empty entries".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the reformatter separates two consecutive paragraph lines.
///
/// The converter emits one line per source block with single newlines in
/// between, which markdown renderers would merge into one paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParagraphBreak {
    /// Append two trailing spaces (a hard line break). (default)
    #[default]
    HardBreak,
    /// Insert a blank line, turning each line into its own paragraph.
    BlankLine,
}

/// Policy for two documents of one run resolving to the same output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Append `-1`, `-2`, … to the later file's stem. (default)
    #[default]
    Suffix,
    /// Fail the later document with [`SyncError::DuplicateOutput`].
    Error,
    /// Last write wins.
    Overwrite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site_layout() {
        let c = SyncConfig::default();
        assert_eq!(c.posts_root, PathBuf::from("_posts"));
        assert_eq!(c.assets_url_prefix, "/assets/images");
        assert_eq!(c.layout, "post");
        assert_eq!(c.paragraph_break, ParagraphBreak::HardBreak);
        assert_eq!(c.duplicate_policy, DuplicatePolicy::Suffix);
        assert!(!c.upload_hosts.is_empty());
    }

    #[test]
    fn builder_trims_url_prefix() {
        let c = SyncConfig::builder()
            .assets_url_prefix("/static/img/")
            .build()
            .unwrap();
        assert_eq!(c.assets_url_prefix, "/static/img");
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = SyncConfig::builder().download_timeout_secs(0).build();
        assert!(matches!(err, Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_blank_host() {
        let err = SyncConfig::builder().upload_hosts(["cdn.example", " "]).build();
        assert!(matches!(err, Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn upload_host_appends() {
        let c = SyncConfig::builder().upload_host("cdn.example").build().unwrap();
        assert_eq!(c.upload_hosts.last().map(String::as_str), Some("cdn.example"));
    }
}
