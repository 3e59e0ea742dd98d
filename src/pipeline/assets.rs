//! Asset localisation: mirror transient remote images next to the post.
//!
//! ## Why download at all?
//!
//! The content source serves uploaded images from signed URLs that expire
//! after about an hour. A post that links them directly shows broken images
//! by the next day. Every image whose URL contains one of the configured
//! upload hosts is therefore downloaded to
//! `<assets_root>/<folder>/<filename>` and the markdown is rewritten to
//! `<assets_url_prefix>/<folder>/<filename>`.
//!
//! ## Naming
//!
//! `folder` is the document slug made filesystem-safe; `filename` is the
//! URL's last path segment, percent-decoded and made safe the same way.
//! When the name is already taken on disk (or earlier in this document)
//! `-1`, `-2`, … is appended before the extension, in document order.
//!
//! ## Failure policy
//!
//! A failed download never aborts the document: the reference keeps its
//! remote URL, a warning is logged and the error is kept in the
//! [`AssetSummary`].
//!
//! Downloads are awaited one at a time, so two lookups never race on the
//! same suffix counter.

use crate::config::SyncConfig;
use crate::error::{AssetError, SyncError};
use crate::output::AssetSummary;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

static RE_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"!\[[^\]]*\]\((\S+?)(?:\s+"[^"]*")?\)"#).unwrap());

/// Source of remote image bytes.
///
/// [`HttpFetcher`] is the production implementation; tests plug in stubs.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch the full body behind `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

/// Fetches assets over HTTP(S) with a per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SyncError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let transfer_error = |e: reqwest::Error| {
            if e.is_timeout() {
                AssetError::DownloadTimeout {
                    url: url.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                AssetError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        let response = self.client.get(url).send().await.map_err(transfer_error)?;
        if !response.status().is_success() {
            return Err(AssetError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(transfer_error)?;
        Ok(bytes.to_vec())
    }
}

/// Remote image URLs in `text` that live on one of `hosts`, deduplicated,
/// in order of first appearance.
pub fn find_remote_images(text: &str, hosts: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    RE_IMAGE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .filter(|url| is_upload_url(url, hosts))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn is_upload_url(url: &str, hosts: &[String]) -> bool {
    (url.starts_with("https://") || url.starts_with("http://"))
        && hosts.iter().any(|h| url.contains(h.as_str()))
}

/// Make `raw` safe as a single path segment: characters other than
/// alphanumerics, `_`, `-` (and `.` when `keep_dots`) become `-`, repeated
/// `-` collapse, leading and trailing `-` are trimmed.
fn sanitize(raw: &str, keep_dots: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let keep = c.is_alphanumeric() || c == '_' || c == '-' || (keep_dots && c == '.');
        let c = if keep { c } else { '-' };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('-').to_string()
}

/// Folder name for a document's assets.
pub fn asset_folder(slug: &str) -> String {
    let folder = sanitize(slug, false);
    if folder.is_empty() {
        "untitled".to_string()
    } else {
        folder
    }
}

/// Original file name of a remote asset, made filesystem-safe.
pub fn filename_from_url(url: &str) -> String {
    let last = reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_default();
    let name = sanitize(&percent_decode(&last), true);
    if name.is_empty() || name.chars().all(|c| c == '.') {
        "image".to_string()
    } else {
        name
    }
}

/// Decode `%XX` escapes; the decoded bytes are read as UTF-8 so encoded
/// non-ASCII names come back intact. Malformed escapes stay as written.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]));
            if let (Some(hi), Some(lo)) = hex {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// `name` with `-<n>` inserted before its extension.
pub fn suffixed_name(name: &str, n: usize) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}-{}{}", &name[..dot], n, &name[dot..]),
        _ => format!("{name}-{n}"),
    }
}

/// Mirrors the remote images of one document.
///
/// Holds the per-document URL → local path cache, so identical URLs always
/// resolve to the same file even when they appear in different regions.
pub struct AssetLocalizer<'a> {
    config: &'a SyncConfig,
    fetcher: &'a dyn AssetFetcher,
    folder: String,
    resolved: HashMap<String, Option<String>>,
    reserved: HashSet<String>,
    summary: AssetSummary,
}

impl<'a> AssetLocalizer<'a> {
    pub fn new(config: &'a SyncConfig, fetcher: &'a dyn AssetFetcher, slug: &str) -> Self {
        Self {
            config,
            fetcher,
            folder: asset_folder(slug),
            resolved: HashMap::new(),
            reserved: HashSet::new(),
            summary: AssetSummary::default(),
        }
    }

    /// Directory that receives this document's images.
    pub fn dir(&self) -> PathBuf {
        self.config.assets_root.join(&self.folder)
    }

    /// Mirror every upload-host image of `text`, in order of appearance.
    ///
    /// Collision suffixes follow this order, so pass the whole document
    /// (disclosure blocks expanded) rather than one region at a time.
    pub async fn resolve(&mut self, text: &str) {
        let urls = find_remote_images(text, &self.config.upload_hosts);
        if urls.is_empty() {
            return;
        }
        debug!("Found {} remote images for '{}'", urls.len(), self.folder);

        for url in urls {
            if !self.resolved.contains_key(&url) {
                let local = self.mirror(&url).await;
                self.resolved.insert(url, local);
            }
        }
    }

    /// Point every resolved image of `text` at its local copy. Images that
    /// were never resolved, or failed, keep their remote URL.
    pub fn rewrite(&self, text: &str) -> String {
        let urls = find_remote_images(text, &self.config.upload_hosts);

        // Longest first so a URL that prefixes another is never rewritten
        // inside the longer one.
        let mut replacements: Vec<(&String, &String)> = urls
            .iter()
            .filter_map(|u| self.resolved.get(u)?.as_ref().map(|local| (u, local)))
            .collect();
        replacements.sort_by_key(|(u, _)| std::cmp::Reverse(u.len()));

        let mut out = text.to_string();
        for (url, local) in replacements {
            out = out.replace(url.as_str(), local);
        }
        out
    }

    pub fn into_summary(self) -> AssetSummary {
        self.summary
    }

    async fn mirror(&mut self, url: &str) -> Option<String> {
        let bytes = match self.fetcher.fetch(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Keeping remote image, download failed: {}", e);
                self.summary.failures.push(e);
                return None;
            }
        };

        let dir = self.dir();
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            return self.write_failed(&dir, e);
        }

        let name = self.free_name(&dir, &filename_from_url(url)).await;
        let path = dir.join(&name);
        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            return self.write_failed(&path, e);
        }
        self.reserved.insert(name.clone());
        self.summary.localized += 1;

        info!("Saved image: {}", path.display());
        Some(format!(
            "{}/{}/{}",
            self.config.assets_url_prefix, self.folder, name
        ))
    }

    async fn free_name(&self, dir: &Path, name: &str) -> String {
        let mut candidate = name.to_string();
        let mut n = 1;
        while self.reserved.contains(&candidate)
            || tokio::fs::try_exists(dir.join(&candidate))
                .await
                .unwrap_or(false)
        {
            candidate = suffixed_name(name, n);
            n += 1;
        }
        candidate
    }

    fn write_failed(&mut self, path: &Path, e: std::io::Error) -> Option<String> {
        let err = AssetError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        warn!("Keeping remote image: {}", err);
        self.summary.failures.push(err);
        None
    }
}
