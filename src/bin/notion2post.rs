//! CLI binary for notion-post-sync.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SyncConfig`, runs every collection and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use notion_post_sync::{
    sync_collections, DocumentOutcome, DuplicatePolicy, HttpFetcher, JsonDirSource,
    ParagraphBreak, ProgressCallback, SyncConfig, SyncProgressCallback, SyncReport,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner with one log line per document.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Syncing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl SyncProgressCallback for CliProgressCallback {
    fn on_collection_start(&self, collection: &str, documents: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Collection {collection}: {documents} posts"))
        ));
        self.bar.set_message(collection.to_string());
    }

    fn on_collection_error(&self, collection: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("{} Collection {collection}: {}", red("✗"), red(error)));
    }

    fn on_document_written(&self, _title: &str, path: &Path) {
        self.bar
            .println(format!("  {} {}", green("✓"), dim(&path.display().to_string())));
    }

    fn on_document_skipped(&self, title: &str) {
        self.bar
            .println(format!("  {} {}  {}", cyan("⚠"), title, dim("(empty, skipped)")));
    }

    fn on_document_error(&self, title: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(80) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar
            .println(format!("  {} {}  {}", red("✗"), title, red(&msg)));
    }

    fn on_sync_complete(&self, written: usize, skipped: usize, failed: usize) {
        self.bar.finish_and_clear();
        let mark = if self.errors.load(Ordering::SeqCst) == 0 {
            green("✔")
        } else {
            red("✘")
        };
        eprintln!(
            "{mark} {} posts synced  ({} skipped, {} failed)",
            bold(&written.to_string()),
            skipped,
            failed
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Sync two exported collections into the current Jekyll site
  notion2post --source-dir exports --collections blog,notes

  # Collections from the environment, loose paragraph spacing
  NOTION_DATABASE_IDS=blog,notes notion2post --paragraph-break blank-line

  # Machine-readable report
  notion2post --collections blog --json > report.json

EXPORT FORMAT:
  <source-dir>/<collection>.json holds a JSON array of records:
    { "id": "...", "title": "...", "slug": "...", "date": "2024-01-01",
      "created_time": "...", "categories": ["JAVA", "Basics"],
      "tags": ["rust"], "published": true, "body": "<markdown>" }

ENVIRONMENT VARIABLES:
  NOTION_DATABASE_IDS   Comma-separated collection ids
  NOTION2POST_AUTHOR    Front-matter author
  RUST_LOG              Log filter override (e.g. notion_post_sync=debug)
"#;

/// Turn exported Notion pages into Jekyll posts.
#[derive(Parser, Debug)]
#[command(
    name = "notion2post",
    version,
    about = "Turn exported Notion pages into Jekyll posts with local images",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Collection ids to sync, in order.
    #[arg(long, env = "NOTION_DATABASE_IDS", value_delimiter = ',', required = true)]
    collections: Vec<String>,

    /// Directory holding one `<collection>.json` export per collection.
    #[arg(long, env = "NOTION2POST_SOURCE_DIR", default_value = "exports")]
    source_dir: PathBuf,

    /// Root directory for post files.
    #[arg(long, env = "NOTION2POST_POSTS_ROOT", default_value = "_posts")]
    posts_root: PathBuf,

    /// Root directory for mirrored images.
    #[arg(long, env = "NOTION2POST_ASSETS_ROOT", default_value = "assets/images")]
    assets_root: PathBuf,

    /// URL prefix under which the site serves the assets root.
    #[arg(long, env = "NOTION2POST_ASSETS_URL", default_value = "/assets/images")]
    assets_url: String,

    /// Front-matter author.
    #[arg(long, env = "NOTION2POST_AUTHOR", default_value = "frombunny")]
    author: String,

    /// Extra upload host whose images are mirrored (repeatable).
    #[arg(long = "upload-host")]
    upload_hosts: Vec<String>,

    /// Separator between consecutive paragraph lines.
    #[arg(long, value_enum, default_value = "hard-break")]
    paragraph_break: ParagraphBreakArg,

    /// What to do when two posts of one run map to the same file.
    #[arg(long, value_enum, default_value = "suffix")]
    on_duplicate: DuplicateArg,

    /// Per-image download timeout in seconds.
    #[arg(long, env = "NOTION2POST_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress output.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ParagraphBreakArg {
    HardBreak,
    BlankLine,
}

impl From<ParagraphBreakArg> for ParagraphBreak {
    fn from(v: ParagraphBreakArg) -> Self {
        match v {
            ParagraphBreakArg::HardBreak => ParagraphBreak::HardBreak,
            ParagraphBreakArg::BlankLine => ParagraphBreak::BlankLine,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum DuplicateArg {
    Suffix,
    Error,
    Overwrite,
}

impl From<DuplicateArg> for DuplicatePolicy {
    fn from(v: DuplicateArg) -> Self {
        match v {
            DuplicateArg::Suffix => DuplicatePolicy::Suffix,
            DuplicateArg::Error => DuplicatePolicy::Error,
            DuplicateArg::Overwrite => DuplicatePolicy::Overwrite,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress display already reports every document; library INFO
    // logs would only duplicate it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let fetcher =
        HttpFetcher::new(config.download_timeout_secs).context("Failed to create HTTP client")?;
    let source = JsonDirSource::new(&cli.source_dir);

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn SyncProgressCallback>)
    } else {
        None
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let report = sync_collections(
        &source,
        &cli.collections,
        &config,
        &fetcher,
        progress.as_ref(),
    )
    .await;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        eprintln!(
            "Synced {} posts ({} skipped, {} failed) in {}ms",
            report.written(),
            report.skipped(),
            report.failed(),
            report.total_duration_ms
        );
    }

    if !cli.quiet && !cli.json && report.asset_failures() > 0 {
        print_asset_failures(&report);
    }

    if !report.is_clean() {
        anyhow::bail!(
            "{} documents and {} collections failed",
            report.failed(),
            report.collection_errors.len()
        );
    }
    Ok(())
}

/// List the images that kept their remote URL, one line per image.
fn print_asset_failures(report: &SyncReport) {
    eprintln!(
        "{} {} images kept their remote URL:",
        cyan("⚠"),
        bold(&report.asset_failures().to_string())
    );
    for doc in &report.documents {
        let DocumentOutcome::Written { assets, .. } = &doc.outcome else {
            continue;
        };
        for failure in &assets.failures {
            let target = failure.url().unwrap_or(doc.title.as_str());
            eprintln!("   {}  {}", dim(target), failure);
        }
    }
}

/// Map CLI args to `SyncConfig`.
fn build_config(cli: &Cli) -> Result<SyncConfig> {
    let mut builder = SyncConfig::builder()
        .posts_root(&cli.posts_root)
        .assets_root(&cli.assets_root)
        .assets_url_prefix(&cli.assets_url)
        .author(&cli.author)
        .paragraph_break(cli.paragraph_break.clone().into())
        .duplicate_policy(cli.on_duplicate.clone().into())
        .download_timeout_secs(cli.download_timeout);

    for host in &cli.upload_hosts {
        builder = builder.upload_host(host);
    }

    builder.build().context("Invalid configuration")
}
