//! CLI binary for note2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, converts every note in a JSON file, and writes the
//! results to an output directory.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use note2md::{
    convert_batch, read_notes, write_note, ConversionConfig, ConversionProgressCallback,
    ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

/// Terminal progress callback: a live bar plus one log line per note. Notes
/// complete out of order, so lines carry the note's batch position.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} notes  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_notes: usize) {
        self.bar.set_length(total_notes as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_notes} notes…"))
        ));
    }

    fn on_note_complete(&self, position: usize, title: &str, markdown_len: usize) {
        self.bar.println(format!(
            "  {} #{:<4} {}  {}",
            green("✓"),
            position,
            title,
            dim(&format!("{markdown_len} bytes")),
        ));
        self.bar.inc(1);
    }

    fn on_note_error(&self, position: usize, title: &str, error: &str) {
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} #{:<4} {}  {}",
            red("✗"),
            position,
            title,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total_notes: usize, _success_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert every note in an export to ./notes
  note2md export.json -o notes

  # Obsidian-style tags and a YAML header
  note2md export.json -o vault --tag-template '#{{tag}}' --front-matter

  # Custom header template (minijinja syntax)
  note2md export.json -o out --front-matter --front-matter-template header.j2

INPUT:
  A JSON file holding one note object or an array of them:
  { "title": "...", "content": "<div>...</div>", "tags": ["a"],
    "created": "20180109T173725Z", "updated": "20180109T173725Z",
    "resources": [ { "data": "<base64>", "mime": "image/png", "file_name": "a.png" } ],
    "attributes": { "SourceUrl": "https://..." } }

FRONT MATTER TEMPLATE FIELDS:
  CTime, MTime, Title, TagList,
  Attributes.SourceUrl, Attributes.Latitude, Attributes.Longitude,
  Attributes.Altitude, Attributes.Source
  Helpers: trim, quote
"#;

/// Convert exported notes to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "note2md",
    version,
    about = "Convert exported notes to Markdown files with extracted media",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// JSON file holding one note or an array of notes.
    input: PathBuf,

    /// Output directory.
    #[arg(short, long, env = "NOTE2MD_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Tag template; must contain `{{tag}}` exactly once.
    #[arg(long, env = "NOTE2MD_TAG_TEMPLATE", default_value = "#{{tag}}")]
    tag_template: String,

    /// Prepend a front-matter header.
    #[arg(long, env = "NOTE2MD_FRONT_MATTER")]
    front_matter: bool,

    /// File holding a custom front-matter template.
    #[arg(long, env = "NOTE2MD_FRONT_MATTER_TEMPLATE")]
    front_matter_template: Option<PathBuf>,

    /// Render highlighted text as `==text==`.
    #[arg(long, env = "NOTE2MD_HIGHLIGHTS")]
    highlights: bool,

    /// Keep backslash escapes on Markdown punctuation.
    #[arg(long, env = "NOTE2MD_ESCAPE_SPECIAL_CHARS")]
    escape_special_chars: bool,

    /// Number of notes converted at once.
    #[arg(short, long, env = "NOTE2MD_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "NOTE2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "NOTE2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar covers normal feedback; library INFO logs would only
    // interleave with it. Verbose mode trades the bar for DEBUG logs.
    let show_progress = !cli.quiet && !cli.verbose;
    let filter = if cli.verbose { "debug" } else { "error" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Read notes ───────────────────────────────────────────────────────
    let notes = read_notes(&cli.input).context("Failed to read notes")?;
    tokio::fs::create_dir_all(&cli.output)
        .await
        .with_context(|| format!("Failed to create output directory {:?}", cli.output))?;

    // ── Convert and write ────────────────────────────────────────────────
    let started = Instant::now();
    let total = notes.len();
    let mut written = 0usize;
    let mut failed = 0usize;

    let mut outcomes = convert_batch(notes, &config);
    while let Some(outcome) = outcomes.next().await {
        let doc = match outcome.result {
            Ok(doc) => doc,
            Err(e) if e.is_misconfiguration() => {
                return Err(anyhow::Error::new(e)
                    .context("Conversion stopped: the configuration cannot render any note"));
            }
            Err(e) => {
                failed += 1;
                if !show_progress && !cli.quiet {
                    eprintln!("{} #{} {}: {e}", red("✗"), outcome.position, outcome.title);
                }
                continue;
            }
        };
        let dir = cli.output.clone();
        match tokio::task::block_in_place(|| write_note(&outcome.title, &doc, &dir)) {
            Ok(_) => written += 1,
            Err(e) => {
                failed += 1;
                eprintln!("{} #{} {}: {e}", red("✗"), outcome.position, outcome.title);
            }
        }
    }

    // ── Summary ──────────────────────────────────────────────────────────
    if !cli.quiet {
        eprintln!(
            "{}  {}/{} notes  {}ms  →  {}",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            written,
            total,
            started.elapsed().as_millis(),
            bold(&cli.output.display().to_string()),
        );
        if failed > 0 {
            eprintln!("   {} notes failed", red(&failed.to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .tag_template(cli.tag_template.clone())
        .enable_front_matter(cli.front_matter)
        .enable_highlights(cli.highlights)
        .escape_special_chars(cli.escape_special_chars)
        .concurrency(cli.concurrency);

    if let Some(ref path) = cli.front_matter_template {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read front-matter template from {:?}", path))?;
        builder = builder.front_matter_template(template);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
