//! CLI binary for pdf2audio.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2audio::{
    convert, inspect, ConversionConfig, ConversionProgressCallback, EspeakBackend,
    NarratorGender, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a page counter during extraction, then a
/// spinner while the speech engine runs.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the page currently being extracted.
    page_started: Mutex<Option<Instant>>,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    /// The bar length is set by `on_conversion_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            skipped: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    /// Remove the bar without printing a summary.
    fn clear(&self) {
        self.bar.finish_and_clear();
    }

    fn page_elapsed(&self) -> String {
        let elapsed_ms = self
            .page_started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        dim(&format!("{:.2}s", elapsed_ms as f64 / 1000.0))
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page: usize, _total: usize) {
        *self.page_started.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(format!("page {page}"));
    }

    fn on_page_complete(&self, page: usize, _total: usize, chars: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}  {:<8}  {}",
            green("✓"),
            page,
            dim(&format!("{chars:>5} chars")),
            self.page_elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_page_skipped(&self, page: usize, _total: usize, reason: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);

        // Keep one line per page.
        let msg: String = if reason.chars().count() > 80 {
            reason.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            reason.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}  {}  {}",
            yellow("–"),
            page,
            yellow(&msg),
            self.page_elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_synthesis_start(&self, chars: usize) {
        self.bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        self.bar.set_prefix("Narrating");
        self.bar.set_message(format!("{chars} chars"));
    }

    fn on_conversion_complete(&self, total_pages: usize, narrated_pages: usize) {
        self.bar.finish_and_clear();
        let skipped = self.skipped.load(Ordering::SeqCst);

        if skipped == 0 {
            eprintln!(
                "{} {} pages narrated",
                green("✔"),
                bold(&narrated_pages.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages narrated  ({} skipped)",
                cyan("⚠"),
                bold(&narrated_pages.to_string()),
                total_pages,
                yellow(&skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Pages 10 to 20 of Dune, male narrator
  pdf2audio dune.pdf --title Dune --author "Frank Herbert" \
      --gender male --first-page 10 --last-page 20
  # → outputs/Dune_pgs_10_20_male.mp3

  # Write somewhere else, slower speech
  pdf2audio book.pdf --title "Emma" --author "Jane Austen" -o ~/audio --rate 150

  # Find the page count and metadata before choosing a range
  pdf2audio --inspect-only book.pdf

  # Structured result for scripting
  pdf2audio --json book.pdf --title T --author A > result.json

PAGES:
  Page numbers are zero-based indices into the PDF (the first page is 0) and
  the range is inclusive. Pages past the end of the document are skipped.

HEADERS AND FOOTERS:
  Text matching "<title> <number>" and "<number> <author>" is removed from
  every page (case-insensitive), so --title and --author should match how
  they are printed in the book's running header and footer.

ENVIRONMENT VARIABLES:
  PDF2AUDIO_OUTPUT_DIR    Output directory (default: outputs)
  PDF2AUDIO_VOICES        Comma-separated voice table, male first
  PDF2AUDIO_ESPEAK        espeak-ng executable
  PDF2AUDIO_ENCODER       ffmpeg executable
  PDFIUM_LIB_PATH         Path to the libpdfium shared library
  RUST_LOG                Log filter (overrides -v / -q)

SETUP:
  Requires espeak-ng and ffmpeg on PATH, and the pdfium shared library in
  PDFIUM_LIB_PATH, the working directory, or the system library path.
"#;

/// Narrate a page range of a PDF book to MP3.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2audio",
    version,
    about = "Narrate a page range of a PDF book to MP3",
    long_about = "Extract the text of a page range from a PDF book, strip the running \
headers and footers built from its title and author, and narrate the result to an MP3 \
file with a male or female voice.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to narrate.
    input: PathBuf,

    /// Book title, as printed in the running header.
    #[arg(long, env = "PDF2AUDIO_TITLE", required_unless_present = "inspect_only")]
    title: Option<String>,

    /// Author, as printed in the running footer.
    #[arg(long, env = "PDF2AUDIO_AUTHOR", required_unless_present = "inspect_only")]
    author: Option<String>,

    /// Narrator voice.
    #[arg(long, env = "PDF2AUDIO_GENDER", value_enum, default_value = "female")]
    gender: GenderArg,

    /// First page to narrate (zero-based, inclusive).
    #[arg(long, env = "PDF2AUDIO_FIRST_PAGE", default_value_t = 0,
          value_parser = clap::value_parser!(u16).range(0..=999))]
    first_page: u16,

    /// Last page to narrate (zero-based, inclusive).
    #[arg(long, env = "PDF2AUDIO_LAST_PAGE", default_value_t = 0,
          value_parser = clap::value_parser!(u16).range(0..=999))]
    last_page: u16,

    /// Directory to write the MP3 into.
    #[arg(short, long, env = "PDF2AUDIO_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2AUDIO_PASSWORD")]
    password: Option<String>,

    /// Voice table, male voice first then female (espeak-ng names).
    #[arg(long, env = "PDF2AUDIO_VOICES", value_delimiter = ',')]
    voices: Vec<String>,

    /// Speaking rate in words per minute (80–450).
    #[arg(long, env = "PDF2AUDIO_RATE", default_value_t = 175,
          value_parser = clap::value_parser!(u32).range(80..=450))]
    rate: u32,

    /// espeak-ng executable.
    #[arg(long, env = "PDF2AUDIO_ESPEAK", default_value = "espeak-ng")]
    espeak: PathBuf,

    /// MP3 encoder executable (ffmpeg).
    #[arg(long, env = "PDF2AUDIO_ENCODER", default_value = "ffmpeg")]
    encoder: PathBuf,

    /// Give up on speech synthesis after this many seconds.
    #[arg(long, env = "PDF2AUDIO_SYNTHESIS_TIMEOUT", default_value_t = 900,
          value_parser = clap::value_parser!(u64).range(1..))]
    synthesis_timeout: u64,

    /// Print the structured result (ConversionOutput) as JSON.
    #[arg(long, env = "PDF2AUDIO_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2AUDIO_NO_PROGRESS")]
    no_progress: bool,

    /// Print page count and metadata only, no narration.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2AUDIO_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2AUDIO_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum GenderArg {
    Male,
    Female,
}

impl From<GenderArg> for NarratorGender {
    fn from(v: GenderArg) -> Self {
        match v {
            GenderArg::Male => NarratorGender::Male,
            GenderArg::Female => NarratorGender::Female,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose asks for them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:    {}", cli.input.display());
            if let Some(ref t) = info.title {
                println!("Title:   {}", t);
            }
            if let Some(ref a) = info.author {
                println!("Author:  {}", a);
            }
            println!(
                "Pages:   {} (indices 0–{})",
                info.page_count,
                info.page_count.saturating_sub(1)
            );
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let cli_progress = show_progress.then(CliProgressCallback::new_dynamic);
    let progress_cb: Option<ProgressCallback> = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);
    let config = clear_on_error(cli_progress.as_deref(), build_config(&cli, progress_cb))?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = clear_on_error(
        cli_progress.as_deref(),
        convert(&cli.input, &config).await.context("Conversion failed"),
    )?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", output.output_path.display());

    if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {}/{} pages  {} chars  {}ms  →  {}",
            if stats.skipped_pages + stats.cleaned_away_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.narrated_pages,
            stats.requested_pages,
            stats.characters,
            stats.total_duration_ms,
            bold(&output.output_path.display().to_string()),
        );
        if stats.skipped_pages > 0 && !show_progress {
            eprintln!("   {} pages skipped", red(&stats.skipped_pages.to_string()));
        }
    }

    Ok(())
}

/// A failed run never reaches `on_conversion_complete`, so take the bar
/// down before the error is printed.
fn clear_on_error<T>(progress: Option<&CliProgressCallback>, result: Result<T>) -> Result<T> {
    if result.is_err() {
        if let Some(cb) = progress {
            cb.clear();
        }
    }
    result
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut backend = EspeakBackend::new()
        .program(&cli.espeak)
        .encoder(&cli.encoder)
        .words_per_minute(cli.rate);
    let voices: Vec<&str> = cli
        .voices
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if !voices.is_empty() {
        backend = backend.voice_table(voices);
    }

    let mut builder = ConversionConfig::builder()
        .book_title(cli.title.clone().unwrap_or_default())
        .author(cli.author.clone().unwrap_or_default())
        .narrator_gender(cli.gender.into())
        .pages(cli.first_page as usize, cli.last_page as usize)
        .output_dir(&cli.output_dir)
        .synthesis_timeout_secs(cli.synthesis_timeout)
        .backend(Arc::new(backend));

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
