//! Conversion entry points.
//!
//! [`convert`] runs the whole request as one linear sequence:
//!
//! ```text
//! Configured ──▶ Extracting ──▶ Synthesizing ──▶ Done
//!                    │               │
//!                    └──▶ Failed ◀───┘
//! ```
//!
//! Extraction failing on individual pages is not a state change; only an
//! unopenable document, an empty aggregate, or a synthesis failure ends in
//! `Failed`, and none of those leave a file at the output path.

use crate::config::{ConversionConfig, MAX_PAGE};
use crate::error::Pdf2AudioError;
use crate::output::{ConversionOutput, ConversionStats, DocumentInfo};
use crate::pipeline::aggregate::{aggregate, AggregatedText};
use crate::pipeline::clean::HeaderFooterCleaner;
use crate::pipeline::espeak::EspeakBackend;
use crate::pipeline::extract::{DocumentLoader, PdfiumLoader};
use crate::pipeline::input;
use crate::pipeline::narrate::{self, SpeechBackend};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Narrate the configured page range of the PDF at `pdf_path`.
///
/// # Returns
/// `Ok(ConversionOutput)` once the MP3 is in place under
/// `config.output_dir`, even if some pages were skipped
/// (check `output.stats.skipped_pages`).
///
/// # Errors
/// Returns `Err(Pdf2AudioError)` only for fatal errors:
/// - File not found / permission denied / not a PDF / corrupt
/// - No page in the range yielded text after cleaning
/// - Speech backend unavailable, failed, or timed out
pub async fn convert(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2AudioError> {
    let total_start = Instant::now();
    // Configs assembled by hand skip the builder's checks.
    if config.last_page > MAX_PAGE {
        return Err(Pdf2AudioError::InvalidConfig(format!(
            "Last page ({}) must be <= {}",
            config.last_page, MAX_PAGE
        )));
    }
    let pdf_path = input::resolve_input(pdf_path.as_ref())?;
    info!(
        "Starting conversion: {} (pages {}–{}, {} narrator)",
        pdf_path.display(),
        config.first_page,
        config.last_page,
        config.narrator_gender
    );

    let cleaner = HeaderFooterCleaner::new(&config.book_title, &config.author)?;
    let progress = config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback));

    // ── Extracting ───────────────────────────────────────────────────────
    let extract_start = Instant::now();
    let aggregated = extract_text(
        resolve_loader(config),
        pdf_path,
        config.password.clone(),
        config.first_page,
        config.last_page,
        cleaner,
        Arc::clone(&progress),
    )
    .await?;
    let extraction_duration_ms = extract_start.elapsed().as_millis() as u64;

    if aggregated.is_empty() {
        warn!(
            "No valid text found in pages {}–{}",
            config.first_page, config.last_page
        );
        return Err(Pdf2AudioError::EmptyResult {
            first: config.first_page,
            last: config.last_page,
        });
    }
    info!(
        "Extracted {} chars from {}/{} pages in {}ms",
        aggregated.text.len(),
        aggregated.narrated_pages(),
        aggregated.pages.len(),
        extraction_duration_ms
    );

    // ── Synthesizing ─────────────────────────────────────────────────────
    let output_path = output_path(config);
    let backend = resolve_backend(config);
    let characters = aggregated.text.chars().count();
    progress.on_synthesis_start(characters);

    let synth_start = Instant::now();
    narrate::synthesize(
        backend.as_ref(),
        &aggregated.text,
        config.narrator_gender,
        &output_path,
        Duration::from_secs(config.synthesis_timeout_secs),
    )
    .await?;
    let synthesis_duration_ms = synth_start.elapsed().as_millis() as u64;

    // ── Done ─────────────────────────────────────────────────────────────
    let stats = ConversionStats {
        characters,
        extraction_duration_ms,
        synthesis_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        ..ConversionStats::from_pages(&aggregated.pages)
    };

    info!(
        "Conversion complete: {}/{} pages narrated, {}ms total → {}",
        stats.narrated_pages,
        stats.requested_pages,
        stats.total_duration_ms,
        output_path.display()
    );
    progress.on_conversion_complete(stats.requested_pages, stats.narrated_pages);

    Ok(ConversionOutput {
        output_path,
        pages: aggregated.pages,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally, so it must not be called
/// from inside an async context.
pub fn convert_sync(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2AudioError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2AudioError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(pdf_path, config))
}

/// Report page count and metadata without narrating anything.
///
/// Useful for choosing a page range and finding the exact header/footer
/// strings before a conversion.
pub async fn inspect(
    pdf_path: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<DocumentInfo, Pdf2AudioError> {
    inspect_with(Arc::new(PdfiumLoader::new()), pdf_path, password).await
}

/// [`inspect`] with an explicit document loader.
pub async fn inspect_with(
    loader: Arc<dyn DocumentLoader>,
    pdf_path: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<DocumentInfo, Pdf2AudioError> {
    let path = input::resolve_input(pdf_path.as_ref())?;
    let password = password.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        let mut info = None;
        loader.with_document(&path, password.as_deref(), &mut |doc| {
            info = Some(DocumentInfo {
                page_count: doc.page_count(),
                title: doc.title(),
                author: doc.author(),
            });
        })?;
        info.ok_or_else(|| Pdf2AudioError::Internal("document loader never opened the PDF".into()))
    })
    .await
    .map_err(|e| Pdf2AudioError::Internal(format!("Inspect task panicked: {}", e)))?
}

/// Derive the output filename: `<title>_pgs_<first>_<last>_<gender>.mp3`.
///
/// The title is reduced to a filesystem-safe token (see [`sanitize_title`]).
pub fn output_file_name(config: &ConversionConfig) -> String {
    format!(
        "{}_pgs_{}_{}_{}.mp3",
        sanitize_title(&config.book_title),
        config.first_page,
        config.last_page,
        config.narrator_gender
    )
}

/// Full output path: `output_dir` joined with [`output_file_name`].
pub fn output_path(config: &ConversionConfig) -> PathBuf {
    config.output_dir.join(output_file_name(config))
}

/// Byte budget for the title part of a filename. Leaves room for the
/// `_pgs_<first>_<last>_<gender>.mp3` suffix and the staging prefix within
/// the common 255-byte name limit.
const MAX_TITLE_BYTES: usize = 200;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}._-]").unwrap());

/// Reduce a book title to a single safe path component.
///
/// Whitespace runs become `_`, anything other than letters, digits, `.`, `_`
/// and `-` becomes `_`, and leading dots are dropped so the result is never
/// hidden, `.` or `..`. The result is cut to at most 200 bytes on a
/// character boundary. An empty result becomes `untitled`.
pub fn sanitize_title(title: &str) -> String {
    let s = RE_WHITESPACE.replace_all(title.trim(), "_");
    let s = RE_UNSAFE.replace_all(&s, "_");
    let s = truncate_to_bytes(s.trim_start_matches('.'), MAX_TITLE_BYTES);
    if s.is_empty() {
        "untitled".to_string()
    } else {
        s.to_string()
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn resolve_loader(config: &ConversionConfig) -> Arc<dyn DocumentLoader> {
    match config.loader {
        Some(ref loader) => Arc::clone(loader),
        None => Arc::new(PdfiumLoader::new()),
    }
}

fn resolve_backend(config: &ConversionConfig) -> Arc<dyn SpeechBackend> {
    match config.backend {
        Some(ref backend) => Arc::clone(backend),
        None => Arc::new(EspeakBackend::new()),
    }
}

/// Open the document on a blocking thread and aggregate the page range.
///
/// pdfium is synchronous and CPU-bound, so it stays off the async workers.
/// The document handle lives only inside `with_document`.
async fn extract_text(
    loader: Arc<dyn DocumentLoader>,
    path: PathBuf,
    password: Option<String>,
    first: usize,
    last: usize,
    cleaner: HeaderFooterCleaner,
    progress: ProgressCallback,
) -> Result<AggregatedText, Pdf2AudioError> {
    tokio::task::spawn_blocking(move || {
        let mut aggregated = None;
        loader.with_document(&path, password.as_deref(), &mut |doc| {
            debug!("Document has {} pages", doc.page_count());
            aggregated = Some(aggregate(doc, first, last, &cleaner, progress.as_ref()));
        })?;
        aggregated.ok_or_else(|| Pdf2AudioError::Internal("document loader never opened the PDF".into()))
    })
    .await
    .map_err(|e| Pdf2AudioError::Internal(format!("Extraction task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NarratorGender;

    fn config(title: &str, first: usize, last: usize, gender: NarratorGender) -> ConversionConfig {
        ConversionConfig::builder()
            .book_title(title)
            .author("Someone")
            .narrator_gender(gender)
            .pages(first, last)
            .build()
            .unwrap()
    }

    #[test]
    fn file_name_for_plain_title() {
        let c = config("Dune", 10, 20, NarratorGender::Male);
        assert_eq!(output_file_name(&c), "Dune_pgs_10_20_male.mp3");
    }

    #[test]
    fn file_name_uses_gender_label() {
        let c = config("Emma", 0, 3, NarratorGender::Female);
        assert_eq!(output_file_name(&c), "Emma_pgs_0_3_female.mp3");
    }

    #[test]
    fn output_path_joins_output_dir() {
        let c = ConversionConfig {
            output_dir: PathBuf::from("/srv/audio"),
            ..config("Dune", 1, 2, NarratorGender::Male)
        };
        assert_eq!(
            output_path(&c),
            PathBuf::from("/srv/audio/Dune_pgs_1_2_male.mp3")
        );
    }

    #[test]
    fn sanitizes_path_unsafe_titles() {
        assert_eq!(sanitize_title("The Lord of the Rings"), "The_Lord_of_the_Rings");
        assert_eq!(sanitize_title("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_title("What? Why: <Now>"), "What__Why___Now_");
        assert_eq!(sanitize_title("..."), "untitled");
        assert_eq!(sanitize_title("   "), "untitled");
        assert_eq!(sanitize_title("Cien años"), "Cien_años");
        assert_eq!(sanitize_title("C:\\books\\x"), "C__books_x");
    }

    #[test]
    fn long_titles_fit_the_name_limit() {
        let c = config(&"A".repeat(300), 998, 999, NarratorGender::Female);
        let name = output_file_name(&c);
        assert!(name.len() < 255, "{} bytes", name.len());
        assert!(name.ends_with("_pgs_998_999_female.mp3"));
        assert_eq!(sanitize_title(&"A".repeat(300)).len(), 200);

        // 3-byte chars: 200 is not a boundary, so the cut lands on 198.
        let wide = "語".repeat(150);
        let token = sanitize_title(&wide);
        assert_eq!(token.len(), 198);
        assert!(token.chars().all(|c| c == '語'));
        let c = config(&wide, 0, 0, NarratorGender::Male);
        assert!(output_file_name(&c).len() < 255);
    }

    #[test]
    fn short_titles_are_not_truncated() {
        assert_eq!(truncate_to_bytes("Dune", 200), "Dune");
        assert_eq!(truncate_to_bytes("añb", 2), "a");
    }

    #[test]
    fn sanitized_name_is_single_component() {
        let c = config("a/b\\c", 0, 0, NarratorGender::Female);
        let name = output_file_name(&c);
        assert_eq!(Path::new(&name).components().count(), 1);
    }
}
