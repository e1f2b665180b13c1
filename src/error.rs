//! Error types for the pdf2audio library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2AudioError`]: **Fatal**: the request cannot produce an audio
//!   file (missing or unreadable PDF, nothing to narrate, speech backend
//!   unavailable). Returned as `Err(Pdf2AudioError)` from the top-level
//!   `convert*` functions.
//!
//! * [`PageError`]: **Non-fatal**: a single page yielded no text (out of
//!   range, decode failure, blank page) while the rest of the range is fine.
//!   Absorbed by the range aggregator and recorded in
//!   [`crate::output::PageOutcome`] so callers can see which pages were
//!   skipped and why.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2audio library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2AudioError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The whole page range produced nothing worth narrating.
    #[error(
        "No usable text found on pages {first}–{last} after removing running headers and footers.\n\
Check the page range (pages are 0-indexed) and that the PDF has a text layer."
    )]
    EmptyResult { first: usize, last: usize },

    // ── Synthesis errors ──────────────────────────────────────────────────
    /// A speech backend program is missing or refused to start.
    #[error("Speech backend '{backend}' is unavailable: {detail}")]
    BackendUnavailable { backend: String, detail: String },

    /// The backend's voice table has no entry for the requested narrator.
    #[error(
        "Voice table has {available} voice(s) but the {gender} narrator needs entry #{index}.\n\
Provide at least two voices (male first, female second) with --voices."
    )]
    VoiceTableTooSmall {
        gender: String,
        index: usize,
        available: usize,
    },

    /// The backend ran but did not produce audio.
    #[error("Speech synthesis failed: {detail}")]
    SynthesisFailed { detail: String },

    /// Synthesis exceeded the configured time budget and was cancelled.
    #[error("Speech synthesis timed out after {secs}s\nNarrate a shorter page range or raise --synthesis-timeout.")]
    SynthesisTimeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output audio file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
pdf2audio needs the pdfium shared library to read PDF text.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Or place libpdfium next to the working directory / on the system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Page indices are 0-based, the same numbering used by
/// [`crate::config::ConversionConfig::first_page`].
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageError {
    /// The index is past the end of the document.
    #[error("Page {page}: out of range (document has {total} pages)")]
    OutOfRange { page: usize, total: usize },

    /// pdfium could not load the page or its text layer.
    #[error("Page {page}: text extraction failed: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// The page has no text layer content (blank or image-only).
    #[error("Page {page}: no text found")]
    NoText { page: usize },
}

impl PageError {
    /// The 0-based page index this error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::OutOfRange { page, .. }
            | PageError::ExtractionFailed { page, .. }
            | PageError::NoText { page } => *page,
        }
    }
}
