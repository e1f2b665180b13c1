//! # pdf2audio
//!
//! Narrate a page range of a PDF book as an MP3 file.
//!
//! ## Why this crate?
//!
//! Printed books carry a running header (`"Dune 112"`) and footer
//! (`"113 Frank Herbert"`) on almost every page. Read aloud, they interrupt
//! the prose every few sentences. This crate pulls the text layer of each
//! page, strips those headers and footers using the book's title and author,
//! joins the pages in order, and hands the result to a speech engine with a
//! male or female narrator voice.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      check the path is a readable PDF (%PDF magic)
//!  ├─ 2. Extract    text layer per page via pdfium (spawn_blocking)
//!  ├─ 3. Clean      strip "<title> N" headers and "N <author>" footers
//!  ├─ 4. Aggregate  join pages first..=last, skipping bad pages
//!  └─ 5. Narrate    espeak-ng + ffmpeg → <title>_pgs_<first>_<last>_<gender>.mp3
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2audio::{convert, ConversionConfig, NarratorGender};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .book_title("Dune")
//!         .author("Frank Herbert")
//!         .narrator_gender(NarratorGender::Male)
//!         .pages(10, 20)
//!         .build()?;
//!     let output = convert("dune.pdf", &config).await?;
//!     println!("{}", output.output_path.display());
//!     eprintln!(
//!         "narrated {}/{} pages",
//!         output.stats.narrated_pages, output.stats.requested_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2audio` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2audio = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime Requirements
//!
//! | Component | Used for | Located via |
//! |-----------|----------|-------------|
//! | pdfium    | text extraction | `PDFIUM_LIB_PATH`, working directory, then system library |
//! | espeak-ng | speech          | `PATH` (override with [`EspeakBackend::program`]) |
//! | ffmpeg    | MP3 encoding    | `PATH` (override with [`EspeakBackend::encoder`]) |
//!
//! Both seams are traits ([`DocumentLoader`], [`SpeechBackend`]) and can be
//! replaced through [`ConversionConfigBuilder::loader`] and
//! [`ConversionConfigBuilder::backend`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, NarratorGender, MAX_PAGE};
pub use convert::{convert, convert_sync, inspect, inspect_with, output_file_name, output_path};
pub use error::{PageError, Pdf2AudioError};
pub use output::{ConversionOutput, ConversionStats, DocumentInfo, PageOutcome, PageStatus};
pub use pipeline::aggregate::AggregatedText;
pub use pipeline::clean::{clean_text, HeaderFooterCleaner};
pub use pipeline::espeak::EspeakBackend;
pub use pipeline::extract::{DocumentLoader, PageSource, PdfiumLoader};
pub use pipeline::narrate::{SpeechBackend, Voice};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
