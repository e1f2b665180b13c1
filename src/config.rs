//! Configuration types for PDF-to-audio narration.
//!
//! All per-request settings live in one immutable [`ConversionConfig`],
//! built and validated once through its [`ConversionConfigBuilder`]. The
//! orchestrator only ever reads it, so concurrent requests each build their
//! own value and never share mutable state.

use crate::error::Pdf2AudioError;
use crate::pipeline::extract::DocumentLoader;
use crate::pipeline::narrate::SpeechBackend;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// Configuration for one PDF-to-audio conversion.
///
/// Built via [`ConversionConfig::builder()`].
///
/// # Example
/// ```rust
/// use pdf2audio::{ConversionConfig, NarratorGender};
///
/// let config = ConversionConfig::builder()
///     .book_title("Dune")
///     .author("Frank Herbert")
///     .narrator_gender(NarratorGender::Male)
///     .pages(10, 20)
///     .build()
///     .unwrap();
/// assert_eq!(config.first_page, 10);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Book title exactly as it appears in the running header.
    ///
    /// `"<title> <page number>"` is stripped from every page, and the title
    /// also names the output file.
    pub book_title: String,

    /// Author name exactly as it appears in the running footer.
    ///
    /// `"<page number> <author>"` is stripped from every page.
    pub author: String,

    /// Narrator voice. Default: [`NarratorGender::Female`].
    pub narrator_gender: NarratorGender,

    /// First page to narrate, 0-indexed, inclusive. Default: 0.
    pub first_page: usize,

    /// Last page to narrate, 0-indexed, inclusive. Default: 0.
    ///
    /// Checked against the document length only when the PDF is opened;
    /// pages past the end are skipped, not fatal.
    pub last_page: usize,

    /// Directory the MP3 is written to. Created if missing. Default: `outputs`.
    pub output_dir: PathBuf,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Upper bound on speech rendering time in seconds. Default: 900.
    ///
    /// Rendering time grows with the amount of text, so a large page range
    /// can otherwise tie up the caller indefinitely.
    pub synthesis_timeout_secs: u64,

    /// Document loader. If None, pdfium is used.
    pub loader: Option<Arc<dyn DocumentLoader>>,

    /// Speech backend. If None, espeak-ng + ffmpeg with default settings.
    pub backend: Option<Arc<dyn SpeechBackend>>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

/// Highest page index a request may name.
pub const MAX_PAGE: usize = 999;

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            book_title: String::new(),
            author: String::new(),
            narrator_gender: NarratorGender::default(),
            first_page: 0,
            last_page: 0,
            output_dir: PathBuf::from("outputs"),
            password: None,
            synthesis_timeout_secs: 900,
            loader: None,
            backend: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("book_title", &self.book_title)
            .field("author", &self.author)
            .field("narrator_gender", &self.narrator_gender)
            .field("first_page", &self.first_page)
            .field("last_page", &self.last_page)
            .field("output_dir", &self.output_dir)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("synthesis_timeout_secs", &self.synthesis_timeout_secs)
            .field("loader", &self.loader.as_ref().map(|_| "<dyn DocumentLoader>"))
            .field("backend", &self.backend.as_ref().map(|_| "<dyn SpeechBackend>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Number of page indices in the configured range (0 when inverted).
    pub fn page_count(&self) -> usize {
        if self.first_page > self.last_page {
            0
        } else {
            self.last_page - self.first_page + 1
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn book_title(mut self, title: impl Into<String>) -> Self {
        self.config.book_title = title.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.author = author.into();
        self
    }

    pub fn narrator_gender(mut self, gender: NarratorGender) -> Self {
        self.config.narrator_gender = gender;
        self
    }

    /// Set the inclusive, 0-indexed page range.
    pub fn pages(mut self, first: usize, last: usize) -> Self {
        self.config.first_page = first;
        self.config.last_page = last;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn synthesis_timeout_secs(mut self, secs: u64) -> Self {
        self.config.synthesis_timeout_secs = secs;
        self
    }

    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.config.loader = Some(loader);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn SpeechBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2AudioError> {
        let c = &self.config;
        if c.book_title.trim().is_empty() {
            return Err(Pdf2AudioError::InvalidConfig(
                "Book title must not be empty".into(),
            ));
        }
        if c.author.trim().is_empty() {
            return Err(Pdf2AudioError::InvalidConfig(
                "Author must not be empty".into(),
            ));
        }
        if c.first_page > c.last_page {
            return Err(Pdf2AudioError::InvalidConfig(format!(
                "First page ({}) must be <= last page ({})",
                c.first_page, c.last_page
            )));
        }
        if c.last_page > MAX_PAGE {
            return Err(Pdf2AudioError::InvalidConfig(format!(
                "Last page ({}) must be <= {}",
                c.last_page, MAX_PAGE
            )));
        }
        if c.synthesis_timeout_secs == 0 {
            return Err(Pdf2AudioError::InvalidConfig(
                "Synthesis timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which narrator voice to use.
///
/// Maps onto the speech backend's voice table by position: male is entry 0,
/// female is entry 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarratorGender {
    Male,
    #[default]
    Female,
}

impl NarratorGender {
    /// Lowercase label used in output filenames and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            NarratorGender::Male => "male",
            NarratorGender::Female => "female",
        }
    }

    /// Position of this narrator in the backend's voice table.
    pub fn voice_index(&self) -> usize {
        match self {
            NarratorGender::Male => 0,
            NarratorGender::Female => 1,
        }
    }

    /// Parse a free-form label, falling back to [`NarratorGender::Female`].
    ///
    /// Unknown labels are logged, never rejected.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_else(|_| {
            warn!("Unsupported narrator gender '{}', defaulting to 'female'", label);
            NarratorGender::Female
        })
    }
}

impl fmt::Display for NarratorGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NarratorGender {
    type Err = Pdf2AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(NarratorGender::Male),
            "female" => Ok(NarratorGender::Female),
            other => Err(Pdf2AudioError::InvalidConfig(format!(
                "Narrator gender must be 'male' or 'female', got '{other}'"
            ))),
        }
    }
}
