//! Result types returned by the conversion entry points.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a successful conversion produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Path of the written MP3. Exists when this value is returned.
    pub output_path: PathBuf,
    /// One entry per page index in the configured range, in page order.
    pub pages: Vec<PageOutcome>,
    pub stats: ConversionStats,
}

/// What happened to a single page of the configured range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOutcome {
    /// 0-based page index.
    pub page: usize,
    pub status: PageStatus,
}

/// Per-page result of extraction + cleaning.
///
/// `Skipped` means no text was extracted; `CleanedAway` means text was
/// extracted but consisted only of running headers/footers and whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageStatus {
    Narrated { chars: usize },
    CleanedAway,
    Skipped { error: PageError },
}

impl PageOutcome {
    pub fn is_narrated(&self) -> bool {
        matches!(self.status, PageStatus::Narrated { .. })
    }
}

/// Counters and timings for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Page indices in the configured range.
    pub requested_pages: usize,
    pub narrated_pages: usize,
    /// Pages with no extracted text (out of range, failure, blank).
    pub skipped_pages: usize,
    pub cleaned_away_pages: usize,
    /// Characters handed to the speech backend.
    pub characters: usize,
    pub extraction_duration_ms: u64,
    pub synthesis_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl ConversionStats {
    /// Tally page counters from the per-page outcomes.
    pub fn from_pages(pages: &[PageOutcome]) -> Self {
        let mut stats = ConversionStats {
            requested_pages: pages.len(),
            ..Default::default()
        };
        for outcome in pages {
            match outcome.status {
                PageStatus::Narrated { .. } => stats.narrated_pages += 1,
                PageStatus::CleanedAway => stats.cleaned_away_pages += 1,
                PageStatus::Skipped { .. } => stats.skipped_pages += 1,
            }
        }
        stats
    }
}

/// Document-level facts reported by [`crate::convert::inspect`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
}
