//! Range aggregation: walk the configured page range and merge cleaned text.
//!
//! A bad page never aborts the walk. Each page ends up as exactly one
//! [`PageOutcome`] and, when it contributed nothing, exactly one log event:
//! [`read_page`] reports pages with no extracted text, and this module
//! reports pages whose text was entirely running headers/footers.

use crate::output::{PageOutcome, PageStatus};
use crate::pipeline::clean::HeaderFooterCleaner;
use crate::pipeline::extract::{read_page, PageSource};
use crate::progress::ConversionProgressCallback;
use tracing::{debug, info};

/// Text ready for narration plus the per-page record of how it was built.
#[derive(Debug, Clone, Default)]
pub struct AggregatedText {
    /// Cleaned page texts in page order, joined by single spaces.
    /// Empty when no page contributed.
    pub text: String,
    /// One outcome per page index in `first..=last`.
    pub pages: Vec<PageOutcome>,
}

impl AggregatedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn narrated_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_narrated()).count()
    }
}

/// Extract and clean pages `first..=last` (0-based, ascending).
///
/// An inverted range (`first > last`) yields an empty result.
pub fn aggregate(
    document: &dyn PageSource,
    first: usize,
    last: usize,
    cleaner: &HeaderFooterCleaner,
    progress: &dyn ConversionProgressCallback,
) -> AggregatedText {
    let range = first..=last;
    let total = if first > last {
        0
    } else {
        (last - first).saturating_add(1)
    };
    progress.on_conversion_start(total);

    let capacity = total.min(document.page_count().saturating_add(1));
    let mut parts: Vec<String> = Vec::with_capacity(capacity);
    let mut pages: Vec<PageOutcome> = Vec::with_capacity(capacity);

    for page in range {
        progress.on_page_start(page, total);

        let status = match read_page(document, page) {
            Ok(raw) => {
                let cleaned = cleaner.clean(&raw);
                if cleaned.is_empty() {
                    info!("No valid text found on page {} after cleaning", page);
                    progress.on_page_skipped(page, total, "only running headers/footers");
                    PageStatus::CleanedAway
                } else {
                    let chars = cleaned.chars().count();
                    debug!("Page {} contributed {} chars", page, chars);
                    progress.on_page_complete(page, total, chars);
                    parts.push(cleaned);
                    PageStatus::Narrated { chars }
                }
            }
            Err(error) => {
                progress.on_page_skipped(page, total, &error.to_string());
                PageStatus::Skipped { error }
            }
        };

        pages.push(PageOutcome { page, status });
    }

    AggregatedText {
        text: parts.join(" "),
        pages,
    }
}
