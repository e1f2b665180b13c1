//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the range aggregator walks the page range and the speech
//! backend renders the result.
//!
//! # Example
//!
//! ```rust
//! use pdf2audio::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct SkipCounter {
//!     skipped: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for SkipCounter {
//!     fn on_page_skipped(&self, page: usize, _total_pages: usize, reason: &str) {
//!         self.skipped.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page} skipped: {reason}");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .book_title("Dune")
//!     .author("Frank Herbert")
//!     .progress_callback(Arc::new(SkipCounter { skipped: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each page.
///
/// Extraction runs on a blocking worker thread, so implementations must be
/// `Send + Sync`. All methods have default no-op implementations so callers
/// only override what they care about. Page numbers are 0-indexed.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first page is read.
    ///
    /// # Arguments
    /// * `total_pages`: number of page indices in the configured range
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is extracted.
    fn on_page_start(&self, page: usize, total_pages: usize) {
        let _ = (page, total_pages);
    }

    /// Called when a page contributed text to the narration.
    ///
    /// # Arguments
    /// * `chars`: character count of the cleaned page text
    fn on_page_complete(&self, page: usize, total_pages: usize, chars: usize) {
        let _ = (page, total_pages, chars);
    }

    /// Called when a page contributed nothing.
    ///
    /// # Arguments
    /// * `reason`: human-readable reason (out of range, extraction failure,
    ///   blank page, or only running headers/footers)
    fn on_page_skipped(&self, page: usize, total_pages: usize, reason: &str) {
        let _ = (page, total_pages, reason);
    }

    /// Called once before the speech backend starts rendering.
    fn on_synthesis_start(&self, chars: usize) {
        let _ = chars;
    }

    /// Called once after the audio file is in place.
    ///
    /// # Arguments
    /// * `total_pages`: number of page indices in the configured range
    /// * `narrated_pages`: pages that contributed text
    fn on_conversion_complete(&self, total_pages: usize, narrated_pages: usize) {
        let _ = (total_pages, narrated_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        skips: AtomicUsize,
        synth_chars: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page: usize, _total_pages: usize, _chars: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_skipped(&self, _page: usize, _total_pages: usize, _reason: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_synthesis_start(&self, chars: usize) {
            self.synth_chars.store(chars, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(5);
        cb.on_page_start(0, 5);
        cb.on_page_complete(0, 5, 42);
        cb.on_page_skipped(1, 5, "no text");
        cb.on_synthesis_start(42);
        cb.on_conversion_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_page_start(0, 3);
        tracker.on_page_complete(0, 3, 100);
        tracker.on_page_start(1, 3);
        tracker.on_page_skipped(1, 3, "extraction failed");
        tracker.on_page_start(2, 3);
        tracker.on_page_complete(2, 3, 200);
        tracker.on_synthesis_start(300);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.synth_chars.load(Ordering::SeqCst), 300);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start(10);
        cb.on_page_skipped(3, 10, "blank");
    }
}
