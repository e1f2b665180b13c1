//! Page text extraction via pdfium.
//!
//! Two traits separate *what* the pipeline needs from a PDF from *how* it is
//! opened:
//!
//! * [`PageSource`]: an opened document: page count plus per-page text.
//! * [`DocumentLoader`]: opens a path and lends the document to a closure.
//!   The document is released when `with_document` returns, on success and
//!   on every error path, so no handle outlives the extraction step.
//!
//! [`PdfiumLoader`] is the production loader. Tests substitute in-memory
//! documents through the same traits.

use crate::error::{PageError, Pdf2AudioError};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// An opened document with a text layer.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Raw text of the page at the 0-based `index`.
    fn page_text(&self, index: usize) -> Result<String, PageError>;

    /// Title from the document information dictionary, if any.
    fn title(&self) -> Option<String> {
        None
    }

    /// Author from the document information dictionary, if any.
    fn author(&self) -> Option<String> {
        None
    }
}

/// Opens documents for the duration of a closure.
pub trait DocumentLoader: Send + Sync {
    /// Open `path`, hand the document to `visit`, then release it.
    ///
    /// Only document-level failures (unreadable file, bad password, corrupt
    /// xref, missing pdfium) are returned; page problems are the visitor's
    /// concern.
    fn with_document(
        &self,
        path: &Path,
        password: Option<&str>,
        visit: &mut dyn FnMut(&dyn PageSource),
    ) -> Result<(), Pdf2AudioError>;
}

/// Read one page, logging why it produced nothing.
///
/// Returns `Err` for an index past the end, a pdfium failure, or a page
/// whose text layer is blank. None of these are fatal to the caller.
pub fn read_page(document: &dyn PageSource, index: usize) -> Result<String, PageError> {
    let total = document.page_count();
    if index >= total {
        warn!("Page {} out of range (document has {} pages)", index, total);
        return Err(PageError::OutOfRange { page: index, total });
    }

    let text = document.page_text(index).inspect_err(|e| {
        warn!("{}", e);
    })?;

    if text.trim().is_empty() {
        info!("No text found on page {}", index);
        return Err(PageError::NoText { page: index });
    }

    debug!("Extracted {} chars from page {}", text.len(), index);
    Ok(text)
}

// ── pdfium ──────────────────────────────────────────────────────────────────

/// [`DocumentLoader`] backed by the pdfium library.
///
/// pdfium is bound on every call, so each conversion gets its own library
/// handle and document; nothing is cached between requests.
#[derive(Debug, Clone, Default)]
pub struct PdfiumLoader {
    /// Explicit path to libpdfium. Falls back to `PDFIUM_LIB_PATH`, the
    /// working directory, then the system library path.
    pub library_path: Option<PathBuf>,
}

impl PdfiumLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, Pdf2AudioError> {
        let explicit = self
            .library_path
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => Pdfium::bind_to_library(&path),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| Pdf2AudioError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl DocumentLoader for PdfiumLoader {
    fn with_document(
        &self,
        path: &Path,
        password: Option<&str>,
        visit: &mut dyn FnMut(&dyn PageSource),
    ) -> Result<(), Pdf2AudioError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| classify_load_error(path, password, e))?;

        let source = PdfiumPages { document };
        info!("PDF loaded: {} pages", source.page_count());
        visit(&source);
        Ok(())
    }
}

/// Map a pdfium load error onto the fatal error taxonomy.
fn classify_load_error(path: &Path, password: Option<&str>, e: PdfiumError) -> Pdf2AudioError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            Pdf2AudioError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            Pdf2AudioError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        Pdf2AudioError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

struct PdfiumPages<'a> {
    document: PdfDocument<'a>,
}

impl PdfiumPages<'_> {
    fn metadata_value(&self, tag: PdfDocumentMetadataTagType) -> Option<String> {
        self.document.metadata().get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    }
}

impl PageSource for PdfiumPages<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String, PageError> {
        // Callers bounds-check against page_count, which pdfium caps at u16.
        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|e| PageError::ExtractionFailed {
                page: index,
                detail: format!("{:?}", e),
            })?;

        let text = page.text().map_err(|e| PageError::ExtractionFailed {
            page: index,
            detail: format!("{:?}", e),
        })?;

        Ok(text.all())
    }

    fn title(&self) -> Option<String> {
        self.metadata_value(PdfDocumentMetadataTagType::Title)
    }

    fn author(&self) -> Option<String> {
        self.metadata_value(PdfDocumentMetadataTagType::Author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPages(Vec<Result<&'static str, &'static str>>);

    impl PageSource for FixedPages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn page_text(&self, index: usize) -> Result<String, PageError> {
            match self.0[index] {
                Ok(text) => Ok(text.to_string()),
                Err(detail) => Err(PageError::ExtractionFailed {
                    page: index,
                    detail: detail.to_string(),
                }),
            }
        }
    }

    #[test]
    fn reads_text_in_range() {
        let doc = FixedPages(vec![Ok("first"), Ok("second")]);
        assert_eq!(read_page(&doc, 1).unwrap(), "second");
    }

    #[test]
    fn out_of_range_is_reported_not_panicked() {
        let doc = FixedPages(vec![Ok("only")]);
        assert_eq!(
            read_page(&doc, 5).unwrap_err(),
            PageError::OutOfRange { page: 5, total: 1 }
        );
    }

    #[test]
    fn extraction_failure_passes_through() {
        let doc = FixedPages(vec![Err("corrupt content stream")]);
        let err = read_page(&doc, 0).unwrap_err();
        assert!(matches!(err, PageError::ExtractionFailed { page: 0, .. }));
    }

    #[test]
    fn blank_page_is_no_text() {
        let doc = FixedPages(vec![Ok("  \n\t ")]);
        assert_eq!(read_page(&doc, 0).unwrap_err(), PageError::NoText { page: 0 });
    }

    #[test]
    fn default_metadata_is_absent() {
        let doc = FixedPages(vec![]);
        assert!(doc.title().is_none());
        assert!(doc.author().is_none());
    }

    #[test]
    fn load_errors_mentioning_passwords_are_classified() {
        let path = Path::new("book.pdf");
        let err = classify_load_error(
            path,
            None,
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError),
        );
        assert!(matches!(err, Pdf2AudioError::PasswordRequired { .. }));

        let err = classify_load_error(
            path,
            Some("guess"),
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError),
        );
        assert!(matches!(err, Pdf2AudioError::WrongPassword { .. }));

        let err = classify_load_error(
            path,
            None,
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FormatError),
        );
        assert!(matches!(err, Pdf2AudioError::CorruptPdf { .. }));
    }
}
