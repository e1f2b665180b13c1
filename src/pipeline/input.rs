//! Input validation: make sure the caller's path is a readable PDF.
//!
//! The upload layer hands us a resolved path. We check it before binding
//! pdfium so a typo or a stray upload surfaces as a clear error rather than
//! a pdfium parse failure.

use crate::error::Pdf2AudioError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn resolve_input(path: &Path) -> Result<PathBuf, Pdf2AudioError> {
    let path = path.to_path_buf();

    if !path.is_file() {
        return Err(Pdf2AudioError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                return Err(Pdf2AudioError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2AudioError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2AudioError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
