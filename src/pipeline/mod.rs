//! Pipeline stages for PDF-to-audio narration.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ clean ──▶ aggregate ──▶ narrate
//! (path)    (pdfium)   (headers)  (page range)  (espeak-ng + ffmpeg)
//! ```
//!
//! 1. [`input`]: check the path is a readable PDF
//! 2. [`extract`]: open the document for the duration of extraction and
//!    read one page's text layer
//! 3. [`clean`]: strip `"<title> N"` headers and `"N <author>"` footers
//! 4. [`aggregate`]: walk the inclusive page range, absorbing per-page
//!    failures, and join the cleaned pages
//! 5. [`narrate`]: pick the narrator voice and write the MP3 atomically;
//!    [`espeak`] is the default engine behind it

pub mod aggregate;
pub mod clean;
pub mod espeak;
pub mod extract;
pub mod input;
pub mod narrate;
