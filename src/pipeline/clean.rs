//! Running header/footer removal.
//!
//! Books typeset for print repeat the title next to the page number in the
//! header (`"Dune 42"`) and the author in the footer (`"43 Frank Herbert"`).
//! Narrating those on every page is noise, so each page is passed through a
//! [`HeaderFooterCleaner`] built once per conversion from the two
//! fingerprints.
//!
//! Fingerprints come from the user and are matched literally: every regex
//! metacharacter is escaped before the pattern is compiled, so a title like
//! `"C++ (2nd ed.)"` matches itself and nothing else.

use crate::error::Pdf2AudioError;
use regex::{Regex, RegexBuilder};

/// Removes `"<title> <digits>"` and `"<digits> <author>"`, case-insensitively.
#[derive(Debug, Clone)]
pub struct HeaderFooterCleaner {
    header: Option<Regex>,
    footer: Option<Regex>,
}

impl HeaderFooterCleaner {
    /// Compile the header and footer patterns.
    ///
    /// A blank fingerprint disables its pattern; otherwise `" <digits>"` or
    /// `"<digits> "` alone would strip ordinary numbers from the text.
    pub fn new(title: &str, author: &str) -> Result<Self, Pdf2AudioError> {
        Ok(Self {
            header: fingerprint_pattern(title, |t| format!(r"{t} \d+"))?,
            footer: fingerprint_pattern(author, |a| format!(r"\d+ {a}"))?,
        })
    }

    /// Strip every header/footer occurrence and trim surrounding whitespace.
    ///
    /// Runs to a fixed point, so removing one occurrence can never leave a
    /// new one behind: `clean(clean(x)) == clean(x)`.
    pub fn clean(&self, text: &str) -> String {
        let mut current = text.trim().to_string();
        loop {
            let next = self.clean_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn clean_once(&self, text: &str) -> String {
        let mut s = text.to_string();
        if let Some(ref re) = self.header {
            s = re.replace_all(&s, "").into_owned();
        }
        if let Some(ref re) = self.footer {
            s = re.replace_all(&s, "").into_owned();
        }
        s.trim().to_string()
    }
}

fn fingerprint_pattern(
    fingerprint: &str,
    shape: impl Fn(&str) -> String,
) -> Result<Option<Regex>, Pdf2AudioError> {
    let fingerprint = fingerprint.trim();
    if fingerprint.is_empty() {
        return Ok(None);
    }
    let pattern = shape(&regex::escape(fingerprint));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|e| {
            Pdf2AudioError::InvalidConfig(format!(
                "Cannot build header/footer pattern for '{fingerprint}': {e}"
            ))
        })
}

/// One-shot form of [`HeaderFooterCleaner::clean`].
pub fn clean_text(text: &str, title: &str, author: &str) -> Result<String, Pdf2AudioError> {
    Ok(HeaderFooterCleaner::new(title, author)?.clean(text))
}

// ── Tests ────────────────────────────────────────────────────────────────────
