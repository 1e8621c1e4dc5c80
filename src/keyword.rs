//! Keyword sanitization.
//!
//! A search term is reduced to ASCII letters, digits and spaces. The same term doubles as the
//! file name prefix for every image saved for it, so it has to be filesystem safe as well.

use serde::Serialize;

/// Strips every character that is not an ASCII alphanumeric or a space.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect()
}

/// A keyword as supplied by the caller together with its sanitized search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyword {
    pub raw: String,
    pub term: String,
}

impl Keyword {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let term = sanitize(&raw);
        Self { raw, term }
    }
}

impl From<&str> for Keyword {
    fn from(raw: &str) -> Self {
        Keyword::new(raw)
    }
}

impl From<String> for Keyword {
    fn from(raw: String) -> Self {
        Keyword::new(raw)
    }
}
