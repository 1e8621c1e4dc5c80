//! Extraction of direct image URLs from an image search results page.
//!
//! Result tiles are anchors of class `iusc` whose `m` attribute holds a JSON-like metadata blob.
//! The full-size image lives in its `"murl"` field with escaped slashes. The blob is matched by
//! pattern rather than deserialized because the provider does not guarantee it is valid JSON.

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::sync::LazyLock;

static RESULT_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.iusc").expect("static selector must parse"));

static MURL_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""murl":"(.*?)""#).expect("static pattern must compile"));

/// Extension used when a URL gives nothing usable after its last dot.
pub const FALLBACK_EXTENSION: &str = "jpg";

const MAX_EXTENSION_LEN: usize = 4;

/// An image URL found on a results page together with its position among the accepted entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageCandidate {
    pub index: usize,
    pub url: String,
}

impl ImageCandidate {
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
        }
    }

    /// File extension guessed from the URL; see [`extension_from_url`].
    pub fn extension(&self) -> String {
        extension_from_url(&self.url)
    }

    /// `<term>_<index>.<ext>`
    pub fn file_name(&self, term: &str) -> String {
        format!("{}_{}.{}", term, self.index, self.extension())
    }

    /// File name for the image as served from `final_url`, which may differ from `url` after
    /// redirects. The index still comes from extraction order.
    pub fn file_name_served_from(&self, term: &str, final_url: &str) -> String {
        format!("{}_{}.{}", term, self.index, extension_from_url(final_url))
    }
}

/// Returns the image candidates of `page_body` in document order.
///
/// Anchors without a `"murl"` field are skipped and do not consume an index. A page with no
/// usable entries yields an empty vector.
pub fn extract(page_body: &str) -> Vec<ImageCandidate> {
    let document = Html::parse_document(page_body);
    document
        .select(&RESULT_ANCHOR)
        .filter_map(|anchor| anchor.value().attr("m"))
        .filter_map(murl_from_metadata)
        .enumerate()
        .map(|(index, url)| ImageCandidate { index, url })
        .collect()
}

/// Pulls the `"murl"` value out of one metadata fragment, dropping backslash escapes.
pub fn murl_from_metadata(fragment: &str) -> Option<String> {
    MURL_FIELD
        .captures(fragment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace('\\', ""))
}

/// Text after the last `.` of the URL's trailing `/` segment, cut to four characters.
///
/// The cut keeps `photo.jpg?w=200` from turning into a long query-polluted suffix. The result is
/// not checked against known image formats.
pub fn extension_from_url(url: &str) -> String {
    let segment = url.rsplit('/').next().unwrap_or(url);
    let tail = match segment.rfind('.') {
        Some(pos) => &segment[pos + 1..],
        None => segment,
    };
    let ext: String = tail.chars().take(MAX_EXTENSION_LEN).collect();
    if ext.is_empty() {
        FALLBACK_EXTENSION.to_string()
    } else {
        ext
    }
}
