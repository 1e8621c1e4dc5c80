//! Keyword sources.
//!
//! A `KeywordSource` hands the crawler its keyword list. Loading is the only step that may fail
//! a whole batch: a source that cannot be read produces an error report instead of a crawl.
//!
//! `CsvKeywordSource` reads a comma separated file with a header row and takes the `keyword`
//! column. Rows with more fields than the header are skipped, as are rows whose keyword cell is
//! empty. Double-quoted fields may contain commas, line breaks and `""` escapes.

use crate::error::SpiderError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const KEYWORD_COLUMN: &str = "keyword";

/// Supplies the ordered keyword list for a batch.
pub trait KeywordSource: Send + Sync {
    fn load(&self) -> Result<Vec<String>, SpiderError>;

    /// Human readable origin used in logs.
    fn describe(&self) -> String;
}

/// In-memory keyword list.
#[derive(Debug, Clone, Default)]
pub struct StaticKeywordSource {
    keywords: Vec<String>,
}

impl StaticKeywordSource {
    pub fn new<I, K>(keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

impl KeywordSource for StaticKeywordSource {
    fn load(&self) -> Result<Vec<String>, SpiderError> {
        Ok(self.keywords.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory list of {} keywords", self.keywords.len())
    }
}

/// Keyword list stored in a CSV file.
#[derive(Debug, Clone)]
pub struct CsvKeywordSource {
    path: PathBuf,
    reversed: bool,
}

impl CsvKeywordSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            reversed: false,
        }
    }

    /// Hands the keywords out last row first.
    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, content: &str) -> Result<Vec<String>, SpiderError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let header = reader.headers().map_err(|e| self.malformed(e))?.clone();
        if header.is_empty() {
            return Ok(Vec::new());
        }
        let column = header
            .iter()
            .position(|name| name.trim().trim_start_matches('\u{feff}') == KEYWORD_COLUMN)
            .ok_or_else(|| {
                SpiderError::InputUnavailable(format!(
                    "keyword list '{}' has no '{}' column",
                    self.path.display(),
                    KEYWORD_COLUMN
                ))
            })?;

        let mut keywords = Vec::new();
        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping unreadable row of {}: {}", self.path.display(), e);
                    continue;
                }
            };
            let line = record.position().map_or(0, |p| p.line());
            if record.len() > header.len() {
                warn!(
                    "Skipping malformed line {} of {}: expected {} fields, found {}",
                    line,
                    self.path.display(),
                    header.len(),
                    record.len()
                );
                continue;
            }
            match record.get(column).map(str::trim) {
                Some(keyword) if !keyword.is_empty() => keywords.push(keyword.to_string()),
                _ => debug!("Line {} of {} has no keyword", line, self.path.display()),
            }
        }

        if self.reversed {
            keywords.reverse();
        }
        Ok(keywords)
    }

    fn malformed(&self, error: csv::Error) -> SpiderError {
        SpiderError::InputUnavailable(format!(
            "keyword list '{}' is not valid CSV: {}",
            self.path.display(),
            error
        ))
    }
}

impl KeywordSource for CsvKeywordSource {
    fn load(&self) -> Result<Vec<String>, SpiderError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SpiderError::InputUnavailable(format!(
                "keyword list '{}' not found",
                self.path.display()
            )),
            _ => SpiderError::InputUnavailable(format!(
                "cannot read keyword list '{}': {}",
                self.path.display(),
                e
            )),
        })?;
        let keywords = self.parse(&content)?;
        debug!("Loaded {} keywords from {}", keywords.len(), self.path.display());
        Ok(keywords)
    }

    fn describe(&self) -> String {
        format!("'{}'", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_keyword_column() {
        let file = csv_file("id,keyword\n1,Overwatch!\n2,\"Valor@nt, 2\"\n3,\n");
        let keywords = CsvKeywordSource::new(file.path()).load().unwrap();
        assert_eq!(keywords, vec!["Overwatch!", "Valor@nt, 2"]);
    }

    #[test]
    fn skips_rows_with_too_many_fields() {
        let file = csv_file("keyword\ncats\ndogs,extra\n\nbirds\r\n");
        let keywords = CsvKeywordSource::new(file.path()).load().unwrap();
        assert_eq!(keywords, vec!["cats", "birds"]);
    }

    #[test]
    fn reversal_is_opt_in() {
        let file = csv_file("keyword\na\nb\nc\n");
        let source = CsvKeywordSource::new(file.path());
        assert_eq!(source.load().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(source.reversed(true).load().unwrap(), vec!["c", "b", "a"]);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvKeywordSource::new(dir.path().join("keywords.csv"));
        let err = source.load().unwrap_err();
        assert!(matches!(err, SpiderError::InputUnavailable(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn missing_column_is_unavailable() {
        let file = csv_file("term\ncats\n");
        let err = CsvKeywordSource::new(file.path()).load().unwrap_err();
        assert!(matches!(err, SpiderError::InputUnavailable(_)));
    }

    #[test]
    fn empty_file_is_an_empty_list() {
        let file = csv_file("");
        assert!(CsvKeywordSource::new(file.path()).load().unwrap().is_empty());
    }

    #[test]
    fn quoted_fields_unescape_double_quotes() {
        let file = csv_file("id,keyword,note\n1,\"say \"\"hi\"\"\",x\n");
        let keywords = CsvKeywordSource::new(file.path()).load().unwrap();
        assert_eq!(keywords, vec![r#"say "hi""#]);
    }

    #[test]
    fn quoted_keyword_may_span_lines() {
        let file = csv_file("keyword\n\"Valor\nant\"\ncats\n");
        let keywords = CsvKeywordSource::new(file.path()).load().unwrap();
        assert_eq!(keywords, vec!["Valor\nant", "cats"]);
    }
}
