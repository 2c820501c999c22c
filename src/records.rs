//! CSV data sources.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Terminator};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV option '{0}' must be a single ASCII character")]
    NotAscii(&'static str),
}

/// Dialect of the CSV input. The first record is always the header row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CsvOptions {
    pub delimiter: char,
    pub quote: char,
    /// Record terminator; `None` accepts `\n`, `\r` and `\r\n`.
    pub terminator: Option<char>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ';',
            quote: '"',
            terminator: None,
        }
    }
}

impl CsvOptions {
    fn reader_builder(&self) -> Result<ReaderBuilder, RecordError> {
        let delimiter = ascii(self.delimiter, "delimiter")?;
        // A quote equal to the delimiter is unusable; fall back to the defaults.
        let (delimiter, quote) = if self.quote == self.delimiter {
            (b';', b'"')
        } else {
            (delimiter, ascii(self.quote, "quote")?)
        };
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(delimiter)
            .quote(quote)
            .has_headers(true)
            .flexible(true);
        if let Some(term) = self.terminator {
            builder.terminator(Terminator::Any(ascii(term, "terminator")?));
        }
        Ok(builder)
    }
}

fn ascii(c: char, option: &'static str) -> Result<u8, RecordError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(RecordError::NotAscii(option))
    }
}

/// Header plus data rows of a CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Records {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Records {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn from_reader<R: Read>(reader: R, options: &CsvOptions) -> Result<Self, RecordError> {
        let mut reader = options.reader_builder()?.from_reader(reader);
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn load(path: &Path, options: &CsvOptions) -> Result<Self, RecordError> {
        let file = File::open(path).map_err(|source| RecordError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file, options)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Zero-based access to a data row.
    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows
            .get(index)
            .map(|values| Record::new(index + 1, &self.headers, values))
    }

    pub fn iter(&self) -> impl Iterator<Item = Record<'_>> {
        (0..self.rows.len()).filter_map(|idx| self.record(idx))
    }
}

/// One data row with header-based access.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    /// 1-based position in the data rows.
    pub no: usize,
    headers: &'a [String],
    values: &'a [String],
}

impl<'a> Record<'a> {
    pub fn new(no: usize, headers: &'a [String], values: &'a [String]) -> Self {
        Self {
            no,
            headers,
            values,
        }
    }

    /// Value of `column`; short rows read as empty for known headers.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        Some(self.values.get(idx).map(String::as_str).unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_semicolon_csv_with_headers() {
        let data = "Name;Text\nGoblin;\"Sneaky; quick\"\nOrc;Big\n";
        let records = Records::from_reader(data.as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(records.headers(), ["Name", "Text"]);
        assert_eq!(records.len(), 2);
        let first = records.record(0).unwrap();
        assert_eq!(first.no, 1);
        assert_eq!(first.get("Text"), Some("Sneaky; quick"));
        assert_eq!(first.get("Missing"), None);
    }

    #[test]
    fn short_rows_read_as_empty() {
        let data = "A;B\nonly\n";
        let records = Records::from_reader(data.as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(records.record(0).unwrap().get("B"), Some(""));
    }

    #[test]
    fn custom_dialect() {
        let options = CsvOptions {
            delimiter: ',',
            quote: '\'',
            terminator: Some('|'),
        };
        let data = "a,b|'x,y',z|";
        let records = Records::from_reader(data.as_bytes(), &options).unwrap();
        assert_eq!(records.record(0).unwrap().get("a"), Some("x,y"));
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let options = CsvOptions {
            delimiter: '§',
            ..CsvOptions::default()
        };
        assert!(matches!(
            Records::from_reader("".as_bytes(), &options),
            Err(RecordError::NotAscii("delimiter"))
        ));
    }
}
