//! CSV dialect options

use crate::errors::{CsvError, CsvResult};
use serde::{Deserialize, Serialize};

/// Configuration for CSV reading and writing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    /// Field delimiter character (default: comma)
    pub delimiter: char,
    /// Quote character for fields containing special characters (default: double quote)
    pub quote_char: char,
    /// Escape character for quotes; `None` doubles the quote character
    pub escape_char: Option<char>,
    /// Whether the first row is a header row (default: true)
    pub has_header: bool,
    /// Record terminator used when writing (default: LF)
    pub record_terminator: RecordTerminator,
    /// Accept rows of unequal width (default: false)
    pub flexible: bool,
}

/// Record terminator for writing CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordTerminator {
    /// LF (Unix-style)
    #[default]
    LF,
    /// CRLF (Windows-style, RFC 4180)
    CRLF,
}

impl RecordTerminator {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordTerminator::LF => "\n",
            RecordTerminator::CRLF => "\r\n",
        }
    }

    fn to_csv(self) -> csv::Terminator {
        match self {
            RecordTerminator::LF => csv::Terminator::Any(b'\n'),
            RecordTerminator::CRLF => csv::Terminator::CRLF,
        }
    }
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_char: '"',
            escape_char: None,
            has_header: true,
            record_terminator: RecordTerminator::LF,
            flexible: false,
        }
    }
}

impl CsvConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delimiter character
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quote character
    pub fn quote_char(mut self, quote_char: char) -> Self {
        self.quote_char = quote_char;
        self
    }

    /// Set the escape character
    pub fn escape_char(mut self, escape_char: char) -> Self {
        self.escape_char = Some(escape_char);
        self
    }

    /// Configure header presence
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Disable header row
    pub fn without_header(mut self) -> Self {
        self.has_header = false;
        self
    }

    /// Set record terminator
    pub fn record_terminator(mut self, terminator: RecordTerminator) -> Self {
        self.record_terminator = terminator;
        self
    }

    /// Allow rows of unequal width
    pub fn flexible(mut self, flexible: bool) -> Self {
        self.flexible = flexible;
        self
    }

    /// Check that the dialect characters are usable by the tokenizer.
    ///
    /// # Errors
    ///
    /// Returns [`CsvError::Config`] for non-ASCII characters, or when the
    /// delimiter and quote character are the same.
    pub fn validate(&self) -> CsvResult<()> {
        let chars = [
            ("delimiter", Some(self.delimiter)),
            ("quote_char", Some(self.quote_char)),
            ("escape_char", self.escape_char),
        ];
        for (name, c) in chars {
            if let Some(c) = c.filter(|c| !c.is_ascii()) {
                return Err(CsvError::config(format!(
                    "{name} must be an ASCII character, got '{c}'"
                )));
            }
        }
        if self.delimiter == self.quote_char {
            return Err(CsvError::config(format!(
                "delimiter and quote_char are both '{}'",
                self.delimiter
            )));
        }
        Ok(())
    }

    /// Convert delimiter to u8 for csv crate
    pub fn delimiter_u8(&self) -> u8 {
        self.delimiter as u8
    }

    /// Convert quote char to u8 for csv crate
    pub fn quote_char_u8(&self) -> u8 {
        self.quote_char as u8
    }

    /// Get escape character as u8, or use quote char if not set
    pub fn escape_char_u8(&self) -> u8 {
        self.escape_char
            .map(|c| c as u8)
            .unwrap_or(self.quote_char as u8)
    }

    /// Tokenizer for this dialect. Header rows are handled by the decoder,
    /// so the csv reader never consumes one itself.
    pub(crate) fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter_u8())
            .quote(self.quote_char_u8())
            .has_headers(false)
            .flexible(self.flexible);
        if self.escape_char.is_some() {
            builder
                .escape(Some(self.escape_char_u8()))
                .double_quote(false);
        }
        builder
    }

    pub(crate) fn writer_builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(self.delimiter_u8())
            .quote(self.quote_char_u8())
            .has_headers(false)
            .flexible(self.flexible)
            .terminator(self.record_terminator.to_csv());
        if self.escape_char.is_some() {
            builder.escape(self.escape_char_u8()).double_quote(false);
        }
        builder
    }
}
