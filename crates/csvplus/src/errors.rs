//! Error types for CSV decoding and encoding with context

use csvplus_convert::UnmarshalError;
use thiserror::Error;

/// Errors that can occur when working with CSV
#[derive(Error, Debug)]
pub enum CsvError {
    /// Tokenizer error with context
    #[error("CSV read error at line {line}: {message}")]
    Read { line: usize, message: String },

    /// CSV write error
    #[error("CSV write error: {0}")]
    Write(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Binding resolution or value conversion error
    #[error(transparent)]
    Convert(#[from] csvplus_convert::Error),
}

impl CsvError {
    /// Create a read error at a specific line
    pub fn read_at(line: usize, message: impl Into<String>) -> Self {
        Self::Read {
            line,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a write error
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write(message.into())
    }

    /// Map a tokenizer error, keeping its line when csv reports one.
    pub(crate) fn from_read(err: csv::Error) -> Self {
        if err.is_io_error() {
            return Self::Io(err.to_string());
        }
        let line = err
            .position()
            .map_or(0, |pos| usize::try_from(pos.line()).unwrap_or(usize::MAX));
        Self::read_at(line, err.to_string())
    }

    pub(crate) fn from_write(err: csv::Error) -> Self {
        if err.is_io_error() {
            return Self::Io(err.to_string());
        }
        Self::write(err.to_string())
    }

    /// Get the line number if available
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::Read { line, .. } if *line > 0 => Some(*line),
            _ => None,
        }
    }

    /// The column conversion failure, if this is one.
    pub fn as_unmarshal(&self) -> Option<&UnmarshalError> {
        match self {
            Self::Convert(err) => err.as_unmarshal(),
            _ => None,
        }
    }

    /// True for a value that did not fit its field's width.
    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::Convert(err) if err.is_overflow())
    }
}

impl From<std::io::Error> for CsvError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Result type alias for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;
