//! Error types for record conversion

use csvplus_schema::{BoxError, LayoutMismatch};
use thiserror::Error;

/// Why one column value could not be converted.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("invalid syntax for {expected}")]
    Syntax { expected: String },

    #[error("value out of range for {expected}")]
    Overflow { expected: String },

    #[error("does not match layout {layout}: {source}")]
    Layout {
        layout: String,
        #[source]
        source: LayoutMismatch,
    },

    #[error("unsupported type {type_name} for field {field}")]
    Unsupported { field: String, type_name: String },

    #[error("field {field}: {source}")]
    Hook {
        field: String,
        #[source]
        source: BoxError,
    },
}

impl ConversionError {
    pub fn syntax(expected: impl ToString) -> Self {
        Self::Syntax {
            expected: expected.to_string(),
        }
    }

    pub fn overflow(expected: impl ToString) -> Self {
        Self::Overflow {
            expected: expected.to_string(),
        }
    }

    pub fn unsupported(field: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::Unsupported {
            field: field.into(),
            type_name: type_name.into(),
        }
    }

    /// True when the text was well formed but does not fit the field's width.
    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow { .. })
    }
}

/// A column value that failed to decode, with its position.
#[derive(Error, Debug)]
#[error("col: {column}, row: {row}, val: {value}, err: {source}")]
pub struct UnmarshalError {
    /// Header name, or `col idx N` without a header
    pub column: String,
    /// Row ordinal, header row included
    pub row: usize,
    /// Raw column text
    pub value: String,
    #[source]
    pub source: ConversionError,
}

impl UnmarshalError {
    pub fn is_overflow(&self) -> bool {
        self.source.is_overflow()
    }
}

/// Errors that can occur while converting rows and records
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Resolve(#[from] csvplus_registry::Error),

    #[error("binding set for {found} cannot convert {expected}")]
    BindingMismatch { expected: String, found: String },

    #[error("row {row} has {len} columns, bindings need column index {column_index}")]
    RowTooShort {
        row: usize,
        column_index: usize,
        len: usize,
    },

    #[error(transparent)]
    Unmarshal(#[from] UnmarshalError),

    #[error("cannot encode column {column}: {source}")]
    Marshal {
        column: String,
        #[source]
        source: ConversionError,
    },
}

impl Error {
    /// The decode failure, if this is one.
    pub fn as_unmarshal(&self) -> Option<&UnmarshalError> {
        match self {
            Self::Unmarshal(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_overflow(&self) -> bool {
        match self {
            Self::Unmarshal(err) => err.is_overflow(),
            Self::Marshal { source, .. } => source.is_overflow(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmarshal_error_display() {
        let err = UnmarshalError {
            column: "second".to_string(),
            row: 2,
            value: "300".to_string(),
            source: ConversionError::overflow("u8"),
        };
        assert_eq!(
            err.to_string(),
            "col: second, row: 2, val: 300, err: value out of range for u8"
        );
        assert!(err.is_overflow());
    }

    #[test]
    fn test_overflow_through_error() {
        let err = Error::from(UnmarshalError {
            column: "col idx 1".to_string(),
            row: 0,
            value: "x".to_string(),
            source: ConversionError::syntax("i64"),
        });
        assert!(!err.is_overflow());
        assert!(err.as_unmarshal().is_some());
        assert!(err.to_string().starts_with("col: col idx 1, row: 0"));
    }
}
