#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # csvplus-schema
//!
//! Record type descriptors, per-field overrides, and the value model used to
//! map CSV columns onto typed records.
//!
//! Record types describe their fields at compile time through [`CsvRecord`];
//! the registry turns those descriptors into column bindings and the
//! converter moves values through [`Scalar`].

/// Date/time layouts and their aliases.
pub mod layout;
/// Structured per-field override descriptor and its tag syntax.
pub mod overrides;
/// Record type descriptors and typed field accessors.
pub mod record;
/// Field kinds, scalars, and custom conversion hooks.
pub mod value;

pub use layout::{LayoutMismatch, TimeLayout};
pub use overrides::FieldOverrides;
pub use record::{CsvRecord, FieldCodec, FieldDef, HookAccess, RecordSchema, ScalarAccess};
pub use value::{BoxError, CsvMarshal, CsvUnmarshal, FieldKind, FieldValue, Scalar, ScalarKind};

use thiserror::Error;

/// Errors raised while interpreting field override metadata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid override for field {field}: {reason}")]
    InvalidOverride { field: String, reason: String },

    #[error("invalid layout format for field {field}: '{layout}'")]
    InvalidLayout { field: String, layout: String },
}

impl Error {
    /// Build a malformed-override error for a field.
    pub fn invalid_override(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOverride {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build an unusable-layout error for a field.
    pub fn invalid_layout(field: impl Into<String>, layout: impl Into<String>) -> Self {
        Self::InvalidLayout {
            field: field.into(),
            layout: layout.into(),
        }
    }

    /// Name of the field whose metadata is malformed.
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidOverride { field, .. } | Self::InvalidLayout { field, .. } => field,
        }
    }
}

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, Error>;
