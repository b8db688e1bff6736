#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # csvplus-registry
//!
//! Field registry: resolves the fields of a record type to CSV columns and
//! caches the result per record type and column shape.
//!
//! Resolution rules in header mode:
//! - an explicit column override wins, otherwise the declared field name;
//! - a name that does not match exactly is retried with its first letter
//!   lowercased;
//! - fields marked `-` are skipped;
//! - when several fields resolve to the same column, none of them bind.

pub mod binding;
pub mod registry;
mod resolver;

pub use binding::{BindingMode, BindingSet, Collision, FieldBinding};
pub use registry::{ColumnSource, FieldRegistry};

use thiserror::Error;

/// Errors that can occur while resolving field bindings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] csvplus_schema::Error),

    #[error("{record} declares {fields} bindable fields but rows have {columns} columns")]
    FieldCountMismatch {
        record: String,
        fields: usize,
        columns: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
