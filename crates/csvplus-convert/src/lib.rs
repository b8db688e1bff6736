#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # csvplus-convert
//!
//! Record converter: decodes CSV rows into typed records and encodes
//! records back into rows, using bindings resolved by the field registry.
//!
//! Decoding leaves a field untouched when its column text is empty, so
//! optional fields stay `None` and others keep their default.

pub mod converter;
pub mod errors;
pub mod scalar;

pub use converter::{from_record, RecordConverter};
pub use errors::{ConversionError, Error, Result, UnmarshalError};
