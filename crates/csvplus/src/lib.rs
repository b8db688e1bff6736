#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # csvplus
//!
//! Marshal and unmarshal CSV data to and from collections of typed records.
//!
//! Fields map to columns by header name (or an explicit column tag), or by
//! declaration order when the input has no header. Common scalar types are
//! converted with builtin rules; types implementing [`CsvUnmarshal`] and
//! [`CsvMarshal`] convert themselves.
//!
//! ## Example Usage
//!
//! ```rust
//! use csvplus::{field, CsvRecord, FieldDef};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Item {
//!     first: String,
//!     second: i64,
//!     third: Option<bool>,
//! }
//!
//! impl CsvRecord for Item {
//!     fn fields() -> Vec<FieldDef<Self>> {
//!         vec![
//!             field!("First", Item, first),
//!             field!("Second", Item, second),
//!             field!("Third", Item, third),
//!         ]
//!     }
//! }
//!
//! let items: Vec<Item> = csvplus::unmarshal(b"first,second,third\na,1,\nb,2,t\n").unwrap();
//! assert_eq!(items[0].third, None);
//! assert_eq!(items[1].third, Some(true));
//!
//! let out = csvplus::marshal(&items).unwrap();
//! assert_eq!(out, b"First,Second,Third\na,1,\nb,2,true\n");
//! ```

pub mod config;
pub mod errors;
pub mod reader;
pub mod writer;

pub use config::{CsvConfig, RecordTerminator};
pub use errors::{CsvError, CsvResult};
pub use reader::{CsvDecoder, CsvRecordIterator};
pub use writer::{CsvEncoder, CsvRecordWriter};

pub use csvplus_convert::{ConversionError, RecordConverter, UnmarshalError};
pub use csvplus_registry::{
    BindingMode, BindingSet, Collision, ColumnSource, FieldBinding, FieldRegistry,
};
pub use csvplus_schema::{
    field, hook_field, BoxError, CsvMarshal, CsvRecord, CsvUnmarshal, FieldDef, FieldKind,
    FieldOverrides, FieldValue, RecordSchema, Scalar, ScalarKind, TimeLayout,
};

use std::io::{Read, Write};
use std::sync::Arc;

/// Bundles a dialect and a binding cache, and hands out decoders and
/// encoders configured with both
#[derive(Debug, Clone)]
pub struct CsvMapper {
    config: CsvConfig,
    registry: Arc<FieldRegistry>,
}

impl CsvMapper {
    /// Create a mapper with the default dialect and the global registry
    pub fn new() -> Self {
        Self {
            config: CsvConfig::default(),
            registry: FieldRegistry::global(),
        }
    }

    /// Set the dialect
    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific binding cache
    pub fn with_registry(mut self, registry: Arc<FieldRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<FieldRegistry> {
        &self.registry
    }

    /// Get a decoder configured with this mapper's settings
    pub fn decoder(&self) -> CsvDecoder {
        CsvDecoder::new()
            .with_config(self.config.clone())
            .with_registry(Arc::clone(&self.registry))
    }

    /// Get an encoder configured with this mapper's settings
    pub fn encoder(&self) -> CsvEncoder {
        CsvEncoder::new()
            .with_config(self.config.clone())
            .with_registry(Arc::clone(&self.registry))
    }
}

impl Default for CsvMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode CSV data with a header row.
pub fn unmarshal<R: CsvRecord>(data: &[u8]) -> CsvResult<Vec<R>> {
    CsvDecoder::new().decode(data)
}

/// Decode CSV data with a header row from a reader.
pub fn unmarshal_reader<R: CsvRecord, Rd: Read>(reader: Rd) -> CsvResult<Vec<R>> {
    CsvDecoder::new().decode(reader)
}

/// Decode CSV data that has no header row; fields bind by declaration order.
pub fn unmarshal_without_header<R: CsvRecord>(data: &[u8]) -> CsvResult<Vec<R>> {
    CsvDecoder::new().use_header(false).decode(data)
}

/// Encode records as CSV with a header row.
pub fn marshal<R: CsvRecord>(records: &[R]) -> CsvResult<Vec<u8>> {
    let mut out = Vec::new();
    CsvEncoder::new().encode(&mut out, records)?;
    Ok(out)
}

/// Encode records as CSV with a header row into a writer.
pub fn marshal_writer<R: CsvRecord, W: Write>(records: &[R], writer: W) -> CsvResult<()> {
    CsvEncoder::new().encode(writer, records)
}

/// Encode records as CSV without a header row.
pub fn marshal_without_header<R: CsvRecord>(records: &[R]) -> CsvResult<Vec<u8>> {
    let mut out = Vec::new();
    CsvEncoder::new().use_header(false).encode(&mut out, records)?;
    Ok(out)
}

/// Decode one already tokenized row, binding fields by declaration order.
pub fn from_record<R: CsvRecord, S: AsRef<str>>(fields: &[S]) -> CsvResult<R> {
    Ok(csvplus_convert::from_record(fields)?)
}
