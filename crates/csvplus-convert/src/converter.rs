//! Row <-> record conversion over resolved bindings

use crate::errors::{ConversionError, Error, Result, UnmarshalError};
use crate::scalar::{format_scalar, parse_scalar};
use csvplus_registry::{BindingSet, FieldBinding, FieldRegistry};
use csvplus_schema::{BoxError, CsvRecord, FieldCodec, FieldDef, RecordSchema};
use std::sync::Arc;
use tracing::trace;

/// Converts rows of one shape to records of type `R` and back.
#[derive(Debug)]
pub struct RecordConverter<R> {
    schema: RecordSchema<R>,
    bindings: Arc<BindingSet>,
}

impl<R: CsvRecord> RecordConverter<R> {
    /// Pair a schema with bindings resolved for the same record type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BindingMismatch`] when the bindings were resolved for
    /// another type or reference a field the schema does not declare.
    pub fn new(schema: RecordSchema<R>, bindings: Arc<BindingSet>) -> Result<Self> {
        let mismatch = || Error::BindingMismatch {
            expected: schema.type_name().to_string(),
            found: bindings.type_name().to_string(),
        };
        if bindings.type_name() != schema.type_name() {
            return Err(mismatch());
        }
        let declared = bindings.iter().all(|b| {
            schema
                .field(b.field_index())
                .is_some_and(|f| f.name() == b.field_name())
        });
        if !declared {
            return Err(mismatch());
        }
        trace!(
            record = schema.type_name(),
            mode = ?bindings.mode(),
            bindings = bindings.len(),
            "Record converter ready"
        );
        Ok(Self { schema, bindings })
    }

    /// Converter for rows under the given header.
    pub fn for_header(registry: &FieldRegistry, header: &[String]) -> Result<Self> {
        let schema = RecordSchema::new();
        let bindings = registry.resolve_header(&schema, header)?;
        Self::new(schema, bindings)
    }

    /// Converter for header-less rows `columns` wide.
    pub fn positional(registry: &FieldRegistry, columns: usize) -> Result<Self> {
        let schema = RecordSchema::new();
        let bindings = registry.resolve_positional(&schema, columns)?;
        Self::new(schema, bindings)
    }

    /// Converter for the encode side.
    pub fn for_output(registry: &FieldRegistry) -> Result<Self> {
        let schema = RecordSchema::new();
        let bindings = registry.resolve_output(&schema)?;
        Self::new(schema, bindings)
    }

    /// Decode one row into a fresh record.
    ///
    /// `row` is the row ordinal used in error positions.
    pub fn decode<S: AsRef<str>>(&self, row: usize, fields: &[S]) -> Result<R> {
        let mut record = R::default();
        self.decode_into(row, fields, &mut record)?;
        Ok(record)
    }

    /// Decode one row into an existing record. Columns with empty text leave
    /// their field untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowTooShort`] when the row lacks a bound column and
    /// [`Error::Unmarshal`] for the first column that fails to convert.
    pub fn decode_into<S: AsRef<str>>(
        &self,
        row: usize,
        fields: &[S],
        record: &mut R,
    ) -> Result<()> {
        let width = self.bindings.min_row_width();
        if fields.len() < width {
            return Err(Error::RowTooShort {
                row,
                column_index: width - 1,
                len: fields.len(),
            });
        }

        for binding in self.bindings.iter() {
            let text = fields[binding.column_index()].as_ref();
            if text.is_empty() {
                continue;
            }
            let field = self.field(binding)?;
            decode_field(field, binding, text, record).map_err(|source| UnmarshalError {
                column: binding.column_label(),
                row,
                value: text.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Encode a record into one row, in binding order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Marshal`] for the first field that cannot be rendered.
    pub fn encode(&self, record: &R) -> Result<Vec<String>> {
        self.bindings
            .iter()
            .map(|binding| {
                let field = self.field(binding)?;
                encode_field(field, binding, record).map_err(|source| Error::Marshal {
                    column: binding.column_label(),
                    source,
                })
            })
            .collect()
    }

    /// Column names in binding order.
    pub fn header(&self) -> Vec<String> {
        self.bindings.header()
    }

    pub fn bindings(&self) -> &Arc<BindingSet> {
        &self.bindings
    }

    pub fn schema(&self) -> &RecordSchema<R> {
        &self.schema
    }

    fn field(&self, binding: &FieldBinding) -> Result<&FieldDef<R>> {
        self.schema
            .field(binding.field_index())
            .ok_or_else(|| Error::BindingMismatch {
                expected: self.schema.type_name().to_string(),
                found: self.bindings.type_name().to_string(),
            })
    }
}

fn decode_field<R>(
    field: &FieldDef<R>,
    binding: &FieldBinding,
    text: &str,
    record: &mut R,
) -> std::result::Result<(), ConversionError> {
    match field.codec() {
        FieldCodec::Hook(hook) => {
            hook.unmarshal(record, text)
                .map_err(|source| ConversionError::Hook {
                    field: field.name().to_string(),
                    source,
                })
        }
        FieldCodec::Builtin(slot) => {
            let kind = slot.kind();
            let value = parse_scalar(field.name(), &kind.scalar, binding.layout(), text)?;
            if slot.store(record, value) {
                Ok(())
            } else {
                Err(ConversionError::unsupported(field.name(), kind.to_string()))
            }
        }
    }
}

fn encode_field<R>(
    field: &FieldDef<R>,
    binding: &FieldBinding,
    record: &R,
) -> std::result::Result<String, ConversionError> {
    let hook_error = |source: BoxError| ConversionError::Hook {
        field: field.name().to_string(),
        source,
    };

    match field.codec() {
        FieldCodec::Hook(hook) => {
            let bytes = hook.marshal(record).map_err(hook_error)?;
            String::from_utf8(bytes).map_err(|e| hook_error(e.into()))
        }
        FieldCodec::Builtin(slot) => match slot.load(record) {
            Some(value) => format_scalar(&slot.kind(), binding.layout(), &value),
            None => Ok(String::new()),
        },
    }
}

/// Decode a single header-less row into a record, binding fields by
/// declaration order. The row is reported as row 0 in errors.
///
/// # Errors
///
/// Returns an error when the field count does not match the row width or a
/// column fails to convert.
pub fn from_record<R: CsvRecord, S: AsRef<str>>(fields: &[S]) -> Result<R> {
    let registry = FieldRegistry::global();
    RecordConverter::<R>::positional(&registry, fields.len())?.decode(0, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csvplus_schema::{field, hook_field, CsvMarshal, CsvUnmarshal};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Item {
        first: String,
        second: i64,
        third: Option<bool>,
    }

    impl CsvRecord for Item {
        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                field!("First", Item, first),
                field!("Second", Item, second),
                field!("Third", Item, third),
            ]
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Small {
        count: u8,
        ratio: f32,
    }

    impl CsvRecord for Small {
        fn fields() -> Vec<FieldDef<Self>> {
            vec![field!(Small, count), field!(Small, ratio)]
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Shouty(String);

    impl CsvUnmarshal for Shouty {
        fn unmarshal_csv(text: &str) -> std::result::Result<Self, BoxError> {
            if text.chars().any(char::is_lowercase) {
                return Err(format!("{text} is not upper case").into());
            }
            Ok(Shouty(text.to_string()))
        }
    }

    impl CsvMarshal for Shouty {
        fn marshal_csv(&self) -> std::result::Result<Vec<u8>, BoxError> {
            Ok(self.0.clone().into_bytes())
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Loud {
        word: Shouty,
    }

    impl CsvRecord for Loud {
        fn fields() -> Vec<FieldDef<Self>> {
            vec![hook_field!(Loud, word)]
        }
    }

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_decode_by_header() {
        let registry = FieldRegistry::new();
        let converter =
            RecordConverter::<Item>::for_header(&registry, &header(&["first", "second", "third"]))
                .unwrap();

        let item = converter.decode(1, &["a", "1", ""]).unwrap();
        assert_eq!(
            item,
            Item {
                first: "a".to_string(),
                second: 1,
                third: None,
            }
        );

        let item = converter.decode(2, &["b", "2", "f"]).unwrap();
        assert_eq!(item.third, Some(false));
        let item = converter.decode(3, &["b", "2", "t"]).unwrap();
        assert_eq!(item.third, Some(true));
    }

    #[test]
    fn test_decode_into_keeps_untouched_fields() {
        let registry = FieldRegistry::new();
        let converter =
            RecordConverter::<Item>::for_header(&registry, &header(&["First", "Second"])).unwrap();

        let mut item = Item {
            third: Some(true),
            ..Item::default()
        };
        converter.decode_into(1, &["x", ""], &mut item).unwrap();
        assert_eq!(item.first, "x");
        assert_eq!(item.second, 0);
        assert_eq!(item.third, Some(true));
    }

    #[test]
    fn test_overflow_error_position() {
        let registry = FieldRegistry::new();
        let converter = RecordConverter::<Small>::positional(&registry, 2).unwrap();

        assert_eq!(converter.decode(0, &["255", "0.5"]).unwrap().count, 255);

        let err = converter.decode(4, &["300", "0.5"]).unwrap_err();
        assert!(err.is_overflow());
        let unmarshal = err.as_unmarshal().unwrap();
        assert_eq!(unmarshal.column, "col idx 0");
        assert_eq!(unmarshal.row, 4);
        assert_eq!(unmarshal.value, "300");
    }

    #[test]
    fn test_row_too_short() {
        let registry = FieldRegistry::new();
        let converter =
            RecordConverter::<Item>::for_header(&registry, &header(&["First", "Second", "Third"]))
                .unwrap();
        let err = converter.decode(7, &["a"]).unwrap_err();
        assert!(matches!(
            err,
            Error::RowTooShort {
                row: 7,
                column_index: 2,
                len: 1
            }
        ));
    }

    #[test]
    fn test_encode_in_binding_order() {
        let registry = FieldRegistry::new();
        let converter = RecordConverter::<Item>::for_output(&registry).unwrap();

        assert_eq!(converter.header(), vec!["First", "Second", "Third"]);
        let row = converter
            .encode(&Item {
                first: "a".to_string(),
                second: -3,
                third: None,
            })
            .unwrap();
        assert_eq!(row, vec!["a", "-3", ""]);
    }

    #[test]
    fn test_f32_encodes_at_f32_precision() {
        let registry = FieldRegistry::new();
        let converter = RecordConverter::<Small>::for_output(&registry).unwrap();
        let row = converter.encode(&Small { count: 1, ratio: 0.1 }).unwrap();
        assert_eq!(row, vec!["1", "0.1"]);
    }

    #[test]
    fn test_hook_failure_names_field() {
        let registry = FieldRegistry::new();
        let converter = RecordConverter::<Loud>::positional(&registry, 1).unwrap();

        assert_eq!(
            converter.decode(0, &["HEY"]).unwrap().word,
            Shouty("HEY".to_string())
        );
        let err = converter.decode(3, &["hey"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "col: col idx 0, row: 3, val: hey, err: field word: hey is not upper case"
        );
    }

    #[test]
    fn test_mismatched_bindings_rejected() {
        let registry = FieldRegistry::new();
        let bindings = registry
            .resolve_output(&RecordSchema::<Small>::new())
            .unwrap();
        let err = RecordConverter::new(RecordSchema::<Item>::new(), bindings).unwrap_err();
        assert!(matches!(err, Error::BindingMismatch { .. }));
    }

    #[test]
    fn test_from_record() {
        let item: Item = from_record(&["z", "9", "1"]).unwrap();
        assert_eq!(item.first, "z");
        assert_eq!(item.second, 9);
        assert_eq!(item.third, Some(true));

        assert!(from_record::<Item, _>(&["z", "9"]).is_err());
    }
}
