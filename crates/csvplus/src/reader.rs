//! Streaming CSV decoder

use crate::config::CsvConfig;
use crate::errors::{CsvError, CsvResult};
use csvplus_convert::RecordConverter;
use csvplus_registry::FieldRegistry;
use csvplus_schema::CsvRecord;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, trace};

/// Decodes CSV input into typed records
#[derive(Debug, Clone)]
pub struct CsvDecoder {
    config: CsvConfig,
    registry: Arc<FieldRegistry>,
}

impl CsvDecoder {
    /// Create a decoder with the default dialect and the global registry
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

    /// Use a specific binding cache instead of the global one
    pub fn with_registry(mut self, registry: Arc<FieldRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Configure header presence
    pub fn use_header(mut self, has_header: bool) -> Self {
        self.config.has_header = has_header;
        self
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Stream records from `reader`, one per data row.
    ///
    /// # Errors
    ///
    /// Returns [`CsvError::Config`] when the dialect is unusable.
    pub fn records<R: CsvRecord, Rd: Read>(
        &self,
        reader: Rd,
    ) -> CsvResult<CsvRecordIterator<R, Rd>> {
        self.config.validate()?;
        Ok(CsvRecordIterator {
            reader: self.config.reader_builder().from_reader(reader),
            registry: Arc::clone(&self.registry),
            has_header: self.config.has_header,
            converter: None,
            header: None,
            record: csv::StringRecord::new(),
            row: 0,
            decoded: 0,
            done: false,
        })
    }

    /// Decode every row of `reader`.
    pub fn decode<R: CsvRecord, Rd: Read>(&self, reader: Rd) -> CsvResult<Vec<R>> {
        let mut records = Vec::new();
        self.decode_into(reader, &mut records)?;
        Ok(records)
    }

    /// Decode every row of `reader`, appending to `records`. Returns how
    /// many records were appended.
    ///
    /// # Errors
    ///
    /// Stops at the first tokenizer, binding or conversion error. Records
    /// decoded before the error stay appended.
    pub fn decode_into<R: CsvRecord, Rd: Read>(
        &self,
        reader: Rd,
        records: &mut Vec<R>,
    ) -> CsvResult<usize> {
        let before = records.len();
        for record in self.records(reader)? {
            records.push(record?);
        }
        let appended = records.len() - before;
        debug!(
            record = std::any::type_name::<R>(),
            appended, "Finished decoding CSV"
        );
        Ok(appended)
    }
}

impl Default for CsvDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the records of one CSV input.
///
/// Bindings are resolved from the first row: by name when the input has a
/// header (the header row itself yields nothing), by position otherwise.
/// Iteration ends after the first error.
pub struct CsvRecordIterator<R, Rd> {
    reader: csv::Reader<Rd>,
    registry: Arc<FieldRegistry>,
    has_header: bool,
    converter: Option<RecordConverter<R>>,
    header: Option<Vec<String>>,
    record: csv::StringRecord,
    row: usize,
    decoded: usize,
    done: bool,
}

impl<R: CsvRecord, Rd: Read> CsvRecordIterator<R, Rd> {
    /// Ordinal of the next row, counting the header row.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Header names, once a header row has been read.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    fn read_row(&mut self) -> CsvResult<bool> {
        self.reader
            .read_record(&mut self.record)
            .map_err(CsvError::from_read)
    }

    fn step(&mut self) -> CsvResult<Option<R>> {
        loop {
            if !self.read_row()? {
                debug!(
                    record = std::any::type_name::<R>(),
                    rows = self.row,
                    decoded = self.decoded,
                    "Reached end of CSV input"
                );
                return Ok(None);
            }
            let fields: Vec<&str> = self.record.iter().collect();

            let converter = match self.converter.take() {
                Some(converter) => converter,
                None if self.has_header => {
                    let names: Vec<String> = fields.iter().map(ToString::to_string).collect();
                    self.converter = Some(RecordConverter::for_header(&self.registry, &names)?);
                    self.header = Some(names);
                    self.row += 1;
                    continue;
                }
                None => RecordConverter::positional(&self.registry, fields.len())?,
            };

            let result = converter.decode(self.row, &fields);
            self.converter = Some(converter);
            let record = result?;
            trace!(row = self.row, "Decoded CSV row");
            self.row += 1;
            self.decoded += 1;
            return Ok(Some(record));
        }
    }
}

impl<R: CsvRecord, Rd: Read> Iterator for CsvRecordIterator<R, Rd> {
    type Item = CsvResult<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
