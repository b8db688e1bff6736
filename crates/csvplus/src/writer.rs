//! Streaming CSV encoder

use crate::config::CsvConfig;
use crate::errors::{CsvError, CsvResult};
use csvplus_convert::RecordConverter;
use csvplus_registry::FieldRegistry;
use csvplus_schema::CsvRecord;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, trace};

/// Encodes typed records as CSV
#[derive(Debug, Clone)]
pub struct CsvEncoder {
    config: CsvConfig,
    registry: Arc<FieldRegistry>,
}

impl CsvEncoder {
    /// Create an encoder with the default dialect and the global registry
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

    /// Configure header writing
    pub fn use_header(mut self, has_header: bool) -> Self {
        self.config.has_header = has_header;
        self
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Open an incremental encode session on `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error when the dialect is unusable or the record type's
    /// field overrides are malformed.
    pub fn writer<R: CsvRecord, W: Write>(&self, writer: W) -> CsvResult<CsvRecordWriter<R, W>> {
        self.config.validate()?;
        let converter = RecordConverter::for_output(&self.registry)?;
        let header = if self.config.has_header {
            HeaderState::Pending
        } else {
            HeaderState::Suppressed
        };
        Ok(CsvRecordWriter {
            writer: self.config.writer_builder().from_writer(writer),
            converter,
            header,
            written: 0,
        })
    }

    /// Write the header row (unless suppressed) and one row per record,
    /// then flush. The header is written even when `records` is empty.
    pub fn encode<R: CsvRecord, W: Write>(&self, writer: W, records: &[R]) -> CsvResult<()> {
        let mut session = self.writer(writer)?;
        session.write_header()?;
        session.write_all(records)?;
        session.finish()?;
        Ok(())
    }
}

impl Default for CsvEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderState {
    Pending,
    Emitted,
    Suppressed,
}

/// Incremental encode session for records of type `R`.
///
/// The header row goes out before the first record, or on [`finish`] if no
/// record was written.
///
/// [`finish`]: CsvRecordWriter::finish
pub struct CsvRecordWriter<R, W: Write> {
    writer: csv::Writer<W>,
    converter: RecordConverter<R>,
    header: HeaderState,
    written: usize,
}

impl<R: CsvRecord, W: Write> CsvRecordWriter<R, W> {
    /// Write the header row if it is still pending. Later calls do nothing.
    pub fn write_header(&mut self) -> CsvResult<()> {
        if self.header != HeaderState::Pending {
            return Ok(());
        }
        let header = self.converter.header();
        self.writer
            .write_record(&header)
            .map_err(CsvError::from_write)?;
        trace!(?header, "Wrote CSV header");
        self.header = HeaderState::Emitted;
        Ok(())
    }

    /// Encode and write one record.
    pub fn write(&mut self, record: &R) -> CsvResult<()> {
        self.write_header()?;
        let row = self.converter.encode(record)?;
        self.writer
            .write_record(&row)
            .map_err(CsvError::from_write)?;
        trace!(?row, "Wrote CSV row");
        self.written += 1;
        Ok(())
    }

    /// Encode and write every record of `records`.
    pub fn write_all<'a, I>(&mut self, records: I) -> CsvResult<()>
    where
        I: IntoIterator<Item = &'a R>,
        R: 'a,
    {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Whether the header row has been written.
    pub fn header_written(&self) -> bool {
        self.header == HeaderState::Emitted
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Write a pending header, flush and return the underlying writer.
    pub fn finish(mut self) -> CsvResult<W> {
        self.write_header()?;
        self.writer.flush()?;
        debug!(
            record = std::any::type_name::<R>(),
            record_count = self.written,
            "Finished writing CSV"
        );
        self.writer
            .into_inner()
            .map_err(|e| CsvError::write(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordTerminator;
    use csvplus_schema::{field, FieldDef};

    #[derive(Debug, Default)]
    struct Pair {
        key: String,
        value: i32,
    }

    impl CsvRecord for Pair {
        fn fields() -> Vec<FieldDef<Self>> {
            vec![field!(Pair, key).tag("k"), field!(Pair, value).tag("v")]
        }
    }

    fn encoder() -> CsvEncoder {
        CsvEncoder::new().with_registry(Arc::new(FieldRegistry::new()))
    }

    fn pair(key: &str, value: i32) -> Pair {
        Pair {
            key: key.to_string(),
            value,
        }
    }

    #[test]
    fn test_header_for_empty_collection() {
        let mut out = Vec::new();
        encoder().encode::<Pair, _>(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "k,v\n");
    }

    #[test]
    fn test_session_emits_header_once() {
        let mut session = encoder().writer::<Pair, _>(Vec::new()).unwrap();
        assert!(!session.header_written());
        session.write(&pair("a", 1)).unwrap();
        session.write_header().unwrap();
        session.write(&pair("b", 2)).unwrap();
        assert!(session.header_written());
        assert_eq!(session.written(), 2);

        let out = session.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "k,v\na,1\nb,2\n");
    }

    #[test]
    fn test_finish_writes_pending_header() {
        let session = encoder().writer::<Pair, _>(Vec::new()).unwrap();
        let out = session.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "k,v\n");
    }

    #[test]
    fn test_suppressed_header_and_crlf() {
        let config = CsvConfig::new()
            .without_header()
            .record_terminator(RecordTerminator::CRLF);
        let mut out = Vec::new();
        encoder()
            .with_config(config)
            .encode(&mut out, &[pair("a", 1), pair("b,c", 2)])
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a,1\r\n\"b,c\",2\r\n");
    }
}
