use std::io::Read;

use csv::{ByteRecord, ReaderBuilder};

use crate::errors::ParserError;
use crate::model::DataType;

/// The two cells of a source row the importer cares about, as raw bytes. A
/// cell is `None` when a ragged row is too short to contain it. Cells are
/// decoded by the transformer, so bad bytes elsewhere in the row are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<'a> {
    pub timestamp: Option<&'a [u8]>,
    pub value: Option<&'a [u8]>,
}

impl<'a> Row<'a> {
    pub fn from_text(timestamp: &'a str, value: &'a str) -> Self {
        Self {
            timestamp: Some(timestamp.as_bytes()),
            value: Some(value.as_bytes()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub timestamp_column: String,
    pub delimiter: u8,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            timestamp_column: "timestamp".to_string(),
            delimiter: b',',
        }
    }
}

/// Pulls rows one at a time from a delimited source whose first line names
/// the columns. Nothing is read ahead of the caller.
pub struct MeasurementReader<R> {
    inner: csv::Reader<R>,
    record: ByteRecord,
    timestamp_index: usize,
    value_index: usize,
}

impl<R: Read> MeasurementReader<R> {
    pub fn new(source: R, kind: DataType, options: &ReaderOptions) -> Result<Self, ParserError> {
        let mut inner = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(options.delimiter)
            .from_reader(source);

        let headers = inner.byte_headers()?.clone();
        let timestamp_index = find_column(&headers, &options.timestamp_column)?;
        let value_index = find_column(&headers, kind.as_str())?;

        Ok(Self {
            inner,
            record: ByteRecord::new(),
            timestamp_index,
            value_index,
        })
    }

    /// Returns the next non-empty row, or `None` at end of input.
    pub fn next_row(&mut self) -> Result<Option<Row<'_>>, ParserError> {
        loop {
            if !self.inner.read_byte_record(&mut self.record)? {
                return Ok(None);
            }
            if self.record.iter().all(|field| field.iter().all(u8::is_ascii_whitespace)) {
                continue;
            }
            return Ok(Some(Row {
                timestamp: self.record.get(self.timestamp_index),
                value: self.record.get(self.value_index),
            }));
        }
    }

    /// 1-based line of the most recently read record.
    pub fn line(&self) -> u64 {
        self.record.position().map(|pos| pos.line()).unwrap_or(0)
    }
}

fn find_column(headers: &ByteRecord, column: &str) -> Result<usize, ParserError> {
    headers
        .iter()
        .position(|header| String::from_utf8_lossy(header).trim().eq_ignore_ascii_case(column))
        .ok_or_else(|| ParserError::MissingColumn {
            column: column.to_string(),
        })
}
