//! Delimited text sheets

use std::borrow::Cow;

use anyhow::Context;
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::debug;

use super::SheetParser;
use crate::config::ImportConfig;
use crate::DataError;

/// Parses CSV (or any single-byte delimited) content
#[derive(Debug, Clone)]
pub struct CsvSheetParser {
    delimiter: u8,
    trim: bool,
}

impl Default for CsvSheetParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: false,
        }
    }
}

impl CsvSheetParser {
    pub fn new(config: &ImportConfig) -> Result<Self, DataError> {
        Ok(Self {
            delimiter: config.delimiter_byte()?,
            trim: config.trim_whitespace,
        })
    }
}

/// Decode sheet bytes to text.
///
/// A byte order mark selects the encoding; otherwise UTF-8 is tried and
/// anything else is read as Windows-1252, which maps every byte.
fn decode(content: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(content) {
        return encoding.decode_without_bom_handling(&content[bom_len..]).0;
    }

    match UTF_8.decode_without_bom_handling_and_without_replacement(content) {
        Some(text) => text,
        None => {
            debug!("Sheet is not UTF-8, decoding as Windows-1252");
            WINDOWS_1252.decode_without_bom_handling(content).0
        }
    }
}

fn is_line_break(byte: &u8) -> bool {
    matches!(byte, b'\n' | b'\r')
}

/// Line numbers of byte offsets, for offsets visited in increasing order
struct LineCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0, line: 0 }
    }

    /// 0-based line holding the byte at `offset`
    fn line_at(&mut self, offset: usize) -> usize {
        let offset = offset.min(self.bytes.len());
        if offset > self.offset {
            self.line += self.bytes[self.offset..offset].iter().filter(|b| **b == b'\n').count();
            self.offset = offset;
        }
        self.line
    }
}

impl SheetParser for CsvSheetParser {
    fn parse(&self, content: &[u8]) -> anyhow::Result<Vec<Vec<String>>> {
        let text = decode(content);
        let bytes = text.as_bytes();

        // Every line is data, the header row included.
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .trim(if self.trim { csv::Trim::All } else { csv::Trim::None })
            .from_reader(bytes);

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut lines = LineCursor::new(bytes);
        let mut record = StringRecord::new();
        // Line where the next row starts when no blank line precedes it
        let mut next_line = 0;

        loop {
            let start = reader.position().byte() as usize;
            let more = reader
                .read_record(&mut record)
                .map_err(DataError::from)
                .with_context(|| format!("Malformed record {}", rows.len() + 1))?;
            if !more {
                break;
            }
            let end = (reader.position().byte() as usize).min(bytes.len());

            // The reader skips blank lines; they stay in the sheet as empty rows.
            let first = start + bytes[start..end].iter().take_while(|b| is_line_break(b)).count();
            let last = end - bytes[first..end].iter().rev().take_while(|b| is_line_break(b)).count();

            let start_line = lines.line_at(first);
            rows.extend(std::iter::repeat_with(Vec::new).take(start_line.saturating_sub(next_line)));
            rows.push(record.iter().map(|cell| cell.to_string()).collect());

            // A quoted field can span lines, so the record ends on the line of its last byte.
            next_line = lines.line_at(last.saturating_sub(1).max(first)) + 1;
        }

        Ok(rows)
    }
}
