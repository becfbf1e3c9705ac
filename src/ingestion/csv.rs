//! Delimited-text ingestion.
//!
//! [`CsvSource`] reads a whole byte stream as UTF-8 delimited text and validates it:
//!
//! - the first line is the header; every header is trimmed and must be non-empty and unique,
//!   so a blank first line fails with [`ErrorKind::HeaderEmpty`]
//! - every later record must have exactly one field per header
//! - records whose fields are all blank are skipped with a warning
//!
//! Quoting follows RFC 4180: quoted fields may contain the delimiter, the quote character
//! (doubled) and line breaks.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::error::{ErrorKind, FormatError, FormatResult, Violation};
use crate::types::{CellValue, ColumnOrder, Row};

use super::source::{read_all, RowSource};

/// Source label used when the caller supplies none.
pub const DEFAULT_CSV_SOURCE: &str = "CSV";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Tokenizer settings for delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Quote byte.
    pub quote: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

/// Fully parsed delimited-text source.
#[derive(Debug, Clone)]
pub struct CsvSource {
    source_name: String,
    columns: ColumnOrder,
    rows: Vec<Row>,
    skipped_rows: usize,
}

impl CsvSource {
    /// Parse comma-separated text from `reader`.
    ///
    /// The reader is consumed and dropped before this returns, whatever the outcome.
    /// A `None` label falls back to [`DEFAULT_CSV_SOURCE`].
    pub fn from_reader<R: Read>(reader: R, source_name: Option<&str>) -> FormatResult<Self> {
        Self::with_options(reader, source_name, &CsvOptions::default())
    }

    /// Parse delimited text from `reader` using explicit tokenizer settings.
    pub fn with_options<R: Read>(
        reader: R,
        source_name: Option<&str>,
        options: &CsvOptions,
    ) -> FormatResult<Self> {
        let source_name = source_name.unwrap_or(DEFAULT_CSV_SOURCE).to_owned();
        info!(source = %source_name, "parsing delimited text");

        let bytes = read_all(reader)
            .map_err(|e| FormatError::with_cause(ErrorKind::CsvIo, e).logged(&source_name))?;

        let parsed = parse(&source_name, strip_bom(&bytes), options)
            .map_err(|e| e.logged(&source_name))?;

        info!(
            source = %source_name,
            rows = parsed.rows.len(),
            columns = parsed.columns.len(),
            skipped = parsed.skipped_rows,
            "parsed delimited text"
        );
        Ok(Self {
            source_name,
            columns: parsed.columns,
            rows: parsed.rows,
            skipped_rows: parsed.skipped_rows,
        })
    }

    /// Open and parse a file. A file that cannot be opened is reported as [`ErrorKind::CsvIo`].
    pub fn from_path(path: impl AsRef<Path>, source_name: Option<&str>) -> FormatResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            FormatError::with_cause(ErrorKind::CsvIo, e)
                .logged(source_name.unwrap_or(DEFAULT_CSV_SOURCE))
        })?;
        Self::from_reader(file, source_name)
    }

    /// Number of blank records dropped while parsing.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

impl RowSource for CsvSource {
    fn rows(&self) -> &[Row] {
        &self.rows
    }

    fn column_order(&self) -> Option<&[String]> {
        Some(&self.columns)
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }
}

struct Parsed {
    columns: ColumnOrder,
    rows: Vec<Row>,
    skipped_rows: usize,
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

fn parse(source: &str, input: &[u8], options: &CsvOptions) -> FormatResult<Parsed> {
    // The tokenizer skips empty lines; a blank first line is still the header record.
    if matches!(input.first(), Some(b'\n' | b'\r')) {
        return Err(FormatError::with_cause(
            ErrorKind::HeaderEmpty,
            Violation::BlankHeader { index: 0 },
        ));
    }

    if let Some(line) = find_unterminated_quote(input, options) {
        return Err(FormatError::with_cause(
            ErrorKind::CsvParse,
            Violation::UnterminatedQuote { line },
        ));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .quote(options.quote)
        .from_reader(input);

    let mut record = StringRecord::new();
    if !rdr.read_record(&mut record).map_err(csv_error)? || record.is_empty() {
        return Err(FormatError::new(ErrorKind::HeaderMissing));
    }
    let columns = extract_headers(&record)?;
    debug!(source = %source, headers = ?columns, "extracted headers");

    let mut rows = Vec::new();
    let mut skipped_rows = 0;
    let mut next_line: u64 = 2;
    while rdr.read_record(&mut record).map_err(csv_error)? {
        let line = record
            .position()
            .map_or(next_line, |pos| record_line(input, pos));
        next_line = line + 1;

        if record.iter().all(|field| field.trim().is_empty()) {
            warn!(source = %source, line, "skipping blank row");
            skipped_rows += 1;
            continue;
        }

        if record.len() != columns.len() {
            return Err(FormatError::with_cause(
                ErrorKind::RowColumnMismatch,
                Violation::RowWidth {
                    line,
                    expected: columns.len(),
                    actual: record.len(),
                },
            ));
        }

        let values = record
            .iter()
            .map(|field| CellValue::Text(field.trim().to_owned()))
            .collect();
        rows.push(Row::new(columns.clone(), values));
    }

    Ok(Parsed {
        columns,
        rows,
        skipped_rows,
    })
}

/// Physical line on which a record's content starts.
///
/// The reader positions a record where the previous one ended, so skipped empty lines (and the
/// `\n` of a CRLF pair) still lie ahead of it; count them in.
fn record_line(input: &[u8], pos: &csv::Position) -> u64 {
    let start = usize::try_from(pos.byte()).unwrap_or(usize::MAX);
    let skipped = input
        .get(start..)
        .unwrap_or_default()
        .iter()
        .take_while(|&&b| b == b'\n' || b == b'\r')
        .filter(|&&b| b == b'\n')
        .count();
    pos.line() + skipped as u64
}

fn extract_headers(record: &StringRecord) -> FormatResult<ColumnOrder> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(record.len());
    let mut columns = Vec::with_capacity(record.len());
    for (index, raw) in record.iter().enumerate() {
        let header = raw.trim();
        if header.is_empty() {
            return Err(FormatError::with_cause(
                ErrorKind::HeaderEmpty,
                Violation::BlankHeader { index },
            ));
        }
        if !seen.insert(header) {
            return Err(FormatError::with_cause(
                ErrorKind::HeaderDuplicate,
                Violation::DuplicateHeader {
                    index,
                    header: header.to_owned(),
                },
            ));
        }
        columns.push(header.to_owned());
    }
    Ok(columns.into())
}

fn csv_error(err: csv::Error) -> FormatError {
    let kind = match err.kind() {
        csv::ErrorKind::Io(_) => ErrorKind::CsvIo,
        _ => ErrorKind::CsvParse,
    };
    FormatError::with_cause(kind, err)
}

/// Returns the line on which a quoted field opens without ever closing.
///
/// A quote only opens a quoted field at the start of a field; elsewhere it is literal text.
fn find_unterminated_quote(input: &[u8], options: &CsvOptions) -> Option<u64> {
    let mut line: u64 = 1;
    let mut at_field_start = true;
    let mut open_since: Option<u64> = None;
    let mut i = 0;
    while i < input.len() {
        let b = input[i];
        if open_since.is_some() {
            if b == options.quote {
                if input.get(i + 1) == Some(&options.quote) {
                    i += 1;
                } else {
                    open_since = None;
                }
            } else if b == b'\n' {
                line += 1;
            }
        } else if b == options.quote && at_field_start {
            open_since = Some(line);
            at_field_start = false;
        } else if b == options.delimiter || b == b'\r' {
            at_field_start = true;
        } else if b == b'\n' {
            line += 1;
            at_field_start = true;
        } else {
            at_field_start = false;
        }
        i += 1;
    }
    open_since
}
