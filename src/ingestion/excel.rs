#![cfg(feature = "excel")]

//! Spreadsheet (XLSX) ingestion.
//!
//! Only the first sheet is read. Its first populated row is the header row; every header cell
//! up to the last populated column must be non-blank, unique text. Later rows are read up to
//! the last row holding any content, and each cell is coerced into a [`CellValue`].
//!
//! A row with no stored value or formula inside the sheet's used area produces no [`Row`],
//! even when the workbook keeps formatting for it. Rows with at least one value keep a
//! [`CellValue::Null`] for each missing cell.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{Data, DataType, Range, Reader, Xlsx, XlsxError};
use tracing::{debug, info, trace};

use crate::error::{ErrorKind, FormatError, FormatResult, Violation};
use crate::types::{CellValue, ColumnOrder, Row};

use super::source::{read_all, RowSource};

/// Source label used when the caller supplies none.
pub const DEFAULT_XLSX_SOURCE: &str = "XLSX";

/// Fully parsed first sheet of an XLSX workbook.
#[derive(Debug, Clone)]
pub struct XlsxSource {
    source_name: String,
    sheet_name: String,
    columns: ColumnOrder,
    rows: Vec<Row>,
}

impl XlsxSource {
    /// Parse the first sheet of the workbook held in `reader`.
    ///
    /// The reader is consumed and dropped before this returns, whatever the outcome.
    /// A `None` label falls back to [`DEFAULT_XLSX_SOURCE`].
    pub fn from_reader<R: Read>(reader: R, source_name: Option<&str>) -> FormatResult<Self> {
        let source_name = source_name.unwrap_or(DEFAULT_XLSX_SOURCE).to_owned();
        info!(source = %source_name, "parsing workbook");

        let parsed = read_all(reader)
            .map_err(|e| FormatError::with_cause(ErrorKind::XlsxParse, e))
            .and_then(|bytes| parse_workbook(&source_name, bytes))
            .map_err(|e| e.logged(&source_name))?;

        info!(
            source = %source_name,
            sheet = %parsed.sheet_name,
            rows = parsed.rows.len(),
            columns = parsed.columns.len(),
            "parsed workbook"
        );
        Ok(Self {
            source_name,
            sheet_name: parsed.sheet_name,
            columns: parsed.columns,
            rows: parsed.rows,
        })
    }

    /// Open and parse a workbook file. A file that cannot be opened is reported as
    /// [`ErrorKind::XlsxParse`].
    pub fn from_path(path: impl AsRef<Path>, source_name: Option<&str>) -> FormatResult<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            FormatError::with_cause(ErrorKind::XlsxParse, e)
                .logged(source_name.unwrap_or(DEFAULT_XLSX_SOURCE))
        })?;
        Self::from_reader(file, source_name)
    }

    /// Name of the sheet that was read.
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }
}

impl RowSource for XlsxSource {
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
    sheet_name: String,
    columns: ColumnOrder,
    rows: Vec<Row>,
}

fn xlsx_error(err: XlsxError) -> FormatError {
    FormatError::with_cause(ErrorKind::XlsxParse, err)
}

fn parse_workbook(source: &str, bytes: Vec<u8>) -> FormatResult<Parsed> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(xlsx_error)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| FormatError::with_cause(ErrorKind::XlsxParse, Violation::NoSheets))?;
    let cells = workbook.worksheet_range(&sheet_name).map_err(xlsx_error)?;
    let formulas = workbook.worksheet_formula(&sheet_name).map_err(xlsx_error)?;

    let sheet = Sheet {
        name: &sheet_name,
        cells: &cells,
        formulas: &formulas,
    };
    let (header_row, columns) = sheet.extract_headers()?;
    debug!(source = %source, sheet = %sheet_name, headers = ?columns, "extracted headers");

    let rows = sheet.extract_rows(source, header_row, &columns);
    Ok(Parsed {
        sheet_name,
        columns,
        rows,
    })
}

/// Cached values and formulas of one worksheet, addressed by absolute (row, column).
struct Sheet<'a> {
    name: &'a str,
    cells: &'a Range<Data>,
    formulas: &'a Range<String>,
}

impl Sheet<'_> {
    fn cell(&self, row: u32, col: u32) -> Option<&Data> {
        self.cells
            .get_value((row, col))
            .filter(|c| !matches!(c, Data::Empty))
    }

    fn formula(&self, row: u32, col: u32) -> Option<&str> {
        self.formulas
            .get_value((row, col))
            .map(String::as_str)
            .filter(|f| !f.is_empty())
    }

    fn has_content(&self, row: u32, col: u32) -> bool {
        self.cell(row, col).is_some() || self.formula(row, col).is_some()
    }

    fn missing_headers(&self) -> FormatError {
        FormatError::with_cause(
            ErrorKind::MissingHeaders,
            Violation::EmptySheet {
                sheet: self.name.to_owned(),
            },
        )
    }

    /// Top-left and bottom-right corners covering both stored values and formulas.
    fn bounds(&self) -> Option<((u32, u32), (u32, u32))> {
        let values = self.cells.start().zip(self.cells.end());
        let formulas = self.formulas.start().zip(self.formulas.end());
        match (values, formulas) {
            (Some((vs, ve)), Some((fs, fe))) => Some((
                (vs.0.min(fs.0), vs.1.min(fs.1)),
                (ve.0.max(fe.0), ve.1.max(fe.1)),
            )),
            (Some(b), None) | (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Returns the header row index and the validated column order.
    fn extract_headers(&self) -> FormatResult<(u32, ColumnOrder)> {
        let ((start_row, _), (end_row, end_col)) =
            self.bounds().ok_or_else(|| self.missing_headers())?;
        let header_row = (start_row..=end_row)
            .find(|&row| (0..=end_col).any(|col| self.has_content(row, col)))
            .ok_or_else(|| self.missing_headers())?;
        let last_col = (0..=end_col)
            .rev()
            .find(|&col| self.has_content(header_row, col))
            .ok_or_else(|| self.missing_headers())?;

        let mut columns: Vec<String> = Vec::with_capacity(last_col as usize + 1);
        for col in 0..=last_col {
            let index = col as usize;
            let text = match (self.cell(header_row, col), self.formula(header_row, col)) {
                (Some(Data::String(s)), None) => s,
                (_, Some(_)) => {
                    return Err(FormatError::with_cause(
                        ErrorKind::InvalidHeaderType,
                        Violation::HeaderNotText {
                            index,
                            found: "formula",
                        },
                    ));
                }
                (other, None) => {
                    return Err(FormatError::with_cause(
                        ErrorKind::InvalidHeaderType,
                        Violation::HeaderNotText {
                            index,
                            found: cell_type_name(other),
                        },
                    ));
                }
            };

            let header = text.trim();
            if header.is_empty() {
                return Err(FormatError::with_cause(
                    ErrorKind::NullHeader,
                    Violation::BlankHeader { index },
                ));
            }
            if columns.iter().any(|c| c == header) {
                return Err(FormatError::with_cause(
                    ErrorKind::DuplicateHeader,
                    Violation::DuplicateHeader {
                        index,
                        header: header.to_owned(),
                    },
                ));
            }
            columns.push(header.to_owned());
        }
        Ok((header_row, columns.into()))
    }

    fn extract_rows(&self, source: &str, header_row: u32, columns: &ColumnOrder) -> Vec<Row> {
        let Some((_, (end_row, end_col))) = self.bounds() else {
            return Vec::new();
        };

        let mut rows = Vec::new();
        for row in header_row + 1..=end_row {
            if !(0..=end_col).any(|col| self.has_content(row, col)) {
                trace!(source = %source, row = row + 1, "no stored cells in row");
                continue;
            }
            let values = (0..columns.len() as u32)
                .map(|col| coerce(self.cell(row, col), self.formula(row, col)))
                .collect();
            rows.push(Row::new(columns.clone(), values));
            trace!(source = %source, row = row + 1, "processed row");
        }
        rows
    }
}

/// Coerce one stored cell into a [`CellValue`].
///
/// A formula wins over its cached result. Date-formatted numbers become timestamps, plain
/// numbers stay numbers, and blank, error or unrecognized cells become null.
fn coerce(cell: Option<&Data>, formula: Option<&str>) -> CellValue {
    if let Some(formula) = formula {
        return CellValue::FormulaText(formula.to_owned());
    }
    let Some(cell) = cell else {
        return CellValue::Null;
    };
    match cell {
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or(CellValue::Number(dt.as_f64()), CellValue::Timestamp),
        Data::DateTimeIso(_) => cell.as_datetime().map_or(CellValue::Null, CellValue::Timestamp),
        Data::DurationIso(_) | Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

fn cell_type_name(cell: Option<&Data>) -> &'static str {
    match cell {
        None | Some(Data::Empty) => "blank",
        Some(Data::String(_)) => "text",
        Some(Data::Int(_)) | Some(Data::Float(_)) => "number",
        Some(Data::Bool(_)) => "bool",
        Some(Data::DateTime(_)) | Some(Data::DateTimeIso(_)) => "date",
        Some(Data::DurationIso(_)) => "duration",
        Some(Data::Error(_)) => "error",
    }
}
