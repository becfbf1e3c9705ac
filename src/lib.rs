//! `tabular-ingest` turns raw byte streams of tabular data into a validated, ordered row model.
//!
//! Two parsers implement one contract, [`ingestion::RowSource`]:
//!
//! - **Delimited text** ([`ingestion::csv::CsvSource`]): UTF-8 (a leading BOM is stripped),
//!   RFC 4180 quoting, every value kept as trimmed text.
//! - **Spreadsheets** ([`ingestion::excel::XlsxSource`], Cargo feature `excel`, on by default):
//!   the first sheet of an `.xlsx` workbook, with cells coerced into typed
//!   [`types::CellValue`]s.
//!
//! Construction *is* parsing: a parser either returns a fully populated source or a single
//! [`FormatError`] naming the first violated rule. There is no partial result.
//!
//! ## Validation rules
//!
//! - Headers are trimmed, must be non-empty and unique (exact, case-sensitive match).
//! - Delimited text: every data row must have one field per header; rows whose fields are all
//!   blank are skipped with a warning.
//! - Spreadsheets: header cells must be text; data cells that are missing, blank or errors
//!   become [`types::CellValue::Null`] without shifting later columns.
//!
//! ## Quick example
//!
//! ```rust
//! use tabular_ingest::ingestion::csv::CsvSource;
//! use tabular_ingest::ingestion::RowSource;
//! use tabular_ingest::types::CellValue;
//!
//! # fn main() -> Result<(), tabular_ingest::FormatError> {
//! let data = "Name, Age ,Score\nAda,30,99\n";
//! let source = CsvSource::from_reader(data.as_bytes(), None)?;
//!
//! assert_eq!(source.source_name(), "CSV");
//! assert_eq!(source.column_order(), Some(&["Name".to_string(), "Age".to_string(), "Score".to_string()][..]));
//! assert_eq!(source.rows()[0].get("Age"), Some(&CellValue::Text("30".to_string())));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error handling
//!
//! ```rust
//! use tabular_ingest::ingestion::csv::CsvSource;
//! use tabular_ingest::ErrorKind;
//!
//! let err = CsvSource::from_reader("A,B,A\n1,2,3\n".as_bytes(), None).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::HeaderDuplicate);
//! assert_eq!(err.code(), "CSV_006");
//! assert_eq!(err.classification().status_code(), 400);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: the row-source contract, parsers and unified entrypoints
//! - [`types`]: row and cell value types
//! - [`error`]: the error taxonomy and [`FormatError`]
//! - [`logging`]: `tracing` subscriber setup

pub mod error;
pub mod ingestion;
pub mod logging;
pub mod types;

pub use error::{Classification, ErrorEntry, ErrorKind, FormatError, FormatResult, Violation};
