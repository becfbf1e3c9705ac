//! Parsers and the unified row-source contract.
//!
//! Most callers construct a parser directly ([`csv::CsvSource`], [`excel::XlsxSource`]) or go
//! through [`parse_reader`] / [`parse_path`] (from [`unified`]), which:
//!
//! - dispatch on a [`SourceFormat`] (given, or inferred from a file extension)
//! - return the parsed data behind the [`RowSource`] contract
//! - optionally report success/failure/alerts to a [`ParseObserver`]
//!
//! Format-specific parsers live under:
//! - [`csv`]
//! - [`excel`] (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod observability;
pub mod source;
pub mod unified;

pub use observability::{
    CompositeObserver, ParseContext, ParseObserver, ParseStats, Severity, TracingObserver,
};
pub use source::{rows_as_json, RowSource, UNNAMED_SOURCE};
pub use unified::{parse_path, parse_reader, require_row_source, ParseOptions, SourceFormat, SourceInput};
