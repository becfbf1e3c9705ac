//! Error taxonomy and the [`FormatError`] type returned by every parser.
//!
//! Every failed parse yields exactly one [`FormatError`], which identifies one entry of a fixed,
//! process-wide taxonomy ([`ErrorKind::entry`]). Callers key behavior off [`FormatError::kind`]
//! or [`FormatError::code`]; the optional underlying cause is carried for diagnostics only.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Convenience result type for parsing operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Boxed underlying cause attached to a [`FormatError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Status category used when a failure is reported to an external caller.
///
/// The variants follow HTTP status semantics so that a service wrapping this crate can map a
/// parse failure straight onto a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// 204: the input held nothing to read.
    NoContent,
    /// 206: the input was readable but incomplete.
    PartialContent,
    /// 400: the input is malformed.
    BadRequest,
    /// 406: the input is well formed but structurally unacceptable.
    NotAcceptable,
    /// 415: the input is of a kind this layer does not accept.
    UnsupportedMediaType,
    /// 422: the input could not be read.
    UnprocessableEntity,
    /// 500: an unclassified failure.
    InternalServerError,
}

impl Classification {
    /// Numeric status code for this classification.
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NoContent => 204,
            Self::PartialContent => 206,
            Self::BadRequest => 400,
            Self::NotAcceptable => 406,
            Self::UnsupportedMediaType => 415,
            Self::UnprocessableEntity => 422,
            Self::InternalServerError => 500,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status_code())
    }
}

/// Closed set of failure conditions.
///
/// The discriminant order matches the static taxonomy table; see [`ErrorKind::entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Tokenizer-level failure while reading delimited text (malformed quoting, bad UTF-8).
    CsvParse,
    /// The delimited-text stream could not be read.
    CsvIo,
    /// A data row's field count disagrees with the header.
    RowColumnMismatch,
    /// The delimited-text stream holds no header record.
    HeaderMissing,
    /// A delimited-text header field is blank after trimming.
    HeaderEmpty,
    /// A delimited-text header field repeats an earlier one after trimming.
    HeaderDuplicate,
    /// The workbook could not be opened or read.
    XlsxParse,
    /// The first sheet has no header row.
    MissingHeaders,
    /// A spreadsheet header cell is blank after trimming.
    NullHeader,
    /// A spreadsheet header cell repeats an earlier one after trimming.
    DuplicateHeader,
    /// A spreadsheet header cell is absent or not text.
    InvalidHeaderType,
    /// Raw bytes or streams were supplied where a parsed row source is required.
    UnsupportedInputType,
    /// Catch-all for unclassified failures; always carries a cause.
    Unknown,
}

impl ErrorKind {
    /// Every kind, in taxonomy order.
    pub const ALL: [ErrorKind; 13] = [
        ErrorKind::CsvParse,
        ErrorKind::CsvIo,
        ErrorKind::RowColumnMismatch,
        ErrorKind::HeaderMissing,
        ErrorKind::HeaderEmpty,
        ErrorKind::HeaderDuplicate,
        ErrorKind::XlsxParse,
        ErrorKind::MissingHeaders,
        ErrorKind::NullHeader,
        ErrorKind::DuplicateHeader,
        ErrorKind::InvalidHeaderType,
        ErrorKind::UnsupportedInputType,
        ErrorKind::Unknown,
    ];

    /// The taxonomy entry describing this kind.
    pub fn entry(self) -> &'static ErrorEntry {
        &TAXONOMY[self as usize]
    }

    /// Stable machine-readable code, e.g. `CSV_003`.
    pub fn code(self) -> &'static str {
        self.entry().code
    }

    /// Human-readable description.
    pub fn message(self) -> &'static str {
        self.entry().message
    }

    /// Status category used for external reporting.
    pub fn classification(self) -> Classification {
        self.entry().classification
    }
}

/// One row of the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEntry {
    /// Kind this entry describes.
    pub kind: ErrorKind,
    /// Stable identifier.
    pub code: &'static str,
    /// Human-readable description.
    pub message: &'static str,
    /// Status category.
    pub classification: Classification,
}

const fn entry(
    kind: ErrorKind,
    code: &'static str,
    message: &'static str,
    classification: Classification,
) -> ErrorEntry {
    ErrorEntry {
        kind,
        code,
        message,
        classification,
    }
}

static TAXONOMY: [ErrorEntry; 13] = [
    entry(
        ErrorKind::CsvParse,
        "CSV_001",
        "Failed to parse CSV file",
        Classification::BadRequest,
    ),
    entry(
        ErrorKind::CsvIo,
        "CSV_002",
        "Failed to read CSV input",
        Classification::UnprocessableEntity,
    ),
    entry(
        ErrorKind::RowColumnMismatch,
        "CSV_003",
        "Issue with Row Column Mismatch",
        Classification::NotAcceptable,
    ),
    entry(
        ErrorKind::HeaderMissing,
        "CSV_004",
        "CSV header is missing or null",
        Classification::BadRequest,
    ),
    entry(
        ErrorKind::HeaderEmpty,
        "CSV_005",
        "CSV header does not contain any valid columns",
        Classification::BadRequest,
    ),
    entry(
        ErrorKind::HeaderDuplicate,
        "CSV_006",
        "CSV header contains duplicate columns",
        Classification::BadRequest,
    ),
    entry(
        ErrorKind::XlsxParse,
        "XLSX_001",
        "Failed to read Excel file",
        Classification::BadRequest,
    ),
    entry(
        ErrorKind::MissingHeaders,
        "XLSX_002",
        "XLSX file is empty.",
        Classification::NoContent,
    ),
    entry(
        ErrorKind::NullHeader,
        "XLSX_003",
        "Found blank or null header.",
        Classification::PartialContent,
    ),
    entry(
        ErrorKind::DuplicateHeader,
        "XLSX_004",
        "Duplicate header Found.",
        Classification::NotAcceptable,
    ),
    entry(
        ErrorKind::InvalidHeaderType,
        "XLSX_005",
        "Invalid Header Found.",
        Classification::NotAcceptable,
    ),
    entry(
        ErrorKind::UnsupportedInputType,
        "BYTE_001",
        "Unsupported byte stream format",
        Classification::UnsupportedMediaType,
    ),
    entry(
        ErrorKind::Unknown,
        "GEN_001",
        "An unexpected error occurred",
        Classification::InternalServerError,
    ),
];

/// Which structural rule a parser found violated.
///
/// Parsers attach a `Violation` as the cause of a [`FormatError`]; it carries the position
/// details (line, column index, offending header) that the taxonomy entry does not.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// `line` is the 1-based physical line on which the record starts. Blank lines and the
    /// extra lines of multi-line quoted fields before it are counted.
    #[error("line {line} has {actual} columns, expected {expected}")]
    RowWidth {
        line: u64,
        expected: usize,
        actual: usize,
    },

    #[error("header at column {index} is blank")]
    BlankHeader { index: usize },

    #[error("duplicate header '{header}' at column {index}")]
    DuplicateHeader { index: usize, header: String },

    #[error("header at column {index} must be text, found {found}")]
    HeaderNotText { index: usize, found: &'static str },

    #[error("sheet '{sheet}' is empty")]
    EmptySheet { sheet: String },

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("unterminated quoted field starting at line {line}")]
    UnterminatedQuote { line: u64 },

    #[error("unrecognized input: {0}")]
    UnrecognizedInput(String),

    #[error("cannot infer source format from '{0}'")]
    UnknownExtension(String),

    #[error("{0} support is not enabled in this build")]
    FormatDisabled(&'static str),
}

/// A parse failure: one taxonomy entry plus an optional underlying cause.
#[derive(Debug, Error)]
pub struct FormatError {
    kind: ErrorKind,
    #[source]
    cause: Option<BoxError>,
}

impl FormatError {
    /// Create an error with no underlying cause.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, cause: None }
    }

    /// Create an error wrapping `cause`.
    pub fn with_cause(kind: ErrorKind, cause: impl Into<BoxError>) -> Self {
        Self {
            kind,
            cause: Some(cause.into()),
        }
    }

    /// Create an [`ErrorKind::Unknown`] error. Unclassified failures always carry their cause.
    pub fn unknown(cause: impl Into<BoxError>) -> Self {
        Self::with_cause(ErrorKind::Unknown, cause)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn entry(&self) -> &'static ErrorEntry {
        self.kind.entry()
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn classification(&self) -> Classification {
        self.kind.classification()
    }

    /// The underlying cause, if any.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// The structural violation behind this error, when the cause is one.
    pub fn violation(&self) -> Option<&Violation> {
        self.cause.as_deref()?.downcast_ref::<Violation>()
    }

    /// Emit this error through `tracing` and hand it back, so raise sites can
    /// `return Err(FormatError::new(..).logged(source))`.
    pub(crate) fn logged(self, source: &str) -> Self {
        match self.cause.as_deref() {
            Some(cause) => tracing::error!(
                source = %source,
                code = self.code(),
                status = %self.classification(),
                cause = %cause,
                "{}",
                self.kind.message()
            ),
            None => tracing::error!(
                source = %source,
                code = self.code(),
                status = %self.classification(),
                "{}",
                self.kind.message()
            ),
        }
        self
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.kind.message())?;
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn taxonomy_table_is_indexed_by_kind() {
        for (idx, kind) in ErrorKind::ALL.iter().enumerate() {
            assert_eq!(TAXONOMY[idx].kind, *kind, "table out of order at {idx}");
            assert_eq!(kind.entry().kind, *kind);
        }
    }

    #[test]
    fn taxonomy_codes_are_unique() {
        let codes: HashSet<&str> = ErrorKind::ALL.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn taxonomy_messages_are_stable() {
        assert_eq!(ErrorKind::RowColumnMismatch.message(), "Issue with Row Column Mismatch");
        assert_eq!(
            ErrorKind::HeaderEmpty.message(),
            "CSV header does not contain any valid columns"
        );
        assert_eq!(ErrorKind::MissingHeaders.message(), "XLSX file is empty.");
        assert_eq!(ErrorKind::InvalidHeaderType.message(), "Invalid Header Found.");
        assert_eq!(
            ErrorKind::UnsupportedInputType.message(),
            "Unsupported byte stream format"
        );
    }

    #[test]
    fn classification_status_codes() {
        assert_eq!(ErrorKind::RowColumnMismatch.classification().status_code(), 406);
        assert_eq!(ErrorKind::MissingHeaders.classification().status_code(), 204);
        assert_eq!(ErrorKind::UnsupportedInputType.classification().status_code(), 415);
        assert_eq!(ErrorKind::Unknown.classification().status_code(), 500);
    }

    #[test]
    fn display_includes_code_and_cause() {
        let err = FormatError::with_cause(
            ErrorKind::RowColumnMismatch,
            Violation::RowWidth {
                line: 3,
                expected: 3,
                actual: 2,
            },
        );
        let msg = err.to_string();
        assert!(msg.starts_with("[CSV_003]"));
        assert!(msg.contains("line 3 has 2 columns, expected 3"));
        assert!(err.source().is_some());
    }

    #[test]
    fn violation_is_recoverable_from_cause() {
        let err = FormatError::with_cause(ErrorKind::NullHeader, Violation::BlankHeader { index: 2 });
        assert_eq!(err.violation(), Some(&Violation::BlankHeader { index: 2 }));

        let io = std::io::Error::other("boom");
        let err = FormatError::with_cause(ErrorKind::CsvIo, io);
        assert!(err.violation().is_none());
        assert!(err.cause().is_some());
    }

    #[test]
    fn unknown_always_wraps_a_cause() {
        let err = FormatError::unknown("something odd");
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.code(), "GEN_001");
        assert!(err.cause().is_some());
        assert!(err.to_string().contains("something odd"));
    }

    #[test]
    fn error_without_cause_renders_message_only() {
        let err = FormatError::new(ErrorKind::HeaderMissing);
        assert_eq!(err.to_string(), "[CSV_004] CSV header is missing or null");
        assert!(err.source().is_none());
    }
}
