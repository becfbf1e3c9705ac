//! Unified parsing entrypoints and the row-source input gate.
//!
//! - [`parse_reader`] parses a byte stream in a known [`SourceFormat`].
//! - [`parse_path`] opens a file and infers the format from its extension unless
//!   [`ParseOptions::format`] forces one.
//! - [`require_row_source`] is the gate a report-rendering collaborator uses to accept only
//!   already-parsed data.
//!
//! When an [`ParseObserver`] is configured, the entrypoints report success, failure and
//! alerts to it.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::{ErrorKind, FormatError, FormatResult, Violation};

use super::csv::{CsvOptions, CsvSource, DEFAULT_CSV_SOURCE};
use super::observability::{ParseContext, ParseObserver, ParseStats, Severity};
use super::source::RowSource;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Delimited text.
    Csv,
    /// Office Open XML workbook (feature-gated behind `excel`).
    Xlsx,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            _ => None,
        }
    }

    /// Label a parser of this format uses when the caller supplies none.
    pub fn default_source_name(self) -> &'static str {
        match self {
            Self::Csv => DEFAULT_CSV_SOURCE,
            Self::Xlsx => "XLSX",
        }
    }

    /// Kind reported when a file of this format cannot be opened.
    fn open_error_kind(self) -> ErrorKind {
        match self {
            Self::Csv => ErrorKind::CsvIo,
            Self::Xlsx => ErrorKind::XlsxParse,
        }
    }
}

/// Options controlling unified parsing behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ParseOptions {
    /// If `None`, [`parse_path`] infers the format from the file extension.
    pub format: Option<SourceFormat>,
    /// Tokenizer settings for delimited text.
    pub csv: CsvOptions,
    /// Optional observer for audit logging and alerts.
    pub observer: Option<Arc<dyn ParseObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("format", &self.format)
            .field("csv", &self.csv)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            format: None,
            csv: CsvOptions::default(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Parse `reader` as `format` and return it behind the [`RowSource`] contract.
///
/// `options.format` is ignored here; the caller names the format explicitly.
///
/// # Examples
///
/// ```rust
/// use tabular_ingest::ingestion::{parse_reader, ParseOptions, RowSource, SourceFormat};
///
/// # fn main() -> Result<(), tabular_ingest::FormatError> {
/// let data = "Name,Age\nAda,36\n";
/// let source = parse_reader(data.as_bytes(), SourceFormat::Csv, Some("people"), &ParseOptions::default())?;
/// assert_eq!(source.source_name(), "people");
/// assert_eq!(source.rows().len(), 1);
/// # Ok(())
/// # }
/// ```
pub fn parse_reader<R: Read>(
    reader: R,
    format: SourceFormat,
    source_name: Option<&str>,
    options: &ParseOptions,
) -> FormatResult<Box<dyn RowSource>> {
    let ctx = ParseContext {
        source_name: source_name
            .unwrap_or(format.default_source_name())
            .to_owned(),
        format,
    };
    let result = dispatch(reader, format, source_name, options);
    report(&ctx, &result, options);
    result
}

/// Open `path` and parse it.
///
/// The file name becomes the source label. A file that cannot be opened is reported as
/// [`ErrorKind::CsvIo`] for delimited text and [`ErrorKind::XlsxParse`] for workbooks; a path
/// whose format cannot be inferred is [`ErrorKind::UnsupportedInputType`].
///
/// ```no_run
/// use tabular_ingest::ingestion::{parse_path, ParseOptions};
///
/// # fn main() -> Result<(), tabular_ingest::FormatError> {
/// let source = parse_path("people.xlsx", &ParseOptions::default())?;
/// println!("rows={}", source.rows().len());
/// # Ok(())
/// # }
/// ```
pub fn parse_path(
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> FormatResult<Box<dyn RowSource>> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };
    let source_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned);

    match File::open(path) {
        Ok(file) => parse_reader(file, format, source_name.as_deref(), options),
        Err(e) => {
            let ctx = ParseContext {
                source_name: source_name
                    .unwrap_or_else(|| format.default_source_name().to_owned()),
                format,
            };
            let result = Err(FormatError::with_cause(format.open_error_kind(), e)
                .logged(&ctx.source_name));
            report(&ctx, &result, options);
            result
        }
    }
}

fn dispatch<R: Read>(
    reader: R,
    format: SourceFormat,
    source_name: Option<&str>,
    options: &ParseOptions,
) -> FormatResult<Box<dyn RowSource>> {
    match format {
        SourceFormat::Csv => Ok(Box::new(CsvSource::with_options(
            reader,
            source_name,
            &options.csv,
        )?)),
        SourceFormat::Xlsx => dispatch_xlsx(reader, source_name),
    }
}

#[cfg(feature = "excel")]
fn dispatch_xlsx<R: Read>(
    reader: R,
    source_name: Option<&str>,
) -> FormatResult<Box<dyn RowSource>> {
    Ok(Box::new(super::excel::XlsxSource::from_reader(
        reader,
        source_name,
    )?))
}

#[cfg(not(feature = "excel"))]
fn dispatch_xlsx<R: Read>(
    reader: R,
    source_name: Option<&str>,
) -> FormatResult<Box<dyn RowSource>> {
    drop(reader);
    Err(FormatError::with_cause(
        ErrorKind::UnsupportedInputType,
        Violation::FormatDisabled("xlsx"),
    )
    .logged(source_name.unwrap_or(SourceFormat::Xlsx.default_source_name())))
}

fn report(ctx: &ParseContext, result: &FormatResult<Box<dyn RowSource>>, options: &ParseOptions) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    match result {
        Ok(source) => obs.on_success(
            ctx,
            ParseStats {
                rows: source.rows().len(),
                columns: source.column_order().map_or(0, <[String]>::len),
            },
        ),
        Err(e) => {
            let severity = Severity::for_error(e);
            obs.on_failure(ctx, severity, e);
            if severity >= options.alert_at_or_above {
                obs.on_alert(ctx, severity, e);
            }
        }
    }
}

fn infer_format_from_path(path: &Path) -> FormatResult<SourceFormat> {
    path.extension()
        .and_then(|s| s.to_str())
        .and_then(SourceFormat::from_extension)
        .ok_or_else(|| {
            FormatError::with_cause(
                ErrorKind::UnsupportedInputType,
                Violation::UnknownExtension(path.display().to_string()),
            )
            .logged(&path.display().to_string())
        })
}

/// What a report-rendering collaborator may be handed.
///
/// Only [`SourceInput::Parsed`] is accepted by [`require_row_source`]; raw bytes and streams
/// must be parsed first.
pub enum SourceInput {
    /// Already-parsed rows.
    Parsed(Box<dyn RowSource>),
    /// Raw, unparsed bytes.
    Bytes(Vec<u8>),
    /// Raw, unparsed stream.
    Stream(Box<dyn Read + Send>),
    /// Anything else, described for diagnostics.
    Other(String),
}

impl SourceInput {
    /// Wrap a parsed source.
    pub fn parsed(source: impl RowSource + 'static) -> Self {
        Self::Parsed(Box::new(source))
    }
}

impl fmt::Debug for SourceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed(source) => f.debug_tuple("Parsed").field(&source.source_name()).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
            Self::Other(desc) => f.debug_tuple("Other").field(desc).finish(),
        }
    }
}

/// Accept only already-parsed input.
///
/// Raw bytes and streams fail with [`ErrorKind::UnsupportedInputType`] so that callers parse
/// explicitly first; anything else fails with [`ErrorKind::Unknown`].
pub fn require_row_source(input: SourceInput) -> FormatResult<Box<dyn RowSource>> {
    match input {
        SourceInput::Parsed(source) => {
            info!(source = %source.source_name(), "accepted row source");
            Ok(source)
        }
        SourceInput::Bytes(_) | SourceInput::Stream(_) => {
            Err(FormatError::new(ErrorKind::UnsupportedInputType).logged("input"))
        }
        SourceInput::Other(desc) => {
            Err(FormatError::unknown(Violation::UnrecognizedInput(desc)).logged("input"))
        }
    }
}
