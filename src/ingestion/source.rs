//! The format-agnostic row source contract.

use std::fmt;
use std::io::{self, Read};

use crate::error::FormatResult;
use crate::types::Row;

/// Label reported by a source that never set one.
pub const UNNAMED_SOURCE: &str = "unnamed";

/// Parsed, immutable tabular data, regardless of the format it came from.
///
/// Implementations parse eagerly at construction; every accessor is a read over data that no
/// longer changes, so a source can be shared across threads behind an `Arc`.
pub trait RowSource: Send + Sync {
    /// The full row sequence. May be empty.
    fn rows(&self) -> &[Row];

    /// Header names in file order, or `None` for sources without a header notion.
    fn column_order(&self) -> Option<&[String]> {
        None
    }

    /// Logical label used in diagnostics.
    fn source_name(&self) -> &str {
        UNNAMED_SOURCE
    }

    /// Post-parse validation hook. The default accepts everything; implementations add domain
    /// checks here and report failures as a [`crate::error::FormatError`].
    fn validate_fields(&self) -> FormatResult<()> {
        Ok(())
    }
}

impl fmt::Debug for dyn RowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RowSource").field(&self.source_name()).finish()
    }
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn rows(&self) -> &[Row] {
        (**self).rows()
    }

    fn column_order(&self) -> Option<&[String]> {
        (**self).column_order()
    }

    fn source_name(&self) -> &str {
        (**self).source_name()
    }

    fn validate_fields(&self) -> FormatResult<()> {
        (**self).validate_fields()
    }
}

/// Drain `reader` into memory. Parsers take the whole input before tokenizing, so the
/// reader is released before they return.
pub(crate) fn read_all<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Render a source's rows as a JSON array of objects, keys in column order.
///
/// This is the data view handed to report rendering: text and formula text become strings,
/// timestamps ISO-8601 strings, and null cells JSON `null`.
pub fn rows_as_json(source: &dyn RowSource) -> serde_json::Value {
    let rows = source
        .rows()
        .iter()
        .map(|row| {
            let object: serde_json::Map<String, serde_json::Value> = row
                .iter()
                .map(|(column, value)| {
                    let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                    (column.to_owned(), json)
                })
                .collect();
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(rows)
}
