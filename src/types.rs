//! Core row model produced by the parsers.
//!
//! A parser yields a [`ColumnOrder`] (trimmed, unique header names in file order) and a
//! sequence of [`Row`]s. Every row shares its parser's column order, so a row's key set is
//! always exactly the column order.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered, unique header names for one source, shared by every row it produced.
pub type ColumnOrder = Arc<[String]>;

/// A single coerced cell value.
///
/// The delimited-text parser only ever produces [`CellValue::Text`]; the spreadsheet parser
/// may produce any variant.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Text value.
    Text(String),
    /// Boolean value.
    Bool(bool),
    /// Plain number.
    Number(f64),
    /// A number stored with a date/time format.
    Timestamp(NaiveDateTime),
    /// The literal formula of a formula cell (not its computed result).
    FormulaText(String),
    /// Missing, blank, error-typed or unrecognized cell.
    Null,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text of a [`CellValue::Text`] or [`CellValue::FormulaText`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::FormulaText(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Timestamp(_) => "timestamp",
            Self::FormulaText(_) => "formula",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::FormulaText(s) => write!(f, "={s}"),
            Self::Null => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One parsed record as an ordered column -> value mapping.
///
/// Values are stored positionally in the same order as the [`ColumnOrder`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: ColumnOrder,
    values: Vec<CellValue>,
}

impl Row {
    /// Build a row from a column order and one value per column.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not hold exactly one value per column.
    pub fn new(columns: ColumnOrder, values: Vec<CellValue>) -> Self {
        assert!(
            values.len() == columns.len(),
            "row has {} values but column order has {} columns",
            values.len(),
            columns.len()
        );
        Self { columns, values }
    }

    /// Value for `column`, if the column exists.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Value at a column position.
    pub fn value_at(&self, idx: usize) -> Option<&CellValue> {
        self.values.get(idx)
    }

    pub fn contains_key(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn columns(names: &[&str]) -> ColumnOrder {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn row_lookup_follows_column_order() {
        let row = Row::new(
            columns(&["Name", "Age"]),
            vec![CellValue::from("Ada"), CellValue::Number(30.0)],
        );
        assert_eq!(row.get("Name"), Some(&CellValue::Text("Ada".to_string())));
        assert_eq!(row.get("Age"), Some(&CellValue::Number(30.0)));
        assert_eq!(row.get("age"), None);
        assert_eq!(row.value_at(1), Some(&CellValue::Number(30.0)));

        let keys: Vec<&str> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Name", "Age"]);
    }

    #[test]
    #[should_panic(expected = "row has 1 values but column order has 2 columns")]
    fn row_rejects_width_mismatch() {
        let _ = Row::new(columns(&["a", "b"]), vec![CellValue::Null]);
    }

    #[test]
    fn row_serializes_as_ordered_map() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let row = Row::new(
            columns(&["z", "a", "when", "gone", "f"]),
            vec![
                CellValue::Bool(true),
                CellValue::Number(1.5),
                CellValue::Timestamp(ts),
                CellValue::Null,
                CellValue::FormulaText("SUM(A1:A2)".to_string()),
            ],
        );
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"z":true,"a":1.5,"when":"2024-03-15T00:00:00","gone":null,"f":"SUM(A1:A2)"}"#
        );
    }

    #[test]
    fn cell_value_helpers() {
        assert!(CellValue::Null.is_null());
        assert_eq!(CellValue::from("x").as_text(), Some("x"));
        assert_eq!(CellValue::FormulaText("A1".into()).as_text(), Some("A1"));
        assert_eq!(CellValue::Bool(false).as_text(), None);
        assert_eq!(CellValue::Number(2.0).type_name(), "number");
        assert_eq!(CellValue::FormulaText("A1*2".into()).to_string(), "=A1*2");
    }
}
