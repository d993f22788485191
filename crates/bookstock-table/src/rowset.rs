use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::Column;

/// One stored value, as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    pub(crate) fn from_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(n) => CellValue::Integer(n),
            ValueRef::Real(f) => CellValue::Real(f),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => CellValue::Text(format!("<blob {} bytes>", b.len())),
        }
    }

    /// Display string for a grid cell, or `None` when the value is absent.
    /// Reals are rendered with two decimals, matching the price column's scale.
    pub fn display(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Integer(n) => Some(n.to_string()),
            CellValue::Real(f) => Some(format!("{:.2}", f)),
            CellValue::Text(s) => Some(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// An ordered, positionally addressable query result plus its column names.
///
/// A `RowSet` is a snapshot: refreshing means replacing it wholesale with the
/// result of a new query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    /// Column names in declared order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Position of a column by name (ASCII case-insensitive).
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Display string of `column` in `row`, if both exist and the value is set.
    pub fn text(&self, row: usize, column: Column) -> Option<String> {
        self.position_of(column.name())
            .and_then(|col| self.cell(row, col))
            .and_then(CellValue::display)
    }

    /// Index of the first row whose ISBN equals `isbn`, scanning in order.
    pub fn find_isbn(&self, isbn: &str) -> Option<usize> {
        let col = self.position_of(Column::Isbn.name())?;
        self.rows.iter().position(|row| {
            matches!(row.get(col), Some(CellValue::Text(value)) if value == isbn)
        })
    }

    /// Replaces one row in place. Returns `false` when `index` is out of range.
    pub fn replace_row(&mut self, index: usize, row: Vec<CellValue>) -> bool {
        match self.rows.get_mut(index) {
            Some(slot) => {
                *slot = row;
                true
            }
            None => false,
        }
    }

    /// Renders every row as a JSON object keyed by column name.
    pub fn to_json(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut map = Map::new();
                for (name, cell) in self.columns.iter().zip(row) {
                    let value = serde_json::to_value(cell).unwrap_or(Value::Null);
                    map.insert(name.clone(), value);
                }
                Value::Object(map)
            })
            .collect()
    }
}
