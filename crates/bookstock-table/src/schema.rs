use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Name of the single table this crate manages.
pub const BOOKS_TABLE: &str = "BOOKS";

/// Human-readable form of the last-shipment date format.
pub const DATE_FORMAT_HINT: &str = "YYYY/MM/DD";

/// `GLOB` pattern enforced by the store on the last-shipment column.
const DATE_GLOB: &str = "[0-9][0-9][0-9][0-9]/[0-9][0-9]/[0-9][0-9]";

/// The nine columns of the `BOOKS` table, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Isbn,
    BookName,
    YearPublished,
    Author,
    Pages,
    CurStock,
    Price,
    AmountSold,
    LastShipReceived,
}

/// Logical column types. Each maps to a SQLite `STRICT` storage type:
/// - `Text` -> TEXT
/// - `Integer` -> INTEGER
/// - `Real` -> REAL
/// - `Date` -> TEXT (shape-checked as `YYYY/MM/DD`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Date,
}

impl ColumnType {
    /// Returns the SQLite type name for this column type.
    pub fn to_sqlite_type(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Date => "TEXT",
        }
    }
}

impl Column {
    /// All columns in declared order.
    pub const ALL: [Column; 9] = [
        Column::Isbn,
        Column::BookName,
        Column::YearPublished,
        Column::Author,
        Column::Pages,
        Column::CurStock,
        Column::Price,
        Column::AmountSold,
        Column::LastShipReceived,
    ];

    /// The column name as stored in the table.
    pub fn name(self) -> &'static str {
        match self {
            Column::Isbn => "ISBN",
            Column::BookName => "BOOK_NAME",
            Column::YearPublished => "YEAR_PUBLISHED",
            Column::Author => "AUTHOR",
            Column::Pages => "PAGES",
            Column::CurStock => "CUR_STOCK",
            Column::Price => "PRICE",
            Column::AmountSold => "AMOUNT_SOLD",
            Column::LastShipReceived => "LAST_SHIP_RECEIVED",
        }
    }

    /// Looks a column up by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    /// Zero-based position in the declared column order.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn col_type(self) -> ColumnType {
        match self {
            Column::Isbn | Column::BookName | Column::Author => ColumnType::Text,
            Column::YearPublished | Column::Pages | Column::CurStock | Column::AmountSold => {
                ColumnType::Integer
            }
            Column::Price => ColumnType::Real,
            Column::LastShipReceived => ColumnType::Date,
        }
    }

    /// Identity and descriptive columns never change once a row exists.
    pub fn is_immutable(self) -> bool {
        matches!(
            self,
            Column::Isbn
                | Column::BookName
                | Column::YearPublished
                | Column::Author
                | Column::Pages
        )
    }

    pub fn is_primary_key(self) -> bool {
        self == Column::Isbn
    }

    /// Only the immutable columns are declared required.
    pub fn nullable(self) -> bool {
        !self.is_immutable()
    }

    /// Canonical text written to the store for this column.
    ///
    /// Prices are rounded to cents, so the stored value is exactly what a grid
    /// shows and what a price filter compares against. Anything that does not
    /// parse is passed through for the store to reject.
    pub fn normalize(self, value: &str) -> Cow<'_, str> {
        match self {
            Column::Price => match value.trim().parse::<f64>() {
                Ok(price) if price.is_finite() => Cow::Owned(format!("{:.2}", price)),
                _ => Cow::Borrowed(value),
            },
            _ => Cow::Borrowed(value),
        }
    }

    /// The `CREATE TABLE` fragment for this column.
    pub(crate) fn definition(self) -> String {
        let mut def = format!("\"{}\" {}", self.name(), self.col_type().to_sqlite_type());
        if self.is_primary_key() {
            def.push_str(" PRIMARY KEY NOT NULL");
        } else if !self.nullable() {
            def.push_str(" NOT NULL");
        }
        if self.col_type() == ColumnType::Date {
            def.push_str(&format!(" CHECK (\"{}\" GLOB '{}')", self.name(), DATE_GLOB));
        }
        def
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `CREATE TABLE` statement for the book table. The table is `STRICT`, so a
/// value that cannot be coerced losslessly to its column type is rejected.
pub(crate) fn create_table_sql() -> String {
    let defs: Vec<String> = Column::ALL.iter().map(|c| c.definition()).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({}) STRICT",
        BOOKS_TABLE,
        defs.join(", ")
    )
}

/// Quoted, comma-separated column list in declared order.
pub(crate) fn column_list() -> String {
    Column::ALL
        .iter()
        .map(|c| format!("\"{}\"", c.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// True when `value` has the digit shape `YYYY/MM/DD`. Calendar validity is
/// not checked here.
pub fn is_date_shaped(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'/',
            _ => b.is_ascii_digit(),
        })
}
