//! Structured filters over the book table.
//!
//! A [`Filter`] is turned into a SQL predicate over [`Column`] names plus a
//! list of bound values; caller text is never spliced into the statement.
//!
//! Comparison semantics:
//! - ISBN, title and author are exact matches.
//! - Year `before` / `after` are inclusive of the given year; `during` is equality.
//! - Pages and price `lesser` / `greater` are inclusive of the given value.
//! - Stock `in` means `CUR_STOCK > 0`, `out` means `CUR_STOCK = 0`.

use std::str::FromStr;

use bookstock_table::{Column, RowSet};
use rusqlite::types::{ToSql, Value};
use tracing::{debug, error, instrument};

use crate::error::{InventoryError, ValidationError};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearMode {
    Before,
    During,
    After,
}

impl FromStr for YearMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(YearMode::Before),
            "during" => Ok(YearMode::During),
            "after" => Ok(YearMode::After),
            _ => Err(ValidationError::UnknownMode {
                filter: "year",
                mode: s.to_string(),
                expected: "before, during, after",
            }),
        }
    }
}

/// Inclusive bound direction for page-count and price filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lesser,
    Greater,
}

impl Bound {
    fn parse(s: &str, filter: &'static str) -> Result<Self, ValidationError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lesser" => Ok(Bound::Lesser),
            "greater" => Ok(Bound::Greater),
            _ => Err(ValidationError::UnknownMode {
                filter,
                mode: s.to_string(),
                expected: "lesser, greater",
            }),
        }
    }

    fn operator(self) -> &'static str {
        match self {
            Bound::Lesser => "<=",
            Bound::Greater => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockState {
    In,
    Out,
}

impl FromStr for StockState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(StockState::In),
            "out" => Ok(StockState::Out),
            _ => Err(ValidationError::UnknownMode {
                filter: "stock",
                mode: s.to_string(),
                expected: "in, out",
            }),
        }
    }
}

/// A request for a subset of the table.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// The entire table.
    All,
    Isbn(String),
    Title(String),
    Author(String),
    Year { year: i64, mode: YearMode },
    Pages { count: i64, mode: Bound },
    Price { price: f64, mode: Bound },
    Stock(StockState),
}

impl Filter {
    /// Builds a filter from caller-supplied strings.
    ///
    /// `kind` is one of `all`, `isbn`, `title`, `author`, `year`, `pages`,
    /// `price`, `stock`. Range filters need `mode`; a missing mode is an error,
    /// not an unfiltered query. For `stock`, the state is taken from `mode`
    /// when given and from `value` otherwise.
    pub fn parse(kind: &str, value: &str, mode: Option<&str>) -> Result<Self, ValidationError> {
        let mode_or_missing = |filter: &'static str, expected: &'static str| {
            mode.ok_or_else(|| ValidationError::UnknownMode {
                filter,
                mode: String::new(),
                expected,
            })
        };

        match kind.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "isbn" => Ok(Filter::Isbn(value.to_string())),
            "title" | "name" => Ok(Filter::Title(value.to_string())),
            "author" => Ok(Filter::Author(value.to_string())),
            "year" => Ok(Filter::Year {
                year: parse_number(Column::YearPublished, value)?,
                mode: mode_or_missing("year", "before, during, after")?.parse()?,
            }),
            "pages" => Ok(Filter::Pages {
                count: parse_number(Column::Pages, value)?,
                mode: Bound::parse(mode_or_missing("pages", "lesser, greater")?, "pages")?,
            }),
            "price" => Ok(Filter::Price {
                price: parse_number(Column::Price, value)?,
                mode: Bound::parse(mode_or_missing("price", "lesser, greater")?, "price")?,
            }),
            "stock" => Ok(Filter::Stock(mode.unwrap_or(value).parse()?)),
            other => Err(ValidationError::UnknownMode {
                filter: "filter",
                mode: other.to_string(),
                expected: "all, isbn, title, author, year, pages, price, stock",
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Isbn(_) => "isbn",
            Filter::Title(_) => "title",
            Filter::Author(_) => "author",
            Filter::Year { .. } => "year",
            Filter::Pages { .. } => "pages",
            Filter::Price { .. } => "price",
            Filter::Stock(_) => "stock",
        }
    }

    /// The `WHERE` predicate and its bound values, or `None` for [`Filter::All`].
    pub fn to_clause(&self) -> Option<(String, Vec<Value>)> {
        let compare = |column: Column, op: &str, value: Value| {
            (format!("\"{}\" {} ?1", column.name(), op), vec![value])
        };

        let clause = match self {
            Filter::All => return None,
            Filter::Isbn(isbn) => compare(Column::Isbn, "=", Value::Text(isbn.clone())),
            Filter::Title(title) => compare(Column::BookName, "=", Value::Text(title.clone())),
            Filter::Author(author) => compare(Column::Author, "=", Value::Text(author.clone())),
            Filter::Year { year, mode } => {
                let op = match mode {
                    YearMode::Before => "<=",
                    YearMode::During => "=",
                    YearMode::After => ">=",
                };
                compare(Column::YearPublished, op, Value::Integer(*year))
            }
            Filter::Pages { count, mode } => {
                compare(Column::Pages, mode.operator(), Value::Integer(*count))
            }
            Filter::Price { price, mode } => {
                compare(Column::Price, mode.operator(), Value::Real(*price))
            }
            Filter::Stock(StockState::In) => (format!("\"{}\" > 0", Column::CurStock.name()), vec![]),
            Filter::Stock(StockState::Out) => (format!("\"{}\" = 0", Column::CurStock.name()), vec![]),
        };
        Some(clause)
    }
}

fn parse_number<T: FromStr>(column: Column, value: &str) -> Result<T, ValidationError> {
    value.trim().parse().map_err(|_| ValidationError::TypeMismatch {
        column: column.name().to_string(),
        value: value.to_string(),
    })
}

/// Runs filters against a session's store.
pub struct FilterBuilder<'a> {
    session: &'a Session,
}

impl<'a> FilterBuilder<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Returns the rows matching `filter`.
    ///
    /// Store failures are logged and reported as [`InventoryError::QueryFailed`].
    #[instrument(skip_all, fields(filter = filter.kind()))]
    pub fn apply(&self, filter: &Filter) -> Result<RowSet, InventoryError> {
        let clause = filter.to_clause();
        let result = self.session.with_store(|store| match &clause {
            Some((sql, values)) => {
                let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
                store.select(Some(sql.as_str()), &params)
            }
            None => store.select_all(),
        })?;

        match result {
            Ok(rows) => {
                debug!(rows = rows.row_count(), "filter applied");
                Ok(rows)
            }
            Err(e) => {
                error!(error = %e, "filter query failed");
                Err(InventoryError::QueryFailed(e))
            }
        }
    }

    /// Parses caller strings into a [`Filter`] and applies it.
    pub fn run(&self, kind: &str, value: &str, mode: Option<&str>) -> Result<RowSet, InventoryError> {
        let filter = Filter::parse(kind, value, mode)?;
        self.apply(&filter)
    }

    pub fn all(&self) -> Result<RowSet, InventoryError> {
        self.apply(&Filter::All)
    }

    pub fn by_isbn(&self, isbn: &str) -> Result<RowSet, InventoryError> {
        self.apply(&Filter::Isbn(isbn.to_string()))
    }

    pub fn by_title(&self, title: &str) -> Result<RowSet, InventoryError> {
        self.apply(&Filter::Title(title.to_string()))
    }

    pub fn by_author(&self, author: &str) -> Result<RowSet, InventoryError> {
        self.apply(&Filter::Author(author.to_string()))
    }

    pub fn by_year(&self, year: &str, mode: &str) -> Result<RowSet, InventoryError> {
        self.run("year", year, Some(mode))
    }

    pub fn by_pages(&self, count: &str, mode: &str) -> Result<RowSet, InventoryError> {
        self.run("pages", count, Some(mode))
    }

    pub fn by_price(&self, price: &str, mode: &str) -> Result<RowSet, InventoryError> {
        self.run("price", price, Some(mode))
    }

    pub fn by_stock(&self, state: &str) -> Result<RowSet, InventoryError> {
        self.run("stock", state, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_clauses_are_inclusive() {
        let (sql, values) = Filter::parse("year", "2010", Some("before"))
            .unwrap()
            .to_clause()
            .unwrap();
        assert_eq!(sql, "\"YEAR_PUBLISHED\" <= ?1");
        assert_eq!(values, vec![Value::Integer(2010)]);

        let (sql, _) = Filter::parse("year", "2010", Some("AFTER"))
            .unwrap()
            .to_clause()
            .unwrap();
        assert_eq!(sql, "\"YEAR_PUBLISHED\" >= ?1");

        let (sql, _) = Filter::parse("pages", "300", Some("lesser"))
            .unwrap()
            .to_clause()
            .unwrap();
        assert_eq!(sql, "\"PAGES\" <= ?1");

        let (sql, values) = Filter::parse("price", "12.5", Some("greater"))
            .unwrap()
            .to_clause()
            .unwrap();
        assert_eq!(sql, "\"PRICE\" >= ?1");
        assert_eq!(values, vec![Value::Real(12.5)]);
    }

    #[test]
    fn stock_clauses_bind_nothing() {
        let (sql, values) = Filter::parse("stock", "in", None).unwrap().to_clause().unwrap();
        assert_eq!(sql, "\"CUR_STOCK\" > 0");
        assert!(values.is_empty());

        let filter = Filter::parse("stock", "", Some("Out")).unwrap();
        assert_eq!(filter, Filter::Stock(StockState::Out));
    }

    #[test]
    fn text_filters_bind_caller_value() {
        let hostile = "x' OR '1'='1";
        let (sql, values) = Filter::parse("author", hostile, None)
            .unwrap()
            .to_clause()
            .unwrap();
        assert_eq!(sql, "\"AUTHOR\" = ?1");
        assert_eq!(values, vec![Value::Text(hostile.to_string())]);
        assert!(Filter::All.to_clause().is_none());
    }

    #[test]
    fn missing_or_unknown_mode_is_rejected() {
        assert!(matches!(
            Filter::parse("pages", "300", None),
            Err(ValidationError::UnknownMode { filter: "pages", .. })
        ));
        assert!(matches!(
            Filter::parse("year", "2010", Some("around")),
            Err(ValidationError::UnknownMode { filter: "year", .. })
        ));
        assert!(matches!(
            Filter::parse("colour", "red", None),
            Err(ValidationError::UnknownMode { filter: "filter", .. })
        ));
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        assert!(matches!(
            Filter::parse("year", "twenty ten", Some("during")),
            Err(ValidationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            Filter::parse("price", "cheap", Some("lesser")),
            Err(ValidationError::TypeMismatch { .. })
        ));
    }
}
