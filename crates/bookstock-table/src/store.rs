use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::rowset::{CellValue, RowSet};
use crate::schema::{column_list, create_table_sql, Column, BOOKS_TABLE};

/// The book table backed by SQLite.
///
/// Every statement binds its values as parameters. Identifiers interpolated
/// into SQL text come only from [`Column`] and [`BOOKS_TABLE`].
pub struct BookStore {
    conn: Connection,
}

impl BookStore {
    /// Opens (or creates) a SQLite database at the given file path.
    ///
    /// `busy_timeout` bounds how long a statement waits on a locked database
    /// before failing.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        debug!("Opened BookStore at {}", path.as_ref().display());
        Ok(Self { conn })
    }

    /// Opens an in-memory SQLite database (useful for testing).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        debug!("Opened in-memory BookStore");
        Ok(Self { conn })
    }

    /// Creates the `BOOKS` table if it does not exist yet.
    ///
    /// Returns `true` when the table was freshly created and `false` when it
    /// already existed.
    #[instrument(skip_all)]
    pub fn create_table(&self) -> Result<bool, StoreError> {
        if self.table_exists()? {
            debug!("Table {} already exists", BOOKS_TABLE);
            return Ok(false);
        }
        let sql = create_table_sql();
        debug!("CREATE TABLE SQL: {}", sql);
        self.conn.execute(&sql, [])?;
        Ok(true)
    }

    /// Selects rows with an optional `WHERE` predicate, in insertion order.
    ///
    /// `clause` is SQL built from [`Column`] names and positional placeholders;
    /// every caller value travels in `params`.
    #[instrument(skip_all)]
    pub fn select(
        &self,
        clause: Option<&str>,
        params: &[&dyn ToSql],
    ) -> Result<RowSet, StoreError> {
        if !self.table_exists()? {
            return Err(StoreError::TableNotFound(BOOKS_TABLE.to_string()));
        }

        let sql = match clause {
            Some(c) => format!(
                "SELECT {} FROM \"{}\" WHERE {} ORDER BY rowid",
                column_list(),
                BOOKS_TABLE,
                c
            ),
            None => format!(
                "SELECT {} FROM \"{}\" ORDER BY rowid",
                column_list(),
                BOOKS_TABLE
            ),
        };
        debug!("SELECT SQL: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let col_count = columns.len();

        let rows = stmt.query_map(params, |row| {
            (0..col_count)
                .map(|i| row.get_ref(i).map(CellValue::from_ref))
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }

        debug!("Selected {} rows from {}", result.len(), BOOKS_TABLE);
        Ok(RowSet::new(columns, result))
    }

    /// Selects the entire table.
    pub fn select_all(&self) -> Result<RowSet, StoreError> {
        self.select(None, &[])
    }

    /// Reads one row by ISBN, in declared column order.
    pub fn fetch(&self, isbn: &str) -> Result<Option<Vec<CellValue>>, StoreError> {
        let sql = format!(
            "SELECT {} FROM \"{}\" WHERE \"{}\" = ?1",
            column_list(),
            BOOKS_TABLE,
            Column::Isbn.name()
        );
        let row = self
            .conn
            .query_row(&sql, params![isbn], |row| {
                (0..Column::ALL.len())
                    .map(|i| row.get_ref(i).map(CellValue::from_ref))
                    .collect::<Result<Vec<_>, _>>()
            })
            .optional()?;
        Ok(row)
    }

    /// Counts the rows in the table.
    pub fn count(&self) -> Result<usize, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", BOOKS_TABLE);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Inserts one row. Values are given in declared column order and bound as
    /// text after [`Column::normalize`]; the `STRICT` table coerces them to the
    /// column types or rejects the row.
    #[instrument(skip_all, fields(isbn = %values[0]))]
    pub fn insert(&self, values: &[&str; 9]) -> Result<(), StoreError> {
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            BOOKS_TABLE,
            column_list(),
            placeholders.join(", ")
        );
        let values: Vec<Cow<'_, str>> = Column::ALL
            .iter()
            .zip(values)
            .map(|(column, value)| column.normalize(value))
            .collect();
        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        debug!("Inserted row into {}", BOOKS_TABLE);
        Ok(())
    }

    /// Writes `value` into `column` of the row keyed by `isbn`.
    ///
    /// Returns the number of rows updated (0 when the ISBN is unknown).
    #[instrument(skip_all, fields(isbn = %isbn, column = %column))]
    pub fn update_cell(&self, isbn: &str, column: Column, value: &str) -> Result<usize, StoreError> {
        let sql = format!(
            "UPDATE \"{}\" SET \"{}\" = ?1 WHERE \"{}\" = ?2",
            BOOKS_TABLE,
            column.name(),
            Column::Isbn.name()
        );
        let updated = self.conn.execute(&sql, params![column.normalize(value), isbn])?;
        debug!("Updated {} rows in {}", updated, BOOKS_TABLE);
        Ok(updated)
    }

    /// Deletes the row keyed by `isbn`.
    ///
    /// Returns the number of rows deleted.
    #[instrument(skip_all, fields(isbn = %isbn))]
    pub fn delete(&self, isbn: &str) -> Result<usize, StoreError> {
        let sql = format!(
            "DELETE FROM \"{}\" WHERE \"{}\" = ?1",
            BOOKS_TABLE,
            Column::Isbn.name()
        );
        let deleted = self.conn.execute(&sql, params![isbn])?;
        debug!("Deleted {} rows from {}", deleted, BOOKS_TABLE);
        Ok(deleted)
    }

    /// Checks whether the `BOOKS` table exists.
    fn table_exists(&self) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            params![BOOKS_TABLE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
