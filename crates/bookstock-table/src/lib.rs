//! # bookstock-table
//!
//! Relational book table backed by SQLite.
//!
//! This crate is the only layer that talks to the store. It owns the fixed
//! nine-column `BOOKS` schema, turns query results into positionally
//! addressable [`RowSet`]s, and executes every statement with bound
//! parameters. Column identifiers only ever come from the closed [`Column`]
//! enum, so caller-supplied text never reaches the SQL string.
//!
//! ## Quick start
//!
//! ```no_run
//! use bookstock_table::BookStore;
//!
//! let store = BookStore::open_memory().unwrap();
//! store.create_table().unwrap();
//!
//! store
//!     .insert(&[
//!         "0131103628", "The C Programming Language", "1988", "Kernighan",
//!         "272", "4", "52.99", "120", "2021/05/01",
//!     ])
//!     .unwrap();
//!
//! let rows = store.select_all().unwrap();
//! assert_eq!(rows.row_count(), 1);
//! ```

pub mod error;
pub mod rowset;
pub mod schema;
pub mod seed;
pub mod store;

// Re-exports for convenience.
pub use error::{StoreError, StoreErrorKind};
pub use rowset::{CellValue, RowSet};
pub use schema::{is_date_shaped, Column, ColumnType, BOOKS_TABLE, DATE_FORMAT_HINT};
pub use seed::{load_seed_file, parse_seed_line, SeedReport, SEED_DELIMITER};
pub use store::BookStore;

#[cfg(test)]
mod tests;
