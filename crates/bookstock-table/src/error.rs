use rusqlite::ErrorCode;
use thiserror::Error;

// SQLite extended result codes for the constraint failures we classify.
const SQLITE_CONSTRAINT_CHECK: i32 = 275;
const SQLITE_CONSTRAINT_NOTNULL: i32 = 1299;
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;
const SQLITE_CONSTRAINT_DATATYPE: i32 = 3091;

/// Errors that can occur during book table operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error originating from the underlying SQLite database.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The `BOOKS` table has not been created yet.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// A seed line could not be turned into a row.
    #[error("Seed line {line}: {reason}")]
    Seed { line: usize, reason: String },

    /// Reading a seed file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`StoreError`], used by callers to decide
/// whether a rejected write was the caller's input or the store itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The ISBN already exists.
    DuplicateKey,
    /// A value could not be coerced losslessly to the column type.
    TypeMismatch,
    /// A `CHECK` constraint failed (the last-shipment date shape).
    CheckFailed,
    /// A required column was given no value.
    NotNull,
    /// The database stayed locked past the busy timeout.
    Busy,
    /// Anything else.
    Other,
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        let StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) = self else {
            return StoreErrorKind::Other;
        };
        match (err.code, err.extended_code) {
            (_, SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_UNIQUE) => {
                StoreErrorKind::DuplicateKey
            }
            (_, SQLITE_CONSTRAINT_DATATYPE) => StoreErrorKind::TypeMismatch,
            (_, SQLITE_CONSTRAINT_CHECK) => StoreErrorKind::CheckFailed,
            (_, SQLITE_CONSTRAINT_NOTNULL) => StoreErrorKind::NotNull,
            (ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked, _) => StoreErrorKind::Busy,
            _ => StoreErrorKind::Other,
        }
    }
}
