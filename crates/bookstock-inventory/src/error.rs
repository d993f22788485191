use std::time::Duration;

use bookstock_table::{StoreError, DATE_FORMAT_HINT};
use thiserror::Error;

/// Input rejected before or by the store because of its shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The last-shipment date is not `YYYY/MM/DD` or not a calendar date.
    #[error("incorrect format for {column}: '{value}' (date format is {hint})", hint = DATE_FORMAT_HINT)]
    DateFormat { column: String, value: String },

    /// The value cannot be stored in the column's type.
    #[error("incorrect format for {column}: '{value}'")]
    TypeMismatch { column: String, value: String },

    /// A filter mode was missing or not one of the accepted words.
    #[error("unknown {filter} mode '{mode}' (expected one of: {expected})")]
    UnknownMode {
        filter: &'static str,
        mode: String,
        expected: &'static str,
    },

    /// The column is part of the book's identity and cannot be edited.
    #[error("column {column} is not editable")]
    ImmutableColumn { column: String },
}

impl ValidationError {
    pub fn is_date_format(&self) -> bool {
        matches!(self, ValidationError::DateFormat { .. })
    }
}

/// Errors surfaced by the inventory layer. All of them are recoverable.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("store session not configured (set BOOKSTOCK_DB_PATH)")]
    NotConfigured,

    #[error("store unavailable: {0}")]
    Unavailable(#[source] StoreError),

    #[error("query failed: {0}")]
    QueryFailed(#[source] StoreError),

    #[error("only admins can modify data, log in first")]
    NotAuthorized,

    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("mutation failed: {0}")]
    MutationFailed(#[source] StoreError),

    #[error("incomplete input: no value given for {field}")]
    IncompleteInput { field: &'static str },

    #[error("table currently empty")]
    EmptyTable,

    #[error("book with ISBN: {isbn} doesn't exist in table")]
    NotFound { isbn: String },

    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("timed out after {0:?} waiting for the store session")]
    Timeout(Duration),

    #[error("audit log write failed: {0}")]
    AuditFailed(#[source] std::io::Error),
}

impl InventoryError {
    /// Stable snake_case name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            InventoryError::NotConfigured => "not_configured",
            InventoryError::Unavailable(_) => "unavailable",
            InventoryError::QueryFailed(_) => "query_failed",
            InventoryError::NotAuthorized => "not_authorized",
            InventoryError::ValidationFailed(ValidationError::DateFormat { .. }) => {
                "validation_failed.date_format"
            }
            InventoryError::ValidationFailed(_) => "validation_failed",
            InventoryError::MutationFailed(_) => "mutation_failed",
            InventoryError::IncompleteInput { .. } => "incomplete_input",
            InventoryError::EmptyTable => "empty_table",
            InventoryError::NotFound { .. } => "not_found",
            InventoryError::IndexOutOfRange { .. } => "index_out_of_range",
            InventoryError::Timeout(_) => "timeout",
            InventoryError::AuditFailed(_) => "audit_failed",
        }
    }

    /// True for date-format validation failures, so a caller can re-prompt
    /// with the expected format.
    pub fn is_date_format(&self) -> bool {
        matches!(self, InventoryError::ValidationFailed(v) if v.is_date_format())
    }
}
