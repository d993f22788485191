//! Adding and deleting whole rows.
//!
//! Every mutation walks the same stages:
//!
//! ```text
//! Requested -> Validated -> StoreCommitted -> Logged -> Returned
//!     \            \
//!      `-----------`--> Rejected
//! ```
//!
//! An audit line is written only after the store accepted the change, and a
//! rejected mutation leaves both the table and the log untouched. Input
//! collection and re-prompting belong to the caller: a malformed date comes
//! back as a typed validation failure.

use bookstock_table::{is_date_shaped, Column, RowSet, StoreErrorKind};
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::audit::AuditEntry;
use crate::error::{InventoryError, ValidationError};
use crate::session::Session;

/// Stages of a single row mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStage {
    Requested,
    Validated,
    StoreCommitted,
    Logged,
    Returned,
    Rejected,
}

impl MutationStage {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationStage::Requested => "requested",
            MutationStage::Validated => "validated",
            MutationStage::StoreCommitted => "store_committed",
            MutationStage::Logged => "logged",
            MutationStage::Returned => "returned",
            MutationStage::Rejected => "rejected",
        }
    }
}

/// Checks a last-shipment date: `YYYY/MM/DD` digit shape and a real
/// calendar day.
pub fn validate_date(value: &str) -> Result<(), ValidationError> {
    let valid =
        is_date_shaped(value) && NaiveDate::parse_from_str(value, "%Y/%m/%d").is_ok();
    if valid {
        Ok(())
    } else {
        Err(ValidationError::DateFormat {
            column: Column::LastShipReceived.name().to_string(),
            value: value.to_string(),
        })
    }
}

/// Field values for a new row, as collected by the caller. `None` or blank
/// means the caller supplied nothing for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBook {
    pub isbn: Option<String>,
    pub book_name: Option<String>,
    pub year_published: Option<String>,
    pub author: Option<String>,
    pub pages: Option<String>,
    pub cur_stock: Option<String>,
    pub price: Option<String>,
    pub amount_sold: Option<String>,
    pub last_ship_received: Option<String>,
}

impl NewBook {
    /// Field values in declared column order.
    fn fields(&self) -> [(Column, Option<&String>); 9] {
        [
            (Column::Isbn, self.isbn.as_ref()),
            (Column::BookName, self.book_name.as_ref()),
            (Column::YearPublished, self.year_published.as_ref()),
            (Column::Author, self.author.as_ref()),
            (Column::Pages, self.pages.as_ref()),
            (Column::CurStock, self.cur_stock.as_ref()),
            (Column::Price, self.price.as_ref()),
            (Column::AmountSold, self.amount_sold.as_ref()),
            (Column::LastShipReceived, self.last_ship_received.as_ref()),
        ]
    }

    /// All nine trimmed values, or the first column that has none.
    pub fn values(&self) -> Result<[String; 9], InventoryError> {
        let mut values: [String; 9] = Default::default();
        for (slot, (column, value)) in values.iter_mut().zip(self.fields()) {
            match value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
                Some(v) => *slot = v.to_string(),
                None => return Err(InventoryError::IncompleteInput { field: column.name() }),
            }
        }
        Ok(values)
    }
}

fn stage(op: &'static str, stage: MutationStage) {
    debug!(op, stage = stage.as_str(), "mutation stage");
}

fn reject(op: &'static str, err: InventoryError) -> InventoryError {
    warn!(op, error = %err, "mutation rejected");
    stage(op, MutationStage::Rejected);
    err
}

/// Inserts a new row and returns the refreshed table.
#[instrument(skip_all)]
pub fn add_row(session: &Session, book: &NewBook) -> Result<RowSet, InventoryError> {
    const OP: &str = "add_row";
    stage(OP, MutationStage::Requested);

    session.require_privilege().map_err(|e| reject(OP, e))?;
    let values = book.values().map_err(|e| reject(OP, e))?;
    validate_date(&values[Column::LastShipReceived.index()])
        .map_err(|e| reject(OP, e.into()))?;
    stage(OP, MutationStage::Validated);

    let values: [String; 9] =
        std::array::from_fn(|i| Column::ALL[i].normalize(&values[i]).into_owned());
    let bound: [&str; 9] = std::array::from_fn(|i| values[i].as_str());
    let isbn = values[Column::Isbn.index()].clone();
    let entry = AuditEntry::AddRow {
        values: values.clone(),
    };

    // The entry is appended under the store lock so log order is commit order.
    session
        .with_store(|store| {
            if let Err(e) = store.insert(&bound) {
                return Err(reject(OP, InventoryError::MutationFailed(e)));
            }
            stage(OP, MutationStage::StoreCommitted);
            session.record(&entry)
        })
        .map_err(|e| reject(OP, e))??;
    stage(OP, MutationStage::Logged);
    info!(isbn = %isbn, "row added");

    let rows = session.refresh()?;
    stage(OP, MutationStage::Returned);
    Ok(rows)
}

/// Deletes the first row of `current` whose ISBN matches and returns the
/// refreshed table.
///
/// An absent or blank ISBN is a no-op: `current` comes back unchanged and
/// nothing is logged.
#[instrument(skip_all)]
pub fn delete_row(
    session: &Session,
    current: &RowSet,
    isbn: Option<&str>,
) -> Result<RowSet, InventoryError> {
    const OP: &str = "delete_row";

    let Some(isbn) = isbn.filter(|i| !i.trim().is_empty()) else {
        debug!("no ISBN given, nothing to delete");
        return Ok(current.clone());
    };
    stage(OP, MutationStage::Requested);

    session.require_privilege().map_err(|e| reject(OP, e))?;
    if current.is_empty() {
        return Err(reject(OP, InventoryError::EmptyTable));
    }
    let Some(row) = current.find_isbn(isbn) else {
        return Err(reject(
            OP,
            InventoryError::NotFound {
                isbn: isbn.to_string(),
            },
        ));
    };
    let entry = AuditEntry::DeletedRow {
        isbn: isbn.to_string(),
        name: current.text(row, Column::BookName).unwrap_or_default(),
        author: current.text(row, Column::Author).unwrap_or_default(),
    };
    stage(OP, MutationStage::Validated);

    session
        .with_store(|store| {
            let deleted = store
                .delete(isbn)
                .map_err(|e| reject(OP, InventoryError::MutationFailed(e)))?;
            if deleted == 0 {
                // The row set was stale: the store no longer has this ISBN.
                return Err(reject(
                    OP,
                    InventoryError::NotFound {
                        isbn: isbn.to_string(),
                    },
                ));
            }
            stage(OP, MutationStage::StoreCommitted);
            session.record(&entry)
        })
        .map_err(|e| reject(OP, e))??;
    stage(OP, MutationStage::Logged);
    info!(isbn = %isbn, "row deleted");

    let rows = session.refresh()?;
    stage(OP, MutationStage::Returned);
    Ok(rows)
}

/// Maps a store rejection of a single-cell write to the caller-facing error.
pub(crate) fn classify_write_error(
    column: Column,
    value: &str,
    err: bookstock_table::StoreError,
) -> InventoryError {
    match err.kind() {
        StoreErrorKind::CheckFailed if column == Column::LastShipReceived => {
            ValidationError::DateFormat {
                column: column.name().to_string(),
                value: value.to_string(),
            }
            .into()
        }
        StoreErrorKind::TypeMismatch | StoreErrorKind::NotNull => ValidationError::TypeMismatch {
            column: column.name().to_string(),
            value: value.to_string(),
        }
        .into(),
        _ => InventoryError::MutationFailed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_validation() {
        assert!(validate_date("2021/05/01").is_ok());
        assert!(validate_date("2021-05-01").unwrap_err().is_date_format());
        assert!(validate_date("2021/13/01").is_err());
        assert!(validate_date("2021/02/30").is_err());
        assert!(validate_date("2021/5/1").is_err());
        assert!(validate_date(" 2021/05/01").is_err());
    }

    #[test]
    fn values_reports_first_missing_field() {
        let book = NewBook {
            isbn: Some("1".into()),
            book_name: Some("Dune".into()),
            year_published: Some("   ".into()),
            ..NewBook::default()
        };
        assert!(matches!(
            book.values(),
            Err(InventoryError::IncompleteInput {
                field: "YEAR_PUBLISHED"
            })
        ));
    }
}
