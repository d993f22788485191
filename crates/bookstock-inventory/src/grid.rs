use std::sync::Arc;

use bookstock_table::{CellValue, Column, RowSet};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::audit::AuditEntry;
use crate::error::{InventoryError, ValidationError};
use crate::lifecycle::{classify_write_error, validate_date};
use crate::session::Session;

/// Capacity of the change-notification channel.
const EVENT_CAPACITY: usize = 64;

/// Notification sent to grid observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    CellChanged { row: usize, column: usize },
}

/// An addressable, editable view over one [`RowSet`].
///
/// Cells are display strings. The five identity columns are read-only; the
/// others can be edited by a privileged session, and each accepted edit is
/// written to the store, appended to the audit log and broadcast to
/// subscribers. The privilege lives in the [`Session`], so
/// [`replace_rows`](Self::replace_rows) keeps it.
pub struct GridModel {
    session: Arc<Session>,
    rows: RowSet,
    events: broadcast::Sender<GridEvent>,
}

impl GridModel {
    pub fn new(session: Arc<Session>, rows: RowSet) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session,
            rows,
            events,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn rows(&self) -> &RowSet {
        &self.rows
    }

    /// Swaps in a new row set wholesale and returns the previous one.
    pub fn replace_rows(&mut self, rows: RowSet) -> RowSet {
        std::mem::replace(&mut self.rows, rows)
    }

    pub fn column_count(&self) -> usize {
        self.rows.column_count()
    }

    pub fn row_count(&self) -> usize {
        self.rows.row_count()
    }

    pub fn column_name(&self, col: usize) -> Result<&str, InventoryError> {
        self.rows
            .columns()
            .get(col)
            .map(String::as_str)
            .ok_or_else(|| self.out_of_range(0, col))
    }

    /// Display string of a cell; `Ok(None)` when the stored value is absent.
    pub fn value_at(&self, row: usize, col: usize) -> Result<Option<String>, InventoryError> {
        self.rows
            .cell(row, col)
            .map(|cell| cell.display())
            .ok_or_else(|| self.out_of_range(row, col))
    }

    /// Whether a cell may be edited. Editability belongs to the column; `row`
    /// is ignored. Unknown or out-of-range columns are not editable.
    pub fn is_editable(&self, _row: usize, col: usize) -> bool {
        self.column(col).is_some_and(|c| !c.is_immutable())
    }

    pub fn set_privilege(&self, privileged: bool) {
        self.session.set_privilege(privileged);
    }

    pub fn privilege(&self) -> bool {
        self.session.is_privileged()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GridEvent> {
        self.events.subscribe()
    }

    /// Writes `value` into one cell.
    ///
    /// Rejected without any store write or audit entry when the session is
    /// not privileged, the cell does not exist, the column is immutable, or
    /// the value does not fit the column.
    #[instrument(skip_all, fields(row = row, col = col))]
    pub fn set_value(&mut self, row: usize, col: usize, value: &str) -> Result<(), InventoryError> {
        if let Err(e) = self.session.require_privilege() {
            warn!("edit rejected, session not privileged");
            return Err(e);
        }
        if row >= self.row_count() || col >= self.column_count() {
            return Err(self.out_of_range(row, col));
        }

        let column = self
            .column(col)
            .ok_or_else(|| self.out_of_range(row, col))?;
        if column.is_immutable() {
            return Err(ValidationError::ImmutableColumn {
                column: column.name().to_string(),
            }
            .into());
        }
        if column == Column::LastShipReceived {
            validate_date(value)?;
        }

        let isbn = self
            .rows
            .text(row, Column::Isbn)
            .ok_or_else(|| self.out_of_range(row, col))?;
        let previous = self.value_at(row, col)?;

        let session = &self.session;
        let (fresh, new) = session.with_store(|store| {
            let updated = store
                .update_cell(&isbn, column, value)
                .map_err(|e| classify_write_error(column, value, e))?;
            if updated == 0 {
                return Err(InventoryError::NotFound { isbn: isbn.clone() });
            }

            // Committed: from here on the edit is always logged.
            let fresh = store.fetch(&isbn).unwrap_or_else(|e| {
                warn!(error = %e, "re-read after edit failed");
                None
            });
            let new = fresh
                .as_ref()
                .and_then(|cells| cells.get(column.index()))
                .and_then(CellValue::display)
                .unwrap_or_else(|| column.normalize(value).into_owned());

            // Appended under the store lock so log order is commit order.
            session.record(&AuditEntry::Modify {
                row,
                column: column.name().to_string(),
                previous: previous.clone(),
                new: new.clone(),
            })?;
            Ok((fresh, new))
        })??;

        if let Some(fresh) = fresh {
            self.rows.replace_row(row, fresh);
        }

        info!(
            isbn = %isbn,
            column = %column,
            previous = previous.as_deref().unwrap_or("null"),
            new = %new,
            "cell modified"
        );
        let _ = self.events.send(GridEvent::CellChanged { row, column: col });
        Ok(())
    }

    fn column(&self, col: usize) -> Option<Column> {
        self.rows
            .columns()
            .get(col)
            .and_then(|name| Column::from_name(name))
    }

    fn out_of_range(&self, row: usize, col: usize) -> InventoryError {
        InventoryError::IndexOutOfRange {
            row,
            col,
            rows: self.row_count(),
            cols: self.column_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::auth::DenyAll;
    use bookstock_table::BookStore;
    use tempfile::TempDir;

    fn grid(dir: &TempDir) -> GridModel {
        let store = BookStore::open_memory().unwrap();
        store.create_table().unwrap();
        store
            .insert(&[
                "1", "Dune", "1965", "Herbert", "412", "2", "9.99", "40", "2020/01/15",
            ])
            .unwrap();
        let rows = store.select_all().unwrap();
        let session = Session::new(
            Some(store),
            AuditLog::open(dir.path().join("audit.log")),
            Box::new(DenyAll),
        );
        GridModel::new(Arc::new(session), rows)
    }

    #[test]
    fn shape_comes_from_row_set() {
        let dir = TempDir::new().unwrap();
        let grid = grid(&dir);
        assert_eq!(grid.row_count(), 1);
        assert_eq!(grid.column_count(), 9);
        assert_eq!(grid.column_name(6).unwrap(), "PRICE");
        assert_eq!(grid.value_at(0, 6).unwrap().as_deref(), Some("9.99"));
        assert!(matches!(
            grid.value_at(1, 0),
            Err(InventoryError::IndexOutOfRange { rows: 1, cols: 9, .. })
        ));
        assert!(grid.column_name(9).is_err());
    }

    #[test]
    fn editability_is_per_column() {
        let dir = TempDir::new().unwrap();
        let grid = grid(&dir);
        for row in [0, 1, 500] {
            for col in 0..5 {
                assert!(!grid.is_editable(row, col));
            }
            for col in 5..9 {
                assert!(grid.is_editable(row, col));
            }
            assert!(!grid.is_editable(row, 9));
        }
    }

    #[test]
    fn immutable_column_refused_even_when_privileged() {
        let dir = TempDir::new().unwrap();
        let mut grid = grid(&dir);
        grid.set_privilege(true);
        let err = grid.set_value(0, 1, "Other title").unwrap_err();
        assert!(matches!(
            err,
            InventoryError::ValidationFailed(ValidationError::ImmutableColumn { .. })
        ));
        assert_eq!(grid.value_at(0, 1).unwrap().as_deref(), Some("Dune"));
        assert!(grid.session().audit_log().lines().unwrap().is_empty());
    }

    #[test]
    fn privilege_survives_row_swap() {
        let dir = TempDir::new().unwrap();
        let mut grid = grid(&dir);
        grid.set_privilege(true);
        let old = grid.replace_rows(RowSet::default());
        assert_eq!(old.row_count(), 1);
        assert_eq!(grid.row_count(), 0);
        assert!(grid.privilege());
    }
}
