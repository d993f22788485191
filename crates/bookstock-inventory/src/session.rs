use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bookstock_table::{BookStore, RowSet};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::audit::{AuditEntry, AuditLog};
use crate::auth::{authorizer_for, Authorizer};
use crate::config::InventoryConfig;
use crate::error::InventoryError;

/// One interactive session against the book table.
///
/// The session owns the store handle, the audit log and the privilege flag.
/// Grid models and lifecycle operations borrow it, so swapping a grid's row
/// set never touches the privilege.
///
/// The store sits behind a mutex that is acquired with a timeout: a call that
/// cannot get the store within `lock_timeout` fails with
/// [`InventoryError::Timeout`] instead of blocking.
pub struct Session {
    store: Option<Mutex<BookStore>>,
    audit: AuditLog,
    authorizer: Box<dyn Authorizer>,
    privileged: AtomicBool,
    lock_timeout: Duration,
}

impl Session {
    pub fn new(store: Option<BookStore>, audit: AuditLog, authorizer: Box<dyn Authorizer>) -> Self {
        Self {
            store: store.map(Mutex::new),
            audit,
            authorizer,
            privileged: AtomicBool::new(false),
            lock_timeout: Duration::from_millis(5000),
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Opens the session described by `config`.
    ///
    /// Without a database path the session is created unconfigured; every
    /// store call then fails with [`InventoryError::NotConfigured`]. The
    /// `BOOKS` table is created when missing.
    pub fn open(config: &InventoryConfig) -> Result<Self, InventoryError> {
        let store = match &config.db_path {
            Some(path) => {
                let store = BookStore::open(path, config.busy_timeout)
                    .map_err(InventoryError::Unavailable)?;
                store.create_table().map_err(InventoryError::Unavailable)?;
                Some(store)
            }
            None => {
                warn!("no database path configured, store calls will fail");
                None
            }
        };
        Ok(Self::new(
            store,
            AuditLog::open(&config.audit_log),
            authorizer_for(config.admin_secret.as_deref()),
        )
        .with_lock_timeout(config.lock_timeout))
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Presents a credential. Grants the privilege on success and revokes it
    /// on failure.
    pub fn login(&self, credential: &str) -> bool {
        let granted = self.authorizer.authorize(credential);
        self.privileged.store(granted, Ordering::SeqCst);
        if granted {
            info!("admin privilege granted");
        } else {
            warn!("admin login rejected");
        }
        granted
    }

    pub fn logout(&self) {
        self.privileged.store(false, Ordering::SeqCst);
    }

    pub fn set_privilege(&self, privileged: bool) {
        self.privileged.store(privileged, Ordering::SeqCst);
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged.load(Ordering::SeqCst)
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Re-reads the whole table.
    pub fn refresh(&self) -> Result<RowSet, InventoryError> {
        self.with_store(|store| store.select_all())?
            .map_err(|e| {
                error!(error = %e, "refresh failed");
                InventoryError::QueryFailed(e)
            })
    }

    pub(crate) fn require_privilege(&self) -> Result<(), InventoryError> {
        if self.is_privileged() {
            Ok(())
        } else {
            Err(InventoryError::NotAuthorized)
        }
    }

    /// Runs `f` with exclusive access to the store.
    pub(crate) fn with_store<T>(
        &self,
        f: impl FnOnce(&BookStore) -> T,
    ) -> Result<T, InventoryError> {
        let store = self.store.as_ref().ok_or(InventoryError::NotConfigured)?;
        let guard = store
            .try_lock_for(self.lock_timeout)
            .ok_or(InventoryError::Timeout(self.lock_timeout))?;
        Ok(f(&guard))
    }

    /// Appends an entry after a committed store mutation.
    pub(crate) fn record(&self, entry: &AuditEntry) -> Result<(), InventoryError> {
        self.audit.append(entry).map_err(|e| {
            error!(kind = entry.kind(), error = %e, "audit append failed after commit");
            InventoryError::AuditFailed(e)
        })
    }
}
