//! Inventory configuration loaded from environment variables.
//!
//! | Variable                    | Default               | Description                                   |
//! |-----------------------------|-----------------------|-----------------------------------------------|
//! | `BOOKSTOCK_DB_PATH`         | unset                 | SQLite file; unset means the store is not configured |
//! | `BOOKSTOCK_AUDIT_LOG`       | `bookstock-audit.log` | Append-only audit log file                    |
//! | `BOOKSTOCK_LOG_LEVEL`       | `info`                | tracing filter (trace/debug/info/warn/error)  |
//! | `BOOKSTOCK_ADMIN_SECRET`    | unset                 | Shared admin secret; unset means nobody can log in |
//! | `BOOKSTOCK_BUSY_TIMEOUT_MS` | `5000`                | How long a statement waits on a locked database |
//! | `BOOKSTOCK_LOCK_TIMEOUT_MS` | `5000`                | How long a call waits for the session's store  |
//! | `BOOKSTOCK_SEED_FILE`       | unset                 | `::`-delimited file loaded into a fresh table  |

use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for an inventory session.
#[derive(Clone)]
pub struct InventoryConfig {
    /// SQLite database file. `None` leaves the session unconfigured.
    pub db_path: Option<PathBuf>,

    /// Audit log file, opened in append mode for every entry.
    pub audit_log: PathBuf,

    /// Tracing filter string, e.g. `"bookstock_inventory=debug,info"`.
    pub log_level: String,

    /// Shared administrative secret.
    pub admin_secret: Option<String>,

    pub busy_timeout: Duration,

    pub lock_timeout: Duration,

    /// Seed file for a freshly created table.
    pub seed_file: Option<PathBuf>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            audit_log: PathBuf::from("bookstock-audit.log"),
            log_level: "info".to_string(),
            admin_secret: None,
            busy_timeout: Duration::from_millis(5000),
            lock_timeout: Duration::from_millis(5000),
            seed_file: None,
        }
    }
}

impl InventoryConfig {
    /// Load configuration from environment variables, applying defaults where
    /// a variable is absent or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value. Blank values count as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let opt = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let millis = |key: &str, default: u64| {
            Duration::from_millis(opt(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default))
        };
        Self {
            db_path:      opt("BOOKSTOCK_DB_PATH").map(PathBuf::from),
            audit_log:    opt("BOOKSTOCK_AUDIT_LOG").map(PathBuf::from).unwrap_or(defaults.audit_log),
            log_level:    opt("BOOKSTOCK_LOG_LEVEL").unwrap_or(defaults.log_level),
            admin_secret: opt("BOOKSTOCK_ADMIN_SECRET"),
            busy_timeout: millis("BOOKSTOCK_BUSY_TIMEOUT_MS", 5000),
            lock_timeout: millis("BOOKSTOCK_LOCK_TIMEOUT_MS", 5000),
            seed_file:    opt("BOOKSTOCK_SEED_FILE").map(PathBuf::from),
        }
    }
}

// The admin secret never appears in logs.
impl std::fmt::Debug for InventoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryConfig")
            .field("db_path", &self.db_path)
            .field("audit_log", &self.audit_log)
            .field("log_level", &self.log_level)
            .field("admin_secret", &self.admin_secret.as_ref().map(|_| "<redacted>"))
            .field("busy_timeout", &self.busy_timeout)
            .field("lock_timeout", &self.lock_timeout)
            .field("seed_file", &self.seed_file)
            .finish()
    }
}
