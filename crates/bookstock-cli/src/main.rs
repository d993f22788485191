//! bookstock bootstrap binary.
//!
//! Reads configuration from environment variables (see
//! [`InventoryConfig`]), creates the `BOOKS` table when missing, seeds it from
//! a `::`-delimited file the first time, then prints the rows matching an
//! optional filter as JSON lines.
//!
//! ## Quick start
//!
//! ```bash
//! # Create and seed a database, print the whole table
//! BOOKSTOCK_DB_PATH=books.db BOOKSTOCK_SEED_FILE=books.txt \
//!   cargo run --bin bookstock
//!
//! # Books published in or after 2010
//! BOOKSTOCK_DB_PATH=books.db cargo run --bin bookstock -- year 2010 after
//!
//! # Out of stock
//! BOOKSTOCK_DB_PATH=books.db cargo run --bin bookstock -- stock out
//! ```

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use bookstock_inventory::{authorizer_for, AuditLog, FilterBuilder, InventoryConfig, Session};
use bookstock_table::{load_seed_file, BookStore};

fn main() -> anyhow::Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────────
    let config = InventoryConfig::from_env();

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?config,
        "bookstock starting"
    );

    // ── Store and schema ──────────────────────────────────────────────────────
    let Some(db_path) = config.db_path.as_ref() else {
        bail!("BOOKSTOCK_DB_PATH is not set");
    };

    let store = BookStore::open(db_path, config.busy_timeout)
        .with_context(|| format!("failed to open book store at {}", db_path.display()))?;
    let created = store.create_table().context("failed to create BOOKS table")?;

    match (&config.seed_file, created) {
        (Some(seed), true) => {
            let report = load_seed_file(&store, seed)
                .with_context(|| format!("failed to read seed file {}", seed.display()))?;
            info!(
                inserted = report.inserted,
                skipped = report.skipped,
                "table seeded"
            );
        }
        (Some(seed), false) => {
            warn!(seed = %seed.display(), "table already exists, seed file ignored");
        }
        (None, _) => {}
    }

    let session = Session::new(
        Some(store),
        AuditLog::open(&config.audit_log),
        authorizer_for(config.admin_secret.as_deref()),
    )
    .with_lock_timeout(config.lock_timeout);

    // ── Filter and print ──────────────────────────────────────────────────────
    let args: Vec<String> = std::env::args().skip(1).collect();
    let kind = args.first().map(String::as_str).unwrap_or("all");
    let value = args.get(1).map(String::as_str).unwrap_or("");
    let mode = args.get(2).map(String::as_str);

    let rows = FilterBuilder::new(&session).run(kind, value, mode)?;
    for row in rows.to_json() {
        println!("{}", serde_json::to_string(&row)?);
    }
    info!(rows = rows.row_count(), filter = kind, "done");

    Ok(())
}
