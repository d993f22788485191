//! # bookstock-inventory
//!
//! Inventory operations over the bookstock table: structured filters, an
//! editable grid over a row set, and audited add/delete of whole rows.
//!
//! Everything runs through a [`Session`], which owns the store handle, the
//! audit log and the admin privilege. Reads are open to every session;
//! mutations require the privilege, granted by [`Session::login`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use bookstock_inventory::{FilterBuilder, GridModel, InventoryConfig, Session};
//!
//! let session = Arc::new(Session::open(&InventoryConfig::from_env()).unwrap());
//! let rows = FilterBuilder::new(&session).by_year("2010", "after").unwrap();
//!
//! let mut grid = GridModel::new(session.clone(), rows);
//! session.login("secret");
//! grid.set_value(0, 5, "12").unwrap();
//! ```

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod grid;
pub mod lifecycle;
pub mod session;

pub use audit::{AuditEntry, AuditLog};
pub use auth::{authorizer_for, Authorizer, DenyAll, SharedSecretAuthorizer};
pub use config::InventoryConfig;
pub use error::{InventoryError, ValidationError};
pub use filter::{Bound, Filter, FilterBuilder, StockState, YearMode};
pub use grid::{GridEvent, GridModel};
pub use lifecycle::{add_row, delete_row, validate_date, MutationStage, NewBook};
pub use session::Session;
