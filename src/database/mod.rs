//! SeaORM-backed persistence.
//!
//! Everything here sits behind the `database` feature. The in-memory
//! stores elsewhere in the crate implement the same traits, so swapping
//! [`SeaOrmStore`] in is a wiring change, not an API change.

pub mod config;
pub mod migration;
pub mod store;

pub use config::{DatabaseConfig, redact_database_url};
pub use migration::{Migrator, run_migrations};
pub use store::SeaOrmStore;

pub use sea_orm;
