//! PostgreSQL backend for history versioning.
//!
//! [`PgStore`] runs the engine's queries through `sqlx`, [`PgConnections`] maps
//! connection names to pools. History tables are expected to exist already.

pub mod config;
pub mod connections;
pub mod sql;
pub mod store;
pub mod utils;

pub use config::HistoryDbConfig;
pub use connections::PgConnections;
pub use store::PgStore;

#[cfg(test)]
pub mod test_helper;
