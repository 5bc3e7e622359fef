//! PostgreSQL persistence for the substrate: schema migration, EWKB
//! geometry encoding, the binary `COPY` writer, connection pooling, and
//! the [`NodeStore`](substrate_core::store::NodeStore) implementation
//! itself.

#![warn(missing_docs)]

pub mod copy_writer;
pub mod error;
pub mod ewkb;
pub mod pool;
pub mod postgres_store;

pub use pool::{build_pool, Pool, PoolConfig};
pub use postgres_store::PostgresStore;

/// The literal schema migration, embedded so `substrate-cli migrate`
/// can apply it without shipping a separate SQL file at runtime.
pub const INIT_MIGRATION: &str = include_str!("../migrations/0001_init.sql");
