//! SQLite storage layer.
//!
//! Store implementation backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod chat;
pub mod pool;
