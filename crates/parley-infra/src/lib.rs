//! Infrastructure layer for Parley.
//!
//! Contains the SQLite implementation of the `ChatStore` trait defined in
//! `parley-core`, the database pool with its migrations, and the loader for
//! `config.toml`.

pub mod config;
pub mod sqlite;
