//! Conversation logic and the store port for Parley.
//!
//! This crate defines the `ChatStore` trait that the infrastructure layer
//! implements, and the `ChatService` that adapters call. It depends only on
//! `parley-types` -- never on `parley-infra` or any database/IO crate.

pub mod chat;
