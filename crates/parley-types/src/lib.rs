//! Shared domain types for Parley.
//!
//! Chats, messages, their identifiers, the error taxonomy shared by the store
//! and the conversation service, and the process configuration structs.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
