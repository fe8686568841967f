//! Two-party chat persistence abstractions.
//!
//! `store` holds the `ChatStore` port; `service` holds the participant
//! checks and paging rules layered on top of it.

pub mod service;
pub mod store;
