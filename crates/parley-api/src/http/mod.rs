//! HTTP/JSON API layer for Parley.
//!
//! Axum-based API at `/api/v1/` with envelope response format and CORS
//! support. Handlers only translate between JSON and `ChatService` calls.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
