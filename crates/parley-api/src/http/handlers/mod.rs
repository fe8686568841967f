//! HTTP request handlers for the API.

pub mod chat;
pub mod message;

use std::str::FromStr;

use crate::http::error::AppError;

/// Parse an id from a path or query parameter, returning a 400 error on
/// invalid format.
fn parse_id<T: FromStr>(kind: &str, s: &str) -> Result<T, AppError> {
    s.parse::<T>()
        .map_err(|_| AppError::Validation(format!("Invalid {kind} id: {s}")))
}
