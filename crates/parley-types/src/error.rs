use thiserror::Error;

/// Errors from store operations (used by the `ChatStore` trait in parley-core).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A constraint rejected the input (e.g. a chat with oneself).
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Connectivity, transaction, or row decoding failure in the backend.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the conversation service.
///
/// Every failure maps to exactly one variant so adapters can apply a fixed
/// status mapping.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("user '{user_id}' is not a participant in this chat")]
    PermissionDenied { user_id: String },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for ChatError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => ChatError::Validation(msg),
            StoreError::NotFound(what) => ChatError::NotFound(what),
            StoreError::Unavailable(msg) => ChatError::StoreUnavailable(msg),
        }
    }
}
