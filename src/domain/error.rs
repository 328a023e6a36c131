use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a call to one of the remote APIs
///
/// `NotFound` is kept apart from the other variants: a 404 on a listing means
/// "no results yet" and is rendered as a neutral empty state, not as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ApiError {
    /// 404: the resource does not exist or is not owned by the caller
    #[error("{0}")]
    NotFound(String),
    /// Any other non-success HTTP status
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },
    /// Connection, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(String),
    /// The response body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Whether a later retry of the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::NotFound(_) | ApiError::Decode(_) => false,
        }
    }

    /// Message suitable for an error banner
    ///
    /// Server-provided messages are shown as-is; transport and decode failures fall
    /// back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::NotFound(message) | ApiError::Status { message, .. }
                if !message.is_empty() =>
            {
                message.clone()
            }
            _ => fallback.to_string(),
        }
    }
}
