//! Error types shared by the idle watcher and its service backends.
//!
//! Service calls fail with [`ServiceError`]; the coordinator logs and retries
//! those instead of surfacing them. [`CoordinatorError`] is reserved for caller
//! bugs, such as using a coordinator that was never initialized.

use thiserror::Error;

/// Failure of a settings, break-session or work-session call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Local SQLite backend failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Transport-level failure talking to the clinic server.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The clinic server answered with a non-success status.
    #[error("server responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The request contradicts current state (e.g. a break is already open).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid data: {0}")]
    Invalid(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

/// Misuse of the coordinator API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("idle coordinator is not initialized")]
    NotInitialized,

    #[error("idle coordinator has been destroyed")]
    Destroyed,
}

/// Activity source could not attach to input events.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActivityError {
    #[error("input monitoring is not supported here: {0}")]
    Unsupported(String),
}
