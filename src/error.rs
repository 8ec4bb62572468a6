//! Error taxonomy for the attendance client.
//!
//! All variants surface as transient, user-facing messages; none are fatal
//! to the CLI. There is no automatic retry anywhere in the pipeline — the
//! user is the retry mechanism (rescan, or re-attempt login).

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RollcallError>;

#[derive(Debug, Error)]
pub enum RollcallError {
    /// The scanned string did not contain a usable attendance payload.
    #[error("invalid QR payload: {0}")]
    InvalidPayload(String),

    /// The HTTP request failed before a server verdict was available.
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered but rejected the operation.
    #[error("server rejected request ({status}): {message}")]
    ServerRejected { status: u16, message: String },

    /// The server answered 200 but the body was not the expected shape.
    #[error("malformed server response: {0}")]
    MalformedResponse(String),

    /// Local key-value store failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A stored or received record failed to (de)serialize.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The operation requires a logged-in user.
    #[error("not logged in")]
    NotLoggedIn,
}
