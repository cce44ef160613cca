//! Error types
//!
//! Every fallible operation in the crate returns [`GestureResult`]. Errors stop
//! at the coordinator, which turns them into user-facing notices.

use thiserror::Error;

/// Errors that can occur while capturing, hashing or submitting a gesture
#[derive(Error, Debug)]
pub enum GestureError {
    #[error("Wallet not connected")]
    Unauthorized,

    #[error("Incomplete gesture: {0}")]
    IncompleteGesture(String),

    #[error("No wallet provider available")]
    WalletUnavailable,

    #[error("Wallet rejected the connection: {0}")]
    WalletRejected(String),

    #[error("Submission rejected with HTTP status {status}")]
    SubmissionRejected { status: u16 },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gesture operations
pub type GestureResult<T> = Result<T, GestureError>;
