//! Error types for the diary core.

use std::io;

use thiserror::Error;

/// The main error type for the diary library.
#[derive(Error, Debug)]
pub enum DiaryError {
    /// Errors related to reading or writing the data file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization of stored entries.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport failure while talking to the completion endpoint.
    #[error("Completion request failed: {0}")]
    Completion(#[from] reqwest::Error),

    /// The completion endpoint answered with a non-success status.
    #[error("Completion endpoint returned {status}")]
    CompletionStatus { status: reqwest::StatusCode },

    /// The document store could not be reached.
    #[error("Document store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// The document store refused a write.
    #[error("Write rejected: {message}")]
    WriteRejected { message: String },

    /// A live query stopped delivering results.
    #[error("Live query subscription closed")]
    SubscriptionClosed,
}

pub type Result<T> = std::result::Result<T, DiaryError>;
