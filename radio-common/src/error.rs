//! Shared error leaves: one `thiserror` enum for errors originating from
//! shared, extension-visible types, plus a crate-wide `Result` alias.

use thiserror::Error;

/// Result type alias used throughout `radio-common`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can originate from shared, extension-visible types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
