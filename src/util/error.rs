//! Error types for detpost.

use thiserror::Error;

/// Result alias for detpost operations.
pub type DetPostResult<T> = std::result::Result<T, DetPostError>;

/// Errors that can occur when running detpost algorithms.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetPostError {
    /// A buffer length does not agree with the anchor layout. Indicates a
    /// wiring bug between the anchor configuration and the network, so the
    /// frame cannot be processed.
    #[error("{context}: expected {expected} entries, got {got}")]
    ShapeMismatch {
        expected: usize,
        got: usize,
        context: &'static str,
    },
    /// A configuration value was rejected at construction time.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: &'static str },
}
