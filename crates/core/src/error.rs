//! Error types for U-Pallet.

use thiserror::Error;

/// Result type alias for U-Pallet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or mutating a packing engine.
///
/// Expected outcomes of a placement attempt (invalid requests, a saturated
/// pallet) are not errors; they are reported through
/// [`PlaceResult`](crate::PlaceResult).
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid pallet bounds provided.
    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Index does not refer to a placed item.
    #[error("Index {index} out of range for {len} placed items")]
    InvalidIndex {
        /// Requested index.
        index: usize,
        /// Number of placed items at the time of the request.
        len: usize,
    },

    /// An externally computed placement violates bounds or overlaps another item.
    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidIndex { index: 4, len: 2 };
        assert_eq!(err.to_string(), "Index 4 out of range for 2 placed items");

        let err = Error::ConfigError("threshold".into());
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
