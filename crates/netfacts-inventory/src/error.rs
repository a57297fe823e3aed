//! Error types for inventory operations.

use thiserror::Error;

/// Result type alias for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Errors raised by an inventory store.
#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    /// The referenced object does not exist.
    #[error("{kind} '{key}' not found")]
    NotFound {
        /// Object table, e.g. "interface".
        kind: &'static str,
        /// Natural key or id that was looked up.
        key: String,
    },

    /// The write would violate a uniqueness rule.
    #[error("{message}")]
    Conflict {
        /// Error message.
        message: String,
    },

    /// The backing store failed.
    #[error("Inventory backend error: {message}")]
    Backend {
        /// Error message.
        message: String,
    },
}

impl InventoryError {
    /// Creates a not found error.
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::Backend { .. })
    }
}
