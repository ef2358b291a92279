//! Cart error types.

use thiserror::Error;

/// Errors raised by a key/value storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend cannot be used at all (disabled, poisoned, quota exceeded).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// An I/O error occurred in a file-backed store.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized.
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by cart operations.
///
/// Storage failures never surface here; the store logs them and keeps
/// working in memory.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be a positive integer.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },
}
