/*!
Error types for the savepoint core engine.
*/

use thiserror::Error;

/// Result type used throughout the savepoint core.
pub type Result<T> = std::result::Result<T, SaveError>;

/// Errors that can occur during save, load and maintenance operations.
#[derive(Error, Debug)]
pub enum SaveError {
    /// Slot index outside the configured range
    #[error("slot {slot} is out of range (0..{max_slots})")]
    InvalidSlot { slot: usize, max_slots: usize },

    /// I/O errors during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed structured text on decode, or a record that fails to serialize
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Truncated or non-conformant compressed buffer
    #[error("compression error: {0}")]
    Compression(String),

    /// Wrong key, truncated input, or tampered ciphertext
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Invalid configuration values
    #[error("configuration error: {0}")]
    Config(String),

    /// A save or load was entered while another one is still in flight
    #[error("another save/load operation is already in flight")]
    OperationInFlight,
}

impl SaveError {
    /// Create a new compression error
    pub fn compression<S: Into<String>>(msg: S) -> Self {
        Self::Compression(msg.into())
    }

    /// Create a new crypto error
    pub fn crypto<S: Into<String>>(msg: S) -> Self {
        Self::Crypto(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
