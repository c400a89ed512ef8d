//! Error types for the primary index
//!
//! All failures of the sled-backed index tier are collected here so the
//! orchestrator can pattern-match on "hard error" versus "no record" at
//! the tier boundary.

use thiserror::Error;

/// Primary-index errors
#[derive(Debug, Error)]
pub enum IndexError {
    /// Represents a sled database error
    #[error("Database error: {0}")]
    Sled(#[from] sled::Error),

    /// Represents a bincode decoding error
    #[error("Error while decoding data: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// Represents a bincode encoding error
    #[error("Error while encoding data: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Generic serialization error (e.g., invalid UTF-8 in paths)
    #[error("Error during serialization: {0}")]
    Serialize(String),

    /// A previous writer panicked while holding the write lock
    #[error("Index write lock poisoned")]
    Poisoned,
}
