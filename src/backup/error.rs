//! Error types for the backup store

use thiserror::Error;

/// Backup-store errors
///
/// Same degradation contract as the metadata tier: the orchestrator logs
/// these and carries on; a backup failure never blocks the faster tiers.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The backing file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be parsed or serialized
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A previous writer panicked while holding the store lock
    #[error("Backup store lock poisoned")]
    Poisoned,
}
