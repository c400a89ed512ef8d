//! Pictag - hybrid tag persistence for local image collections
//!
//! This library keeps tag and favorite state for image files in three
//! storage tiers and presents them behind one API:
//!
//! - [`index::TagIndex`]: a fast, queryable embedded database (the
//!   authoritative tier, used for all searches)
//! - [`metadata`]: tags embedded in the image file's own metadata
//!   container, so they travel with the file
//! - [`backup::BackupStore`]: a plain key-value backup consulted as a
//!   last resort when the faster tiers know nothing
//!
//! Mutations fan out to all three tiers; reads fall back through them
//! and repair the fast tier when a slower tier produces a hit. See
//! [`manager::TagManager`] for the orchestration rules.

use thiserror::Error;

pub mod backup;
pub mod bulk;
pub mod config;
pub mod identity;
pub mod index;
pub mod manager;
pub mod metadata;
pub mod vocab;

#[cfg(test)]
pub mod testing;

pub use backup::BackupStore;
pub use config::StorePaths;
pub use index::TagIndex;
pub use index::types::{FavoriteEntry, TagRecord};
pub use manager::TagManager;

/// Error enum, contains all failure states of the library
#[derive(Debug, Error)]
pub enum TagError {
    /// A mutating call targeted a path that does not exist. This is the
    /// one error that callers are expected to surface to the user.
    #[error("File not found: {0}")]
    FileNotFound(String),
    /// Primary index error
    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),
    /// Embedded metadata error
    #[error("Metadata error: {0}")]
    Metadata(#[from] metadata::MetadataError),
    /// Backup store error
    #[error("Backup error: {0}")]
    Backup(#[from] backup::BackupError),
    /// Identity hash error
    #[error("Hash error: {0}")]
    Identity(#[from] identity::IdentityError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
