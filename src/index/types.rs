//! Record and key types for the primary index
//!
//! - **`TagRecord`**: the one logical record per tracked file (tags,
//!   favorite flag, identity hash, timestamps)
//! - **`FavoriteEntry`**: a slim projection returned by favorite listings
//! - **`PathKey`**: wrapper for `PathBuf` serialized to `Vec<u8>` for
//!   database keys
//! - **`PathString`**: wrapper that guarantees a path has a valid UTF-8
//!   representation (required for reverse-index values)

use super::error::IndexError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One record per tracked file in the primary index
///
/// Old versions are superseded on write, never accumulated: the index
/// holds at most one current record per path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Absolute path of the tracked file; the natural key
    pub file_path: PathBuf,
    /// Basename, stored for display convenience
    pub file_name: String,
    /// Identity hash of the file content, `None` when hashing failed
    pub file_hash: Option<String>,
    /// Canonical (deduplicated, sorted) tag set
    pub tags: Vec<String>,
    /// Favorite flag; independent lifecycle from tags
    pub is_favorite: bool,
    /// When the record was first created
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
    /// mtime of the underlying file at last write, informational only
    pub file_modified_at: Option<DateTime<Utc>>,
}

/// A favorite file as returned by [`super::TagIndex::favorites`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteEntry {
    pub path: PathBuf,
    pub file_name: String,
    pub updated_at: DateTime<Utc>,
}

/// Wrapper for `PathBuf` that can be converted to `Vec<u8>` for database keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey(pub PathBuf);

impl PathKey {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self(path.as_ref().to_path_buf())
    }

    /// # Errors
    ///
    /// Returns `IndexError` if the bytes cannot be deserialized into a `PathBuf`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IndexError> {
        let (path, _): (PathBuf, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(Self(path))
    }
}

impl TryFrom<PathKey> for Vec<u8> {
    type Error = IndexError;

    fn try_from(key: PathKey) -> Result<Self, Self::Error> {
        Ok(bincode::encode_to_vec(&key.0, bincode::config::standard())?)
    }
}

impl AsRef<Path> for PathKey {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Wrapper for a path that guarantees valid UTF-8 string representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathString(String);

impl PathString {
    /// # Errors
    ///
    /// Returns `IndexError` if the path contains invalid UTF-8.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        path.as_ref()
            .to_str()
            .ok_or_else(|| IndexError::Serialize("Invalid UTF-8 in path".into()))
            .map(|s| Self(s.to_string()))
    }
}

impl AsRef<str> for PathString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for PathString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
