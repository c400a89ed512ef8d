//! Primary index: the authoritative fast-path store
//!
//! Maps file paths to [`TagRecord`]s using sled as the embedded database
//! backend. Every read the orchestrator serves tries this tier first and
//! every search is answered from it alone.
//!
//! Uses multiple sled trees for efficient indexing:
//! - `records`: main tree mapping file path -> `TagRecord`
//! - `tags`: reverse index mapping tag -> file paths
//!
//! A record write is a single-key replace, so a concurrent reader never
//! observes a partially written record for a path. The reverse index is
//! maintained with read-modify-write cycles across both trees, so all
//! writes are serialized behind one lock; reads stay lock-free.

use chrono::{DateTime, Utc};
use sled::{Db, Tree};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub mod error;
pub mod types;

pub use error::IndexError;
pub use types::{FavoriteEntry, PathKey, PathString, TagRecord};

use crate::vocab;

/// Sled-backed index over all tracked files
///
/// Uses two trees for efficient bidirectional lookups:
/// - `records` tree: `file_path` -> `TagRecord`
/// - `tags` tree: tag -> Vec<`file_path`> reverse index
pub struct TagIndex {
    db: Db,
    records: Tree,
    tags: Tree,
    write_lock: Mutex<()>,
}

impl TagIndex {
    /// Opens or creates an index at the specified directory
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if the database cannot be opened or if the
    /// internal trees cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let db = sled::open(path)?;
        let records = db.open_tree("records")?;
        let tags = db.open_tree("tags")?;
        Ok(Self {
            db,
            records,
            tags,
            write_lock: Mutex::new(()),
        })
    }

    /// Insert or replace the record for a path
    ///
    /// Replaces any existing record wholesale (last-writer-wins). Fields
    /// with carry-forward semantics are filled from the previous record:
    /// `is_favorite` when `None` is passed (so a tag write never clears
    /// favorite state, and vice versa) and `created_at` always.
    ///
    /// Writes to the same path resolve last-writer-wins; the write lock
    /// keeps the reverse-index read-modify-write cycles of concurrent
    /// upserts from losing each other's updates.
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if the path contains invalid UTF-8, database
    /// operations fail, or serialization errors occur.
    pub fn upsert(
        &self,
        path: &Path,
        file_hash: Option<String>,
        tags: &[String],
        is_favorite: Option<bool>,
    ) -> Result<(), IndexError> {
        let _guard = self.write_lock.lock().map_err(|_| IndexError::Poisoned)?;

        let path_str = PathString::new(path)?;
        let key: Vec<u8> = PathKey::new(path).try_into()?;
        let previous = self.get_record(path)?;

        if let Some(prev) = &previous {
            self.remove_from_tag_index(&path_str, &prev.tags)?;
        }

        let now = Utc::now();
        let record = TagRecord {
            file_path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_hash,
            tags: tags.to_vec(),
            is_favorite: is_favorite
                .or(previous.as_ref().map(|p| p.is_favorite))
                .unwrap_or(false),
            created_at: previous.as_ref().map_or(now, |p| p.created_at),
            updated_at: now,
            file_modified_at: fs::metadata(path)
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
        };

        let value = bincode::serde::encode_to_vec(&record, bincode::config::standard())?;
        self.records.insert(key, value)?;

        self.add_to_tag_index(&path_str, tags)?;

        Ok(())
    }

    /// Get the current record for a path, if any
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if database operations fail or
    /// deserialization errors occur.
    pub fn get_record<P: AsRef<Path>>(&self, path: P) -> Result<Option<TagRecord>, IndexError> {
        let key: Vec<u8> = PathKey::new(path).try_into()?;

        match self.records.get(key.as_slice())? {
            Some(value) => {
                let (record, _): (TagRecord, usize) =
                    bincode::serde::decode_from_slice(&value, bincode::config::standard())?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Get the stored tag set for a path
    ///
    /// Returns `None` when no record exists for the path, which is
    /// distinct from `Some(vec![])` ("known, and empty").
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if database operations fail or
    /// deserialization errors occur.
    pub fn get_tags<P: AsRef<Path>>(&self, path: P) -> Result<Option<Vec<String>>, IndexError> {
        Ok(self.get_record(path)?.map(|r| r.tags))
    }

    /// Get the stored favorite flag for a path
    ///
    /// Returns `None` when no record exists, signalling the caller to
    /// fall back to the slower tiers. "Known false" is `Some(false)`.
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if database operations fail or
    /// deserialization errors occur.
    pub fn get_favorite<P: AsRef<Path>>(&self, path: P) -> Result<Option<bool>, IndexError> {
        Ok(self.get_record(path)?.map(|r| r.is_favorite))
    }

    /// Search all current records by tag and favorite criteria
    ///
    /// A record matches when:
    /// - `favorites_only` implies its favorite flag is set,
    /// - none of `exclude` appear in its tag set,
    /// - `include` is empty, or all of it (`match_all`) respectively at
    ///   least one tag (`!match_all`) appears in its tag set.
    ///
    /// Paths whose backing file no longer exists are filtered out of the
    /// result. Results are sorted by path for deterministic output.
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if database iteration fails or
    /// deserialization errors occur.
    pub fn search(
        &self,
        include: &[String],
        match_all: bool,
        exclude: &[String],
        favorites_only: bool,
    ) -> Result<Vec<PathBuf>, IndexError> {
        let mut matches = Vec::new();

        for entry in &self.records {
            let (_, value) = entry?;
            let (record, _): (TagRecord, usize) =
                bincode::serde::decode_from_slice(&value, bincode::config::standard())?;

            if favorites_only && !record.is_favorite {
                continue;
            }
            if exclude.iter().any(|tag| record.tags.contains(tag)) {
                continue;
            }
            if !include.is_empty() {
                let hit = if match_all {
                    include.iter().all(|tag| record.tags.contains(tag))
                } else {
                    include.iter().any(|tag| record.tags.contains(tag))
                };
                if !hit {
                    continue;
                }
            }
            if !record.file_path.exists() {
                continue;
            }

            matches.push(record.file_path);
        }

        matches.sort();
        Ok(matches)
    }

    /// Get all unique tags in the index, in display order
    ///
    /// Priority vocabulary first, remaining tags lexicographic; see
    /// [`crate::vocab::display_order`].
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if database iteration fails.
    pub fn list_all_tags(&self) -> Result<Vec<String>, IndexError> {
        let tags: Vec<String> = self
            .tags
            .iter()
            .filter_map(|result| {
                result
                    .ok()
                    .and_then(|(key, _)| String::from_utf8(key.to_vec()).ok())
            })
            .collect();
        Ok(vocab::display_order(tags))
    }

    /// List all favorite files, most recently updated first
    ///
    /// Entries whose backing file no longer exists are filtered out,
    /// consistent with [`TagIndex::search`].
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if database iteration fails or
    /// deserialization errors occur.
    pub fn favorites(&self) -> Result<Vec<FavoriteEntry>, IndexError> {
        let mut entries = Vec::new();

        for entry in &self.records {
            let (_, value) = entry?;
            let (record, _): (TagRecord, usize) =
                bincode::serde::decode_from_slice(&value, bincode::config::standard())?;

            if record.is_favorite && record.file_path.exists() {
                entries.push(FavoriteEntry {
                    path: record.file_path,
                    file_name: record.file_name,
                    updated_at: record.updated_at,
                });
            }
        }

        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries)
    }

    /// Get the number of records in the index
    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Flush all pending writes to disk
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if the flush operation fails.
    pub fn flush(&self) -> Result<(), IndexError> {
        self.db.flush()?;
        Ok(())
    }

    // Private helper methods for managing the reverse tag index

    /// Add file to tag index for all specified tags
    fn add_to_tag_index(&self, file_path: &PathString, tags: &[String]) -> Result<(), IndexError> {
        for tag in tags {
            let tag_key = tag.as_bytes();

            let mut files: Vec<String> = match self.tags.get(tag_key)? {
                Some(value) => {
                    let (files, _): (Vec<String>, usize) =
                        bincode::decode_from_slice(&value, bincode::config::standard())?;
                    files
                }
                None => Vec::new(),
            };

            if !files.iter().any(|f| f.as_str() == &**file_path) {
                files.push(file_path.as_ref().to_string());
            }

            let encoded = bincode::encode_to_vec(&files, bincode::config::standard())?;
            self.tags.insert(tag_key, encoded)?;
        }
        Ok(())
    }

    /// Remove file from tag index for all specified tags
    ///
    /// Tags left with no files are deleted from the index entirely.
    fn remove_from_tag_index(
        &self,
        file_path: &PathString,
        tags: &[String],
    ) -> Result<(), IndexError> {
        for tag in tags {
            let tag_key = tag.as_bytes();

            if let Some(value) = self.tags.get(tag_key)? {
                let (mut files, _): (Vec<String>, usize) =
                    bincode::decode_from_slice(&value, bincode::config::standard())?;

                files.retain(|f| f.as_str() != &**file_path);

                if files.is_empty() {
                    self.tags.remove(tag_key)?;
                } else {
                    let encoded = bincode::encode_to_vec(&files, bincode::config::standard())?;
                    self.tags.insert(tag_key, encoded)?;
                }
            }
        }
        Ok(())
    }
}

impl Drop for TagIndex {
    fn drop(&mut self) {
        // Best-effort flush on drop. Errors are ignored since we can't
        // propagate them from Drop. Callers should explicitly flush()
        // if they need guaranteed durability.
        let _ = self.db.flush();
    }
}
