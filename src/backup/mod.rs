//! Backup store: last-resort recovery tier
//!
//! A small key-value store independent of both the primary index and
//! the image files themselves, so tag and favorite state survives loss
//! of either. Entries are keyed per folder + filename (stable as long
//! as the file stays in place), mirrored into one typed JSON document.
//!
//! The schema is validated once at this boundary by serde; nothing
//! downstream needs to inspect shapes at runtime. Each mutation is a
//! self-contained load-modify-save under a process-local mutex, so
//! concurrent callers cannot interleave partial writes. There is no
//! search capability here on purpose: this tier is consulted only when
//! both faster tiers miss.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub mod error;

pub use error::BackupError;

/// On-disk schema of the backup document
#[derive(Debug, Default, Serialize, Deserialize)]
struct BackupData {
    /// folder -> filename -> tags
    #[serde(default)]
    tags: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// folder -> filename -> favorite flag
    #[serde(default)]
    favorites: BTreeMap<String, BTreeMap<String, bool>>,
}

/// JSON-file-backed recovery store
///
/// The backing path is injected by whoever constructs the store; there
/// is no global settings handle.
pub struct BackupStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl BackupStore {
    /// Create a store over the given backing file
    ///
    /// The file is created lazily on first write.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mirror the tag set for a file
    ///
    /// # Errors
    ///
    /// Returns `BackupError` if the backing file cannot be read,
    /// parsed, or rewritten.
    pub fn write_tags(&self, file: &Path, tags: &[String]) -> Result<(), BackupError> {
        let (folder, name) = split_key(file);
        let _guard = self.lock.lock().map_err(|_| BackupError::Poisoned)?;

        let mut data = self.load()?;
        data.tags.entry(folder).or_default().insert(name, tags.to_vec());
        self.store(&data)
    }

    /// Read the mirrored tag set for a file, empty when absent
    ///
    /// # Errors
    ///
    /// Returns `BackupError` if the backing file cannot be read or
    /// parsed.
    pub fn read_tags(&self, file: &Path) -> Result<Vec<String>, BackupError> {
        let (folder, name) = split_key(file);
        let _guard = self.lock.lock().map_err(|_| BackupError::Poisoned)?;

        let data = self.load()?;
        Ok(data
            .tags
            .get(&folder)
            .and_then(|files| files.get(&name))
            .cloned()
            .unwrap_or_default())
    }

    /// Mirror the favorite flag for a file
    ///
    /// # Errors
    ///
    /// Returns `BackupError` if the backing file cannot be read,
    /// parsed, or rewritten.
    pub fn write_favorite(&self, file: &Path, is_favorite: bool) -> Result<(), BackupError> {
        let (folder, name) = split_key(file);
        let _guard = self.lock.lock().map_err(|_| BackupError::Poisoned)?;

        let mut data = self.load()?;
        data.favorites.entry(folder).or_default().insert(name, is_favorite);
        self.store(&data)
    }

    /// Read the mirrored favorite flag for a file, false when absent
    ///
    /// # Errors
    ///
    /// Returns `BackupError` if the backing file cannot be read or
    /// parsed.
    pub fn read_favorite(&self, file: &Path) -> Result<bool, BackupError> {
        let (folder, name) = split_key(file);
        let _guard = self.lock.lock().map_err(|_| BackupError::Poisoned)?;

        let data = self.load()?;
        Ok(data
            .favorites
            .get(&folder)
            .and_then(|files| files.get(&name))
            .copied()
            .unwrap_or(false))
    }

    fn load(&self) -> Result<BackupData, BackupError> {
        if !self.path.exists() {
            return Ok(BackupData::default());
        }
        let raw = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    fn store(&self, data: &BackupData) -> Result<(), BackupError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_vec_pretty(data)?;
        // Write to a sibling file and rename so a crash mid-write
        // leaves the previous document intact.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Split a file path into its (folder, filename) backup key
fn split_key(file: &Path) -> (String, String) {
    let folder = file
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (folder, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::create_test_file_with_content;
    use tempfile::TempDir;

    fn tags(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn tags_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = BackupStore::new(dir.path().join("backup.json"));
        let file = Path::new("/photos/trip/a.png");

        store.write_tags(file, &tags(&["beach", "sunset"])).unwrap();
        assert_eq!(store.read_tags(file).unwrap(), tags(&["beach", "sunset"]));
    }

    #[test]
    fn absent_entries_read_as_defaults() {
        let dir = TempDir::new().unwrap();
        let store = BackupStore::new(dir.path().join("backup.json"));
        let file = Path::new("/photos/unknown.png");

        assert_eq!(store.read_tags(file).unwrap(), Vec::<String>::new());
        assert!(!store.read_favorite(file).unwrap());
    }

    #[test]
    fn files_in_same_folder_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = BackupStore::new(dir.path().join("backup.json"));

        store
            .write_tags(Path::new("/photos/a.png"), &tags(&["one"]))
            .unwrap();
        store
            .write_tags(Path::new("/photos/b.png"), &tags(&["two"]))
            .unwrap();

        assert_eq!(store.read_tags(Path::new("/photos/a.png")).unwrap(), tags(&["one"]));
        assert_eq!(store.read_tags(Path::new("/photos/b.png")).unwrap(), tags(&["two"]));
    }

    #[test]
    fn favorites_and_tags_use_separate_namespaces() {
        let dir = TempDir::new().unwrap();
        let store = BackupStore::new(dir.path().join("backup.json"));
        let file = Path::new("/photos/a.png");

        store.write_favorite(file, true).unwrap();
        assert!(store.read_favorite(file).unwrap());
        assert_eq!(store.read_tags(file).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.json");
        let file = Path::new("/photos/a.png");

        BackupStore::new(path.clone())
            .write_tags(file, &tags(&["kept"]))
            .unwrap();

        let reopened = BackupStore::new(path);
        assert_eq!(reopened.read_tags(file).unwrap(), tags(&["kept"]));
    }

    #[test]
    fn rewrite_replaces_document_without_leaving_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.json");
        let file = Path::new("/photos/a.png");

        // A stale scratch file from an interrupted earlier write must
        // not survive or confuse the next rewrite.
        create_test_file_with_content(&path.with_extension("json.tmp"), b"garbage").unwrap();

        let store = BackupStore::new(path.clone());
        store.write_tags(file, &tags(&["first"])).unwrap();
        store.write_tags(file, &tags(&["second"])).unwrap();

        assert_eq!(store.read_tags(file).unwrap(), tags(&["second"]));
        assert!(!path.with_extension("json.tmp").exists());
        assert!(serde_json::from_slice::<serde_json::Value>(&fs::read(&path).unwrap()).is_ok());
    }

    #[test]
    fn corrupt_backing_file_is_an_error_not_a_panic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.json");
        create_test_file_with_content(&path, b"{ not json").unwrap();

        let store = BackupStore::new(path);
        assert!(store.read_tags(Path::new("/photos/a.png")).is_err());
    }
}
