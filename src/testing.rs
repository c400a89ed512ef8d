//! Testing utilities for pictag
//!
//! Helper types and functions for writing tests: a `TestStores` wrapper
//! holding a fully wired [`TagManager`] over temporary storage, fixture
//! file creators, and a minimal valid PNG for metadata tests.
//!
//! Only available when compiled with `cfg(test)`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::backup::BackupStore;
use crate::index::TagIndex;
use crate::manager::TagManager;

/// A complete, valid 1x1 RGBA PNG (signature, IHDR, IDAT, IEND)
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x64,
    0x60, 0xf8, 0x5f, 0x0f, 0x00, 0x02, 0x87, 0x01, 0x80, 0xeb, 0x47, 0xba, 0x92, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// A tag manager over temporary stores, cleaned up on drop
///
/// The temp directory holds the index, the backup file and any fixture
/// files created through [`TestStores::file`].
pub struct TestStores {
    dir: TempDir,
    pub manager: TagManager,
}

impl TestStores {
    /// Create a manager over fresh temporary stores
    ///
    /// # Panics
    /// Panics if the temporary directory or the index cannot be created.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let index = TagIndex::open(dir.path().join("index")).expect("failed to open test index");
        let backup = BackupStore::new(dir.path().join("backup.json"));
        let manager = TagManager::with_stores(index, backup);
        Self { dir, manager }
    }

    /// Path for a fixture file inside the temp directory (not created)
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for TestStores {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a test file with default content
///
/// # Errors
/// Returns an `io::Error` if the file cannot be created or written.
pub fn create_test_file(path: impl AsRef<Path>) -> std::io::Result<()> {
    create_test_file_with_content(path, b"test content")
}

/// Create a test file with custom content
///
/// # Errors
/// Returns an `io::Error` if the file cannot be created or written.
pub fn create_test_file_with_content(path: impl AsRef<Path>, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content)?;
    Ok(())
}

/// Create a small valid PNG file suitable for metadata round-trips
///
/// # Errors
/// Returns an `io::Error` if the file cannot be created or written.
pub fn create_png_file(path: impl AsRef<Path>) -> std::io::Result<()> {
    create_test_file_with_content(path, TINY_PNG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stores_start_empty() {
        let stores = TestStores::new();
        assert_eq!(stores.manager.index().count(), 0);
    }

    #[test]
    fn fixture_png_parses_as_png() {
        let stores = TestStores::new();
        let file = stores.file("fixture.png");
        create_png_file(&file).unwrap();

        assert_eq!(crate::metadata::read_tags(&file).unwrap(), Vec::<String>::new());
    }
}
