//! Tag manager: orchestrates the three storage tiers
//!
//! The one type other code should call directly. Every mutation fans
//! out to the primary index, the embedded metadata (when the format
//! supports it) and the backup store; every read tries the index first
//! and falls back through the slower tiers, repairing the index when a
//! metadata hit occurs.
//!
//! Propagation policy: only [`TagError::FileNotFound`] (a caller-input
//! error) escapes from mutating calls. Failures inside a storage tier
//! are logged and degrade to "this tier contributed nothing" so a
//! broken backup can never block an index update. Read methods are
//! infallible and return empty defaults once the chain is exhausted.
//!
//! The manager is synchronous and holds no threads of its own, but it
//! is safe to call concurrently from a worker pool: each tier operation
//! is self-contained, writes to one path resolve last-writer-wins, and
//! writes to different paths never touch each other's records. One
//! in-flight call always completes its full fan-out; cancel bulk work
//! between calls, not within one.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::backup::BackupStore;
use crate::config::StorePaths;
use crate::identity;
use crate::index::{FavoriteEntry, TagIndex};
use crate::metadata;
use crate::vocab;
use crate::TagError;

/// Hybrid tag store over the three tiers
pub struct TagManager {
    index: TagIndex,
    backup: BackupStore,
}

impl TagManager {
    /// Open a manager over the given store locations
    ///
    /// # Errors
    ///
    /// Returns `TagError` if the primary index cannot be opened.
    pub fn open(paths: StorePaths) -> Result<Self, TagError> {
        let index = TagIndex::open(&paths.index_dir)?;
        let backup = BackupStore::new(paths.backup_file);
        Ok(Self { index, backup })
    }

    /// Build a manager from already-constructed stores
    ///
    /// The injection seam for tests and embedders that manage store
    /// lifecycles themselves.
    #[must_use]
    pub fn with_stores(index: TagIndex, backup: BackupStore) -> Self {
        Self { index, backup }
    }

    /// The primary index tier
    #[must_use]
    pub fn index(&self) -> &TagIndex {
        &self.index
    }

    /// The backup tier
    #[must_use]
    pub fn backup(&self) -> &BackupStore {
        &self.backup
    }

    /// Get the tags for a file
    ///
    /// Tries the index, then the embedded metadata (repairing the index
    /// on a hit), then the backup. A backup hit is *not* promoted into
    /// the index; that tier is the least trusted source.
    #[must_use]
    pub fn get_tags(&self, path: &Path) -> Vec<String> {
        match self.index.get_tags(path) {
            Ok(Some(tags)) if !tags.is_empty() => return tags,
            Ok(_) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "index read failed"),
        }

        match metadata::read_tags(path) {
            Ok(tags) if !tags.is_empty() => {
                debug!(path = %path.display(), "tags recovered from embedded metadata");
                let hash = self.compute_hash(path);
                if let Err(e) = self.index.upsert(path, hash, &tags, None) {
                    warn!(path = %path.display(), error = %e, "read-repair failed");
                }
                return tags;
            }
            Ok(_) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "metadata read failed"),
        }

        match self.backup.read_tags(path) {
            Ok(tags) => tags,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "backup read failed");
                Vec::new()
            }
        }
    }

    /// Replace the tags for a file with exactly the given set
    ///
    /// The input is canonicalized (deduplicated, trimmed, sorted) and
    /// written to all three tiers, discarding whatever was there
    /// before. The favorite flag is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::FileNotFound`] if the path does not exist.
    pub fn save_tags(&self, path: &Path, tags: &[String]) -> Result<(), TagError> {
        let clean = vocab::canonicalize(tags);
        self.write_tags_fan_out(path, &clean)
    }

    /// Add tags to a file, keeping the existing ones
    ///
    /// # Errors
    ///
    /// Returns [`TagError::FileNotFound`] if the path does not exist.
    pub fn add_tags(&self, path: &Path, tags: &[String]) -> Result<(), TagError> {
        let mut merged = self.get_tags(path);
        merged.extend(tags.iter().cloned());
        let clean = vocab::canonicalize(merged);
        self.write_tags_fan_out(path, &clean)
    }

    /// Remove the given tags from a file
    ///
    /// # Errors
    ///
    /// Returns [`TagError::FileNotFound`] if the path does not exist.
    pub fn remove_tags(&self, path: &Path, tags: &[String]) -> Result<(), TagError> {
        let remaining: Vec<String> = self
            .get_tags(path)
            .into_iter()
            .filter(|tag| !tags.contains(tag))
            .collect();
        let clean = vocab::canonicalize(remaining);
        self.write_tags_fan_out(path, &clean)
    }

    /// Get the favorite state for a file
    ///
    /// Same tier order as [`TagManager::get_tags`], with one asymmetry:
    /// only a `true` result from a slower tier is promoted into the
    /// index. A `false` could be a stale default racing an in-flight
    /// `true` write, so it is returned but never cached.
    #[must_use]
    pub fn get_favorite_status(&self, path: &Path) -> bool {
        match self.index.get_favorite(path) {
            Ok(Some(flag)) => return flag,
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "index read failed"),
        }

        match metadata::read_favorite(path) {
            Ok(Some(flag)) => {
                if flag {
                    debug!(path = %path.display(), "favorite recovered from embedded metadata");
                    let tags = self.get_tags(path);
                    let hash = self.compute_hash(path);
                    if let Err(e) = self.index.upsert(path, hash, &tags, Some(true)) {
                        warn!(path = %path.display(), error = %e, "read-repair failed");
                    }
                }
                return flag;
            }
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "metadata read failed"),
        }

        match self.backup.read_favorite(path) {
            Ok(flag) => flag,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "backup read failed");
                false
            }
        }
    }

    /// Set the favorite state for a file on all three tiers
    ///
    /// The stored tag set is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::FileNotFound`] if the path does not exist.
    pub fn set_favorite_status(&self, path: &Path, is_favorite: bool) -> Result<(), TagError> {
        if !path.exists() {
            return Err(TagError::FileNotFound(path.display().to_string()));
        }

        let tags = self.get_tags(path);
        let hash = self.compute_hash(path);

        if let Err(e) = self.index.upsert(path, hash, &tags, Some(is_favorite)) {
            warn!(path = %path.display(), error = %e, "index write failed");
        }
        if let Err(e) = metadata::write_favorite(path, is_favorite) {
            warn!(path = %path.display(), error = %e, "metadata write failed");
        }
        if let Err(e) = self.backup.write_favorite(path, is_favorite) {
            warn!(path = %path.display(), error = %e, "backup write failed");
        }
        Ok(())
    }

    /// Flip the favorite state for a file, returning the new state
    ///
    /// # Errors
    ///
    /// Returns [`TagError::FileNotFound`] if the path does not exist.
    pub fn toggle_favorite(&self, path: &Path) -> Result<bool, TagError> {
        let new_state = !self.get_favorite_status(path);
        self.set_favorite_status(path, new_state)?;
        Ok(new_state)
    }

    /// Search files by tag and favorite criteria
    ///
    /// Delegates to the primary index, which means tags known only to
    /// the slower tiers for files never read through
    /// [`TagManager::get_tags`] stay invisible here until a read warms
    /// the index. Paths whose file no longer exists are filtered out.
    #[must_use]
    pub fn search_by_tags(
        &self,
        include: &[String],
        match_all: bool,
        exclude: &[String],
        favorites_only: bool,
    ) -> Vec<PathBuf> {
        match self.index.search(include, match_all, exclude, favorites_only) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(error = %e, "search failed");
                Vec::new()
            }
        }
    }

    /// All known tags, priority vocabulary first, rest lexicographic
    #[must_use]
    pub fn get_all_tags(&self) -> Vec<String> {
        match self.index.list_all_tags() {
            Ok(tags) => tags,
            Err(e) => {
                warn!(error = %e, "tag listing failed");
                Vec::new()
            }
        }
    }

    /// All favorite files, most recently updated first
    ///
    /// Filtered to files that still exist, consistent with
    /// [`TagManager::search_by_tags`].
    #[must_use]
    pub fn get_favorite_images(&self) -> Vec<FavoriteEntry> {
        match self.index.favorites() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "favorite listing failed");
                Vec::new()
            }
        }
    }

    /// Flush the primary index to disk
    ///
    /// # Errors
    ///
    /// Returns `TagError` if the flush fails.
    pub fn flush(&self) -> Result<(), TagError> {
        self.index.flush()?;
        Ok(())
    }

    /// Write a canonical tag set to all three tiers
    fn write_tags_fan_out(&self, path: &Path, tags: &[String]) -> Result<(), TagError> {
        if !path.exists() {
            return Err(TagError::FileNotFound(path.display().to_string()));
        }

        let hash = self.compute_hash(path);

        if let Err(e) = self.index.upsert(path, hash, tags, None) {
            warn!(path = %path.display(), error = %e, "index write failed");
        }
        if let Err(e) = metadata::write_tags(path, tags) {
            warn!(path = %path.display(), error = %e, "metadata write failed");
        }
        if let Err(e) = self.backup.write_tags(path, tags) {
            warn!(path = %path.display(), error = %e, "backup write failed");
        }
        Ok(())
    }

    /// Identity hash, or `None` (logged) when hashing fails
    ///
    /// A failed hash skips only the hash field of the record, never the
    /// write itself.
    fn compute_hash(&self, path: &Path) -> Option<String> {
        match identity::compute(path) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "identity hash failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_png_file, create_test_file, TestStores};

    fn tags(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn save_tags_canonicalizes_input() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_test_file(&file).unwrap();

        stores
            .manager
            .save_tags(&file, &tags(&["sunset", "beach", "sunset", " beach "]))
            .unwrap();

        assert_eq!(stores.manager.get_tags(&file), tags(&["beach", "sunset"]));
    }

    #[test]
    fn save_tags_is_idempotent() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_test_file(&file).unwrap();

        stores.manager.save_tags(&file, &tags(&["x", "y"])).unwrap();
        stores.manager.save_tags(&file, &tags(&["y", "x"])).unwrap();

        assert_eq!(stores.manager.get_tags(&file), tags(&["x", "y"]));
    }

    #[test]
    fn add_tags_unions_with_existing() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_test_file(&file).unwrap();

        stores.manager.save_tags(&file, &tags(&["beach"])).unwrap();
        stores.manager.add_tags(&file, &tags(&["sunset", "beach"])).unwrap();

        assert_eq!(stores.manager.get_tags(&file), tags(&["beach", "sunset"]));
    }

    #[test]
    fn remove_tags_subtracts() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_test_file(&file).unwrap();

        stores.manager.save_tags(&file, &tags(&["beach", "sunset"])).unwrap();
        stores.manager.remove_tags(&file, &tags(&["beach"])).unwrap();

        assert_eq!(stores.manager.get_tags(&file), tags(&["sunset"]));
    }

    #[test]
    fn mutations_on_missing_files_fail() {
        let stores = TestStores::new();
        let missing = stores.file("missing.png");

        assert!(matches!(
            stores.manager.save_tags(&missing, &tags(&["x"])),
            Err(TagError::FileNotFound(_))
        ));
        assert!(matches!(
            stores.manager.set_favorite_status(&missing, true),
            Err(TagError::FileNotFound(_))
        ));
    }

    #[test]
    fn tag_writes_never_clear_favorite_state() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_test_file(&file).unwrap();

        stores.manager.set_favorite_status(&file, true).unwrap();
        stores.manager.save_tags(&file, &[]).unwrap();

        assert!(stores.manager.get_favorite_status(&file));
    }

    #[test]
    fn favorite_writes_never_clear_tags() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_test_file(&file).unwrap();

        stores.manager.save_tags(&file, &tags(&["keep"])).unwrap();
        stores.manager.set_favorite_status(&file, true).unwrap();

        assert_eq!(stores.manager.get_tags(&file), tags(&["keep"]));
    }

    #[test]
    fn toggle_flips_and_reports_new_state() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_test_file(&file).unwrap();

        assert!(stores.manager.toggle_favorite(&file).unwrap());
        assert!(stores.manager.get_favorite_status(&file));
        assert!(!stores.manager.toggle_favorite(&file).unwrap());
        assert!(!stores.manager.get_favorite_status(&file));
    }

    #[test]
    fn backup_only_tags_are_served_without_promotion() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_test_file(&file).unwrap();

        stores
            .manager
            .backup()
            .write_tags(&file, &tags(&["recovered"]))
            .unwrap();

        assert_eq!(stores.manager.get_tags(&file), tags(&["recovered"]));
        // No read-repair from the least trusted tier
        assert_eq!(stores.manager.index().get_tags(&file).unwrap(), None);
    }

    #[test]
    fn metadata_only_tags_repair_the_index() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_png_file(&file).unwrap();

        crate::metadata::write_tags(&file, &tags(&["embedded"])).unwrap();
        assert_eq!(stores.manager.index().get_tags(&file).unwrap(), None);

        assert_eq!(stores.manager.get_tags(&file), tags(&["embedded"]));
        // Second read is served by the index alone
        assert_eq!(
            stores.manager.index().get_tags(&file).unwrap(),
            Some(tags(&["embedded"]))
        );
        let record = stores.manager.index().get_record(&file).unwrap().unwrap();
        assert!(record.file_hash.is_some());
    }

    #[test]
    fn favorite_true_is_promoted_from_metadata() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_png_file(&file).unwrap();

        crate::metadata::write_favorite(&file, true).unwrap();

        assert!(stores.manager.get_favorite_status(&file));
        assert_eq!(stores.manager.index().get_favorite(&file).unwrap(), Some(true));
    }

    #[test]
    fn favorite_false_is_not_promoted_from_metadata() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_png_file(&file).unwrap();

        crate::metadata::write_favorite(&file, false).unwrap();

        assert!(!stores.manager.get_favorite_status(&file));
        // The asymmetry is deliberate: false stays uncached
        assert_eq!(stores.manager.index().get_favorite(&file).unwrap(), None);
    }

    #[test]
    fn backup_favorite_is_last_resort() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_test_file(&file).unwrap();

        stores.manager.backup().write_favorite(&file, true).unwrap();

        assert!(stores.manager.get_favorite_status(&file));
        assert_eq!(stores.manager.index().get_favorite(&file).unwrap(), None);
    }

    #[test]
    fn fan_out_reaches_all_tiers_for_png() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_png_file(&file).unwrap();

        stores.manager.save_tags(&file, &tags(&["everywhere"])).unwrap();

        assert_eq!(
            stores.manager.index().get_tags(&file).unwrap(),
            Some(tags(&["everywhere"]))
        );
        assert_eq!(
            crate::metadata::read_tags(&file).unwrap(),
            tags(&["everywhere"])
        );
        assert_eq!(
            stores.manager.backup().read_tags(&file).unwrap(),
            tags(&["everywhere"])
        );
    }

    #[test]
    fn non_png_files_skip_the_metadata_tier() {
        let stores = TestStores::new();
        let file = stores.file("a.webp");
        create_test_file(&file).unwrap();

        stores.manager.save_tags(&file, &tags(&["indexed"])).unwrap();

        assert_eq!(stores.manager.get_tags(&file), tags(&["indexed"]));
        assert_eq!(
            stores.manager.backup().read_tags(&file).unwrap(),
            tags(&["indexed"])
        );
    }

    #[test]
    fn search_and_listing_delegate_to_index() {
        let stores = TestStores::new();
        let a = stores.file("a.png");
        let b = stores.file("b.png");
        create_test_file(&a).unwrap();
        create_test_file(&b).unwrap();

        stores.manager.save_tags(&a, &tags(&["x", "y"])).unwrap();
        stores.manager.save_tags(&b, &tags(&["x"])).unwrap();

        let found = stores.manager.search_by_tags(&tags(&["x"]), true, &tags(&["y"]), false);
        assert_eq!(found, vec![b.clone()]);

        assert_eq!(stores.manager.get_all_tags(), tags(&["x", "y"]));
    }

    #[test]
    fn favorite_images_lists_current_favorites() {
        let stores = TestStores::new();
        let file = stores.file("a.png");
        create_test_file(&file).unwrap();

        stores.manager.save_tags(&file, &tags(&["x"])).unwrap();
        stores.manager.set_favorite_status(&file, true).unwrap();

        let favorites = stores.manager.get_favorite_images();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].path, file);
        assert_eq!(favorites[0].file_name, "a.png");
    }
}
