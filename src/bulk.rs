//! Parallel batch tagging
//!
//! Applies per-file tag writes (for example the output of an external
//! prompt analyzer) across many files at once, one full
//! [`TagManager::add_tags`] fan-out per file on a rayon worker pool
//! sized to the available cores. The manager itself stays synchronous;
//! this module only spreads independent per-file calls across threads,
//! which the manager's tier operations are designed to tolerate.
//!
//! Cancellation granularity is the individual file: a batch can be cut
//! short between files by splitting the input, but a file already in
//! flight always completes its whole fan-out.

use rayon::prelude::*;
use std::path::PathBuf;

use crate::manager::TagManager;
use crate::TagError;

/// Outcome counts of a batch operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BulkSummary {
    /// Files whose write completed
    pub tagged: usize,
    /// Files that no longer existed at write time
    pub missing: usize,
    /// Files that failed for any other reason
    pub failed: usize,
}

impl BulkSummary {
    fn merge(self, other: Self) -> Self {
        Self {
            tagged: self.tagged + other.tagged,
            missing: self.missing + other.missing,
            failed: self.failed + other.failed,
        }
    }

    fn from_result(result: &Result<(), TagError>) -> Self {
        match result {
            Ok(()) => Self { tagged: 1, ..Self::default() },
            Err(TagError::FileNotFound(_)) => Self { missing: 1, ..Self::default() },
            Err(_) => Self { failed: 1, ..Self::default() },
        }
    }
}

/// Add tags to many files in parallel
///
/// Each item is one `(path, tags)` unit of work; failures are counted,
/// not propagated, so one bad file never aborts the rest of the batch.
#[must_use]
pub fn add_tags_batch(manager: &TagManager, items: &[(PathBuf, Vec<String>)]) -> BulkSummary {
    items
        .par_iter()
        .map(|(path, tags)| BulkSummary::from_result(&manager.add_tags(path, tags)))
        .reduce(BulkSummary::default, BulkSummary::merge)
}

/// Replace tags on many files in parallel
///
/// Full-replace semantics per file, otherwise identical to
/// [`add_tags_batch`].
#[must_use]
pub fn save_tags_batch(manager: &TagManager, items: &[(PathBuf, Vec<String>)]) -> BulkSummary {
    items
        .par_iter()
        .map(|(path, tags)| BulkSummary::from_result(&manager.save_tags(path, tags)))
        .reduce(BulkSummary::default, BulkSummary::merge)
}
