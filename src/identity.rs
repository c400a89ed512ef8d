//! Partial-content file fingerprinting
//!
//! Computes a stable identity hash for a file without reading it fully:
//! the first and last [`SAMPLE_BYTES`] of the file plus its total size
//! are fed to blake3. Good enough to detect "same bytes at this path"
//! across accesses; not a cryptographic commitment to the content.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use thiserror::Error;

/// How many bytes to sample from each end of the file
pub const SAMPLE_BYTES: u64 = 8 * 1024;

/// Errors raised while computing an identity hash
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The file could not be opened or read
    #[error("I/O error while hashing: {0}")]
    Io(#[from] std::io::Error),
}

/// Compute the identity hash for a file
///
/// Reads the first and last [`SAMPLE_BYTES`] of the file (the regions
/// overlap naturally for small files), appends the decimal file size and
/// hashes the combination. The result is a lowercase hex string.
///
/// # Errors
///
/// Returns `IdentityError` if the path does not exist or cannot be read.
/// Callers are expected to treat a failed hash as "store this write
/// without an identity hash," not as a fatal condition.
pub fn compute<P: AsRef<Path>>(path: P) -> Result<String, IdentityError> {
    let mut file = File::open(path.as_ref())?;
    let size = file.metadata()?.len();
    let sample = SAMPLE_BYTES.min(size);

    let mut head = vec![0u8; sample as usize];
    file.read_exact(&mut head)?;

    let mut tail = vec![0u8; sample as usize];
    file.seek(SeekFrom::End(-(sample as i64)))?;
    file.read_exact(&mut tail)?;

    let mut hasher = blake3::Hasher::new();
    hasher.update(&head);
    hasher.update(&tail);
    hasher.update(size.to_string().as_bytes());
    Ok(hasher.finalize().to_hex().to_string())
}
