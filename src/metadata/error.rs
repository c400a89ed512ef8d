//! Error types for the embedded metadata codec

use thiserror::Error;

/// Embedded-metadata errors
///
/// This tier is best-effort: the orchestrator logs these and treats the
/// tier as having contributed nothing. They never abort a fan-out.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The image file could not be read or rewritten
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image container could not be parsed
    #[error("Image container error: {0}")]
    Image(#[from] img_parts::Error),
}
