use std::path::PathBuf;

use thiserror::Error;

use crate::types::MediaType;

/// Errors that can occur during Kirikae core operations.
///
/// Matching failures and destination conflicts are not errors: they are
/// recorded on the plan item as `MANUAL` or `CONFLICT` statuses.
#[derive(Debug, Error)]
pub enum KirikaeError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path the operation was acting on.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The move target exists and overwriting was not requested.
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// The file to move is not on disk.
    #[error("source file not found: {0}")]
    SourceMissing(PathBuf),

    /// A moved file no longer hashes to its recorded digest.
    #[error("hash mismatch for {path}: expected {expected}, found {actual}")]
    HashMismatch {
        /// The file that was hashed.
        path: PathBuf,
        /// Digest recorded at scan time.
        expected: String,
        /// Digest computed after the move.
        actual: String,
    },

    /// The rule set cannot place this kind of media.
    #[error("media type {media_type} is not supported by the {platform} rule set")]
    UnsupportedMediaType {
        /// The rejected media type.
        media_type: MediaType,
        /// The rule set's platform name.
        platform: String,
    },

    /// Undo refused to overwrite a file sitting at the original location.
    #[error("cannot restore {0}: source file already exists")]
    UndoSourceExists(PathBuf),

    /// Undo could not find the file it is supposed to move back.
    #[error("cannot restore {0}: destination file does not exist")]
    UndoDestinationMissing(PathBuf),

    /// A persisted plan violates a structural rule.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// An oracle adapter failed to answer.
    #[error("oracle error: {0}")]
    Oracle(String),

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// Plan JSON could not be encoded or decoded.
    #[error("plan serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KirikaeError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for Kirikae operations.
pub type Result<T> = std::result::Result<T, KirikaeError>;
