//! Error values returned by every map operation.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MapError>;

/// Every failure a map operation can report.
///
/// `EndOfIteration` is a sentinel rather than a true failure: it marks the
/// end of a cursor walk started with `iterate(true)`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// The map has been released and no longer owns a slot table.
    #[error("map is not initialized")]
    NotInitialized,

    /// A zero-length key was supplied.
    #[error("key must be at least one byte long")]
    InvalidKeySize,

    /// A configuration value was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// No pair is stored under the requested key.
    #[error("key not found")]
    KeyNotFound,

    /// Allocating the slot table or a chain node failed.
    #[error("out of memory")]
    OutOfMemory,

    /// The cursor has walked past the last pair.
    #[error("end of iteration")]
    EndOfIteration,

    /// The map was structurally modified after the cursor was reset.
    #[error("cursor invalidated by a structural mutation")]
    CursorInvalidated,

    /// The slot table is already sized to the largest prime.
    #[error("slot table cannot grow past the largest prime")]
    CapacityExhausted,
}

impl MapError {
    /// True for the end-of-iteration sentinel.
    #[inline]
    pub fn is_end(&self) -> bool {
        matches!(self, MapError::EndOfIteration)
    }
}
