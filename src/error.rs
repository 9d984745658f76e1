//! Unified error handling for the matching pipeline.

use std::path::PathBuf;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, MatchError>;

/// Errors surfaced by the matcher and the I/O surfaces around it.
///
/// A failed match never produces a partial output: the matcher either
/// returns an error up front (empty inputs) or a full-length output with
/// sentinel estimates where information is missing.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The trace contains no observations.
    #[error("trace contains no observations")]
    EmptyTrace,

    /// The road graph contains no edges.
    #[error("road graph contains no edges")]
    EmptyGraph,

    /// A packed 64-bit vertex identifier from the spatial index did not
    /// decode to a node or an interior polyline vertex.
    #[error("malformed packed vertex id {raw:#x}")]
    MalformedVertexId { raw: u64 },

    /// An edge failed construction-time validation.
    #[error("invalid edge {edge}: {reason}")]
    InvalidEdge { edge: u32, reason: String },

    /// A file could not be opened, read or written.
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record in a delimited text file did not have the expected shape.
    #[error("malformed record at {path:?}:{line}")]
    InvalidRecord { path: PathBuf, line: usize },

    /// `evaluate` was called on outputs of different lengths.
    #[error("output sizes must match to evaluate: {expected} vs {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

impl MatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MatchError::Io {
            path: path.into(),
            source,
        }
    }
}
