//! Error taxonomy for the `trajchain` crate.
//!
//! End-of-trajectory is deliberately *not* an error: sequential access
//! signals exhaustion with `Ok(None)` so callers can tell "no frames left"
//! apart from a genuine failure.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TrajError>;

/// All failures surfaced by chain construction and frame access.
#[derive(Debug, Error)]
pub enum TrajError {
    /// Continuous stitching found a temporal gap between two segments.
    /// Raised once, at construction; the chain cannot be built.
    #[error(
        "cannot stitch continuous trajectory: gap between '{earlier}' (ends at key {earlier_end}) and '{later}' (starts at key {later_start})"
    )]
    Discontinuous {
        earlier: String,
        earlier_end: f64,
        later: String,
        later_start: f64,
    },

    /// A seek or index access outside `[-n_frames, n_frames)`. The reader's
    /// position is left untouched.
    #[error("frame {frame} out of range for trajectory with {n_frames} frames")]
    FrameOutOfRange { frame: isize, n_frames: usize },

    /// A slice request that can never be satisfied (e.g. zero step).
    #[error("invalid slice: {reason}")]
    InvalidSlice { reason: String },

    /// A segment's own metadata is inconsistent (empty, mismatched counts,
    /// end key before start key, non-monotonic keys in continuous mode).
    #[error("malformed segment '{uri}': {reason}")]
    MalformedSegment { uri: String, reason: String },

    /// Segments in one chain must all describe the same system.
    #[error("atom count mismatch in '{uri}': expected {expected}, got {got}")]
    AtomCountMismatch {
        uri: String,
        expected: usize,
        got: usize,
    },

    /// Decode or encode failure inside a concrete trajectory format.
    #[error("format error in '{uri}': {reason}")]
    Format { uri: String, reason: String },

    /// A chain was asked to assemble zero segments.
    #[error("a chain needs at least one segment source")]
    EmptyChain,

    /// No registered trajectory format matches a source.
    #[error("no registered trajectory format matches '{uri}'")]
    UnknownFormat { uri: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
