//! Error type shared by every cvarr container operation.

use std::error::Error;
use std::fmt;

/// Errors surfaced by `Matrix` and `Sequence` operations.
///
/// All variants are contract violations reported synchronously to the
/// caller. None of them are retryable; the container stays usable unless
/// the failure was disposal-related.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CvError {
    /// The element type has no foreign depth code.
    UnsupportedElementType {
        /// Rust name of the rejected type.
        type_name: &'static str,
    },
    /// Operand shapes are incompatible for the requested operation.
    DimensionMismatch {
        /// Operation that rejected the operands.
        op: &'static str,
        /// Shape of the left operand as `(rows, cols)`.
        left: (usize, usize),
        /// Shape of the right operand as `(rows, cols)`.
        right: (usize, usize),
    },
    /// A coordinate or sequence index is out of range.
    InvalidIndex {
        /// Which axis the index addressed (`"row"`, `"col"`, `"element"`, ...).
        axis: &'static str,
        /// The offending index.
        index: i64,
        /// Exclusive upper bound for that axis.
        bound: usize,
    },
    /// The container (or the resource it depends on) was disposed.
    UseAfterDispose {
        /// What was used after disposal.
        what: &'static str,
    },
    /// A sequence was used after its arena was released.
    ArenaLifetimeViolation,
    /// Two sequences that must share an arena do not.
    ArenaMismatch,
    /// The arena cannot grow any further.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Total capacity in bytes.
        capacity: usize,
    },
    /// An argument is malformed in a way not covered above.
    InvalidArgument {
        /// Human-readable description.
        detail: String,
    },
}

impl fmt::Display for CvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedElementType { type_name } => {
                write!(f, "unsupported element type: {type_name}")
            }
            Self::DimensionMismatch { op, left, right } => {
                write!(
                    f,
                    "dimension mismatch in {op}: {}x{} vs {}x{}",
                    left.0, left.1, right.0, right.1
                )
            }
            Self::InvalidIndex { axis, index, bound } => {
                write!(f, "{axis} index {index} out of range 0..{bound}")
            }
            Self::UseAfterDispose { what } => write!(f, "{what} used after dispose"),
            Self::ArenaLifetimeViolation => {
                write!(f, "sequence used after its arena was released")
            }
            Self::ArenaMismatch => write!(f, "sequences belong to different arenas"),
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::InvalidArgument { detail } => write!(f, "invalid argument: {detail}"),
        }
    }
}

impl Error for CvError {}
