//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use cvarr_core::CvError;

use crate::handle::SeqHandle;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The arena was explicitly released; every handle into it is dead.
    Released,
    /// A handle whose slot was reclaimed or never existed in this arena.
    StaleHandle {
        /// The rejected handle.
        handle: SeqHandle,
    },
    /// Block pool is full.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Total capacity available across all blocks.
        capacity: usize,
    },
    /// Element index out of range.
    InvalidIndex {
        /// The requested index.
        index: usize,
        /// Number of elements in the sequence.
        len: usize,
    },
    /// An operation needed two handles from the same arena.
    ForeignArena,
    /// Element byte size differs from the sequence's element size.
    ElementSizeMismatch {
        /// Element size recorded in the sequence header.
        expected: usize,
        /// Size of the value supplied.
        found: usize,
    },
    /// Sequences of zero-sized elements are not allowed.
    ZeroSizedElement,
    /// Configuration rejected by [`ArenaConfig::validate`](crate::ArenaConfig::validate).
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Released => write!(f, "arena has been released"),
            Self::StaleHandle { handle } => write!(f, "stale sequence handle: {handle}"),
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::InvalidIndex { index, len } => {
                write!(f, "element index {index} out of range 0..{len}")
            }
            Self::ForeignArena => write!(f, "handle belongs to a different arena"),
            Self::ElementSizeMismatch { expected, found } => {
                write!(
                    f,
                    "element size mismatch: sequence stores {expected} bytes, got {found}"
                )
            }
            Self::ZeroSizedElement => write!(f, "zero-sized sequence elements are not supported"),
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for ArenaError {}

impl From<ArenaError> for CvError {
    fn from(e: ArenaError) -> Self {
        match e {
            ArenaError::Released => CvError::ArenaLifetimeViolation,
            ArenaError::StaleHandle { .. } => CvError::UseAfterDispose { what: "sequence" },
            ArenaError::CapacityExceeded {
                requested,
                capacity,
            } => CvError::CapacityExceeded {
                requested,
                capacity,
            },
            ArenaError::InvalidIndex { index, len } => CvError::InvalidIndex {
                axis: "element",
                index: index as i64,
                bound: len,
            },
            ArenaError::ForeignArena => CvError::ArenaMismatch,
            other => CvError::InvalidArgument {
                detail: other.to_string(),
            },
        }
    }
}
