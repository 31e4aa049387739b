//! Kernel error types.

use std::error::Error;
use std::fmt;

use cvarr_core::{CvError, Depth};

/// Errors reported by kernel routines before any element is touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KernelError {
    /// Operand shapes are incompatible.
    DimensionMismatch {
        /// Routine that rejected the operands.
        op: &'static str,
        /// Left operand `(rows, cols)`.
        left: (usize, usize),
        /// Right operand `(rows, cols)`.
        right: (usize, usize),
    },
    /// Operand depths differ where they must match.
    DepthMismatch {
        /// Routine that rejected the operands.
        op: &'static str,
        /// Depth of the first operand.
        expected: Depth,
        /// Depth of the offending operand.
        found: Depth,
    },
    /// The header's type tag is not a valid matrix tag.
    UnsupportedDepth {
        /// The raw type tag.
        type_tag: i32,
    },
    /// Element coordinate out of range.
    InvalidIndex {
        /// `"row"` or `"col"`.
        axis: &'static str,
        /// The requested index.
        index: i64,
        /// Exclusive bound.
        bound: usize,
    },
    /// A view range does not fit inside its source.
    InvalidRange {
        /// Routine that rejected the range.
        op: &'static str,
        /// Range start.
        start: i64,
        /// Range end (exclusive).
        end: i64,
        /// Extent of the source along that axis.
        bound: usize,
    },
    /// Any other malformed argument.
    InvalidArgument {
        /// Human-readable description.
        detail: String,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { op, left, right } => write!(
                f,
                "{op}: dimension mismatch {}x{} vs {}x{}",
                left.0, left.1, right.0, right.1
            ),
            Self::DepthMismatch {
                op,
                expected,
                found,
            } => write!(f, "{op}: depth mismatch, expected {expected}, found {found}"),
            Self::UnsupportedDepth { type_tag } => {
                write!(f, "unsupported matrix type tag {type_tag:#x}")
            }
            Self::InvalidIndex { axis, index, bound } => {
                write!(f, "{axis} index {index} out of range 0..{bound}")
            }
            Self::InvalidRange {
                op,
                start,
                end,
                bound,
            } => write!(f, "{op}: range {start}..{end} outside 0..{bound}"),
            Self::InvalidArgument { detail } => write!(f, "invalid argument: {detail}"),
        }
    }
}

impl Error for KernelError {}

impl From<KernelError> for CvError {
    fn from(e: KernelError) -> Self {
        match e {
            KernelError::DimensionMismatch { op, left, right } => {
                CvError::DimensionMismatch { op, left, right }
            }
            KernelError::InvalidIndex { axis, index, bound } => {
                CvError::InvalidIndex { axis, index, bound }
            }
            KernelError::InvalidRange {
                op, start, bound, ..
            } => CvError::InvalidIndex {
                axis: op,
                index: start,
                bound,
            },
            other => CvError::InvalidArgument {
                detail: other.to_string(),
            },
        }
    }
}
