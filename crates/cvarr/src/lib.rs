//! cvarr: typed matrices and arena-backed sequences over a native array
//! kernel.
//!
//! This is the top-level crate. It re-exports the sub-crates and adds the
//! typed wrappers most callers want: [`Matrix`] over a pinned payload and
//! [`Sequence`] over an [`Arena`].
//!
//! # Quick start
//!
//! ```rust
//! use cvarr::prelude::*;
//!
//! let m = Matrix::from_rows(&[vec![1.0f64, 2.0], vec![3.0, 4.0]]).unwrap();
//! assert_eq!(m.sum().unwrap(), 10.0);
//! assert_eq!(m.transpose().unwrap().get(0, 1).unwrap(), 3.0);
//!
//! let arena = Arena::new();
//! let square = Sequence::<Point2i>::new(SeqFlags::POLYGON, &arena).unwrap();
//! for (x, y) in [(0, 0), (1, 0), (1, 1), (0, 1)] {
//!     square.push(Point2i::new(x, y)).unwrap();
//! }
//! assert_eq!(square.area().unwrap(), 1.0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cvarr-core` | Element depths, flags, geometry values, [`CvError`] |
//! | [`arena`] | `cvarr-arena` | Block arena, sequence headers and links |
//! | [`kernel`] | `cvarr-kernel` | Matrix header and numeric/geometry routines |
//! | [`matrix`] | | [`Matrix`] and its views |
//! | [`sequence`] | | [`Sequence`] and contour operations |
//! | [`codec`] | | Binary matrix encoding |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Block arena and sequence storage (`cvarr-arena`).
pub use cvarr_arena as arena;

/// Element depths, flags, geometry value types and errors (`cvarr-core`).
pub use cvarr_core as types;

/// Matrix header and the native routines behind [`Matrix`] and
/// [`Sequence`] (`cvarr-kernel`).
pub use cvarr_kernel as kernel;

pub mod codec;
pub mod matrix;
pub mod pin;
pub mod sequence;

pub use codec::{decode_matrix, encode_matrix, CodecError};
pub use cvarr_arena::{Arena, ArenaConfig};
pub use cvarr_core::CvError;
pub use matrix::{Matrix, MinMax};
pub use pin::PinnedBuffer;
pub use sequence::{Iter, Sequence};

/// Common imports.
///
/// ```rust
/// use cvarr::prelude::*;
/// ```
pub mod prelude {
    pub use crate::matrix::{Matrix, MinMax};
    pub use crate::sequence::Sequence;

    pub use cvarr_arena::{Arena, ArenaConfig};

    pub use cvarr_core::{
        Box2D, CmpOp, CvError, Depth, Element, Moments, Orientation, Point2d, Point2f, Point2i,
        PointLike, Rect, SeqFlags, Size2f,
    };
}
