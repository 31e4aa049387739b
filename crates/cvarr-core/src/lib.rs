//! Core types and traits for the cvarr containers.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the arena, the kernel and the container facade:
//! element depths, geometry value types, sequence flags and the
//! [`CvError`] type every public operation reports.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod element;
pub mod error;
pub mod flags;
pub mod geometry;

pub use element::{Depth, Element};
pub use error::CvError;
pub use flags::{CmpOp, Orientation, SeqFlags};
pub use geometry::{Box2D, Moments, Point2d, Point2f, Point2i, PointLike, Rect, Size2f};
