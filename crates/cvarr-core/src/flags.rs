//! Sequence flag bits and small enums passed to kernel routines.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Flag word stored in a native sequence header.
///
/// Bits `0..9` carry the element type, bits `12..14` the sequence kind and
/// the remaining bits individual shape flags.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SeqFlags(pub u32);

impl SeqFlags {
    /// No element type, generic kind, no flags.
    pub const EMPTY: Self = Self(0);

    /// Mask of the element-type bits.
    pub const ELTYPE_MASK: u32 = 0x1FF;
    /// Generic element type.
    pub const ELTYPE_GENERIC: Self = Self(0);
    /// Two `i32` coordinates.
    pub const ELTYPE_POINT: Self = Self(12);
    /// Two `f32` coordinates.
    pub const ELTYPE_POINT32F: Self = Self(13);
    /// Two `f64` coordinates.
    pub const ELTYPE_POINT64F: Self = Self(14);

    /// Mask of the kind bits.
    pub const KIND_MASK: u32 = 3 << 12;
    /// Generic sequence.
    pub const KIND_GENERIC: Self = Self(0);
    /// Curve (polyline or polygon).
    pub const KIND_CURVE: Self = Self(1 << 12);

    /// The curve is closed.
    pub const FLAG_CLOSED: Self = Self(1 << 14);
    /// The contour is a hole.
    pub const FLAG_HOLE: Self = Self(1 << 15);
    /// The contour is known to be convex.
    pub const FLAG_CONVEX: Self = Self(1 << 16);

    /// A closed curve: the usual flags of a polygon.
    pub const POLYGON: Self = Self(Self::KIND_CURVE.0 | Self::FLAG_CLOSED.0);

    /// Raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Element-type bits only.
    pub fn eltype(self) -> u32 {
        self.0 & Self::ELTYPE_MASK
    }

    /// Kind bits only.
    pub fn kind(self) -> u32 {
        self.0 & Self::KIND_MASK
    }

    /// Replace the element-type bits.
    pub fn with_eltype(self, eltype: Self) -> Self {
        Self((self.0 & !Self::ELTYPE_MASK) | (eltype.0 & Self::ELTYPE_MASK))
    }
}

impl BitOr for SeqFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SeqFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for SeqFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Elementwise comparison performed by `cmp`.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CmpOp {
    /// `a == b`
    Eq = 0,
    /// `a > b`
    Gt = 1,
    /// `a >= b`
    Ge = 2,
    /// `a < b`
    Lt = 3,
    /// `a <= b`
    Le = 4,
    /// `a != b`
    Ne = 5,
}

impl CmpOp {
    /// Apply the comparison.
    #[inline]
    pub fn apply(self, a: f64, b: f64) -> bool {
        match self {
            Self::Eq => a == b,
            Self::Gt => a > b,
            Self::Ge => a >= b,
            Self::Lt => a < b,
            Self::Le => a <= b,
            Self::Ne => a != b,
        }
    }
}

/// Vertex order of a computed convex hull.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Clockwise in a y-up coordinate system.
    Clockwise = 1,
    /// Counter-clockwise in a y-up coordinate system.
    CounterClockwise = 2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_is_closed_curve() {
        let f = SeqFlags::POLYGON | SeqFlags::ELTYPE_POINT;
        assert!(f.contains(SeqFlags::FLAG_CLOSED));
        assert_eq!(f.kind(), SeqFlags::KIND_CURVE.bits());
        assert_eq!(f.eltype(), SeqFlags::ELTYPE_POINT.bits());
    }

    #[test]
    fn with_eltype_replaces_only_eltype() {
        let f = (SeqFlags::POLYGON | SeqFlags::ELTYPE_POINT).with_eltype(SeqFlags::ELTYPE_POINT32F);
        assert_eq!(f.eltype(), 13);
        assert!(f.contains(SeqFlags::POLYGON));
    }

    #[test]
    fn cmp_ops() {
        assert!(CmpOp::Ne.apply(1.0, 2.0));
        assert!(!CmpOp::Eq.apply(1.0, 2.0));
        assert!(CmpOp::Le.apply(2.0, 2.0));
    }
}
