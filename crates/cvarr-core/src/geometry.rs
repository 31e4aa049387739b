//! Fixed-layout geometry value types.
//!
//! Point types are `repr(C)` and [`Pod`] so they can be stored verbatim in
//! arena-backed sequences.

use bytemuck::{Pod, Zeroable};

use crate::flags::SeqFlags;

/// Integer 2D point.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Point2i {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row).
    pub y: i32,
}

impl Point2i {
    /// Create a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Single-precision 2D point.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Point2f {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point2f {
    /// Create a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Double-precision 2D point. Kernel geometry works in this type.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Point2d {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point2d {
    /// Create a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point type that can be stored in a sequence and fed to geometry
/// routines.
pub trait PointLike: Pod + std::fmt::Debug {
    /// Element-type flag bits describing this point type.
    const ELTYPE: SeqFlags;

    /// Widen to double precision.
    fn to_point2d(self) -> Point2d;

    /// Narrow from double precision (integer points round to nearest).
    fn from_point2d(p: Point2d) -> Self;
}

impl PointLike for Point2i {
    const ELTYPE: SeqFlags = SeqFlags::ELTYPE_POINT;

    fn to_point2d(self) -> Point2d {
        Point2d::new(self.x as f64, self.y as f64)
    }

    fn from_point2d(p: Point2d) -> Self {
        Self::new(p.x.round() as i32, p.y.round() as i32)
    }
}

impl PointLike for Point2f {
    const ELTYPE: SeqFlags = SeqFlags::ELTYPE_POINT32F;

    fn to_point2d(self) -> Point2d {
        Point2d::new(self.x as f64, self.y as f64)
    }

    fn from_point2d(p: Point2d) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

impl PointLike for Point2d {
    const ELTYPE: SeqFlags = SeqFlags::ELTYPE_POINT64F;

    fn to_point2d(self) -> Point2d {
        self
    }

    fn from_point2d(p: Point2d) -> Self {
        p
    }
}

/// Axis-aligned integer rectangle.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Create a rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Area in pixels.
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }
}

/// Width and height in floating point.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Size2f {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

/// A rotated rectangle.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Box2D {
    /// Center of the box.
    pub center: Point2f,
    /// Side lengths.
    pub size: Size2f,
    /// Rotation in degrees, in `[-90, 0)`.
    pub angle: f32,
}

impl Box2D {
    /// Area of the box.
    pub fn area(&self) -> f64 {
        self.size.width as f64 * self.size.height as f64
    }
}

/// Spatial and central moments of a contour, up to third order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    /// Spatial moment m00 (area).
    pub m00: f64,
    /// Spatial moment m10.
    pub m10: f64,
    /// Spatial moment m01.
    pub m01: f64,
    /// Spatial moment m20.
    pub m20: f64,
    /// Spatial moment m11.
    pub m11: f64,
    /// Spatial moment m02.
    pub m02: f64,
    /// Spatial moment m30.
    pub m30: f64,
    /// Spatial moment m21.
    pub m21: f64,
    /// Spatial moment m12.
    pub m12: f64,
    /// Spatial moment m03.
    pub m03: f64,
    /// Central moment mu20.
    pub mu20: f64,
    /// Central moment mu11.
    pub mu11: f64,
    /// Central moment mu02.
    pub mu02: f64,
    /// Central moment mu30.
    pub mu30: f64,
    /// Central moment mu21.
    pub mu21: f64,
    /// Central moment mu12.
    pub mu12: f64,
    /// Central moment mu03.
    pub mu03: f64,
    /// `1 / sqrt(|m00|)`, or 0 for a degenerate contour.
    pub inv_sqrt_m00: f64,
}

impl Moments {
    /// Centroid `(m10 / m00, m01 / m00)`, if the area is nonzero.
    pub fn centroid(&self) -> Option<Point2d> {
        if self.m00 == 0.0 {
            return None;
        }
        Some(Point2d::new(self.m10 / self.m00, self.m01 / self.m00))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_layouts_are_packed() {
        assert_eq!(std::mem::size_of::<Point2i>(), 8);
        assert_eq!(std::mem::size_of::<Point2f>(), 8);
        assert_eq!(std::mem::size_of::<Point2d>(), 16);
        assert_eq!(std::mem::size_of::<Box2D>(), 20);
    }

    #[test]
    fn integer_points_round() {
        let p = Point2i::from_point2d(Point2d::new(1.6, -0.4));
        assert_eq!(p, Point2i::new(2, 0));
    }

    #[test]
    fn centroid_requires_area() {
        assert_eq!(Moments::default().centroid(), None);
        let m = Moments {
            m00: 2.0,
            m10: 1.0,
            m01: 3.0,
            ..Default::default()
        };
        assert_eq!(m.centroid(), Some(Point2d::new(0.5, 1.5)));
    }
}
