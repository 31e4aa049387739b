//! Arena-backed growable sequences.
//!
//! A [`Sequence`] is a typed handle: an [`Arena`] clone plus the
//! [`SeqHandle`] of a native header inside it. The arena owns every byte;
//! dropping or disposing a sequence frees nothing. Structural links
//! (`h_prev`, `h_next`, `v_prev`, `v_next`) are plain handle edges.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::ops::Range;

use bytemuck::Pod;

use cvarr_arena::{Arena, Link, SeqHandle, SeqHeader};
use cvarr_core::{
    Box2D, CvError, Moments, Orientation, Point2d, Point2f, PointLike, Rect, SeqFlags,
};
use cvarr_kernel::geometry;

/// A growable sequence of `T` stored in an [`Arena`].
#[derive(Clone)]
pub struct Sequence<T: Pod> {
    arena: Arena,
    handle: SeqHandle,
    _elem: PhantomData<T>,
}

impl<T: Pod> Sequence<T> {
    /// Create an empty sequence in `arena`.
    pub fn new(flags: SeqFlags, arena: &Arena) -> Result<Self, CvError> {
        let handle = arena.create_seq(flags, size_of::<T>())?;
        Ok(Self::wrap(arena, handle))
    }

    /// Create an empty sequence in a fresh arena of its own.
    pub fn with_fresh_arena(flags: SeqFlags) -> Result<Self, CvError> {
        Self::new(flags, &Arena::new())
    }

    /// Wrap an existing header, checking the element size.
    pub fn from_handle(arena: &Arena, handle: SeqHandle) -> Result<Self, CvError> {
        let header = arena.header(handle)?;
        if header.elem_size as usize != size_of::<T>() {
            return Err(CvError::InvalidArgument {
                detail: format!(
                    "sequence holds {}-byte elements, not {}-byte",
                    header.elem_size,
                    size_of::<T>()
                ),
            });
        }
        Ok(Self::wrap(arena, handle))
    }

    fn wrap(arena: &Arena, handle: SeqHandle) -> Self {
        Self {
            arena: arena.clone(),
            handle,
            _elem: PhantomData,
        }
    }

    /// The arena holding this sequence.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Handle of the native header.
    pub fn handle(&self) -> SeqHandle {
        self.handle
    }

    /// Copy of the native header.
    pub fn header(&self) -> Result<SeqHeader, CvError> {
        Ok(self.arena.header(self.handle)?)
    }

    /// Flags from the native header.
    pub fn flags(&self) -> Result<SeqFlags, CvError> {
        Ok(self.header()?.flags)
    }

    /// Number of elements.
    pub fn total(&self) -> Result<usize, CvError> {
        Ok(self.arena.total(self.handle)?)
    }

    /// Whether the sequence holds no elements.
    pub fn is_empty(&self) -> Result<bool, CvError> {
        Ok(self.total()? == 0)
    }

    /// Append one element.
    pub fn push(&self, value: T) -> Result<(), CvError> {
        self.arena.push(self.handle, &value)?;
        Ok(())
    }

    /// Element `index`.
    pub fn get(&self, index: usize) -> Result<T, CvError> {
        Ok(self.arena.get(self.handle, index)?)
    }

    /// Every element in index order.
    pub fn to_vec(&self) -> Result<Vec<T>, CvError> {
        let total = self.total()?;
        (0..total).map(|i| self.get(i)).collect()
    }

    /// Lazy iterator over the elements. The element count is read once,
    /// when iteration starts; a failed read ends iteration.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            seq: self,
            next: 0,
            total: None,
        }
    }

    /// Remove all elements, keeping owned storage for reuse.
    pub fn clear(&self) -> Result<(), CvError> {
        self.arena.clear(self.handle)?;
        Ok(())
    }

    /// Sequences own no storage, so this does nothing. Memory is returned
    /// by the arena.
    pub fn dispose(&mut self) {}

    /// Sequence holding elements `range`.
    ///
    /// `range.end` is clamped to the element count. With `copy_data` the
    /// elements are copied into `target` (default: this arena); otherwise
    /// the slice aliases this sequence's storage and `target` must be this
    /// arena.
    pub fn slice(
        &self,
        range: Range<usize>,
        target: Option<&Arena>,
        copy_data: bool,
    ) -> Result<Self, CvError> {
        let target = target.unwrap_or(&self.arena);
        let handle = self.arena.slice(self.handle, range, target, copy_data)?;
        Ok(Self::wrap(target, handle))
    }

    fn linked(&self, link: Link) -> Result<Option<Self>, CvError> {
        match self.arena.link(self.handle, link)? {
            Some(handle) => Self::from_handle(&self.arena, handle).map(Some),
            None => Ok(None),
        }
    }

    fn set_linked(&self, link: Link, target: Option<&Self>) -> Result<(), CvError> {
        if let Some(t) = target {
            if t.arena.id() != self.arena.id() {
                return Err(CvError::ArenaMismatch);
            }
        }
        self.arena
            .set_link(self.handle, link, target.map(|t| t.handle))?;
        Ok(())
    }

    /// Previous sibling.
    pub fn h_prev(&self) -> Result<Option<Self>, CvError> {
        self.linked(Link::HPrev)
    }

    /// Next sibling.
    pub fn h_next(&self) -> Result<Option<Self>, CvError> {
        self.linked(Link::HNext)
    }

    /// Parent.
    pub fn v_prev(&self) -> Result<Option<Self>, CvError> {
        self.linked(Link::VPrev)
    }

    /// First child.
    pub fn v_next(&self) -> Result<Option<Self>, CvError> {
        self.linked(Link::VNext)
    }

    /// Point `h_prev` at `target`, or clear it.
    pub fn set_h_prev(&self, target: Option<&Self>) -> Result<(), CvError> {
        self.set_linked(Link::HPrev, target)
    }

    /// Point `h_next` at `target`, or clear it.
    pub fn set_h_next(&self, target: Option<&Self>) -> Result<(), CvError> {
        self.set_linked(Link::HNext, target)
    }

    /// Point `v_prev` at `target`, or clear it.
    pub fn set_v_prev(&self, target: Option<&Self>) -> Result<(), CvError> {
        self.set_linked(Link::VPrev, target)
    }

    /// Point `v_next` at `target`, or clear it.
    pub fn set_v_next(&self, target: Option<&Self>) -> Result<(), CvError> {
        self.set_linked(Link::VNext, target)
    }
}

impl<T: Pod> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("arena", &self.arena.id())
            .field("handle", &self.handle)
            .field("total", &self.total().ok())
            .finish()
    }
}

/// Iterator over a [`Sequence`], created by [`Sequence::iter`].
pub struct Iter<'a, T: Pod> {
    seq: &'a Sequence<T>,
    next: usize,
    total: Option<usize>,
}

impl<T: Pod> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let total = match self.total {
            Some(t) => t,
            None => {
                let t = self.seq.total().unwrap_or(0);
                self.total = Some(t);
                t
            }
        };
        if self.next >= total {
            return None;
        }
        let item = self.seq.get(self.next).ok();
        self.next = if item.is_some() { self.next + 1 } else { total };
        item
    }
}

impl<'a, T: Pod> IntoIterator for &'a Sequence<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<P: PointLike> Sequence<P> {
    fn points(&self) -> Result<Vec<Point2d>, CvError> {
        Ok(self
            .to_vec()?
            .into_iter()
            .map(PointLike::to_point2d)
            .collect())
    }

    fn pick(&self, flags: SeqFlags, arena: &Arena, source: &[P], keep: &[usize]) -> Result<Self, CvError> {
        let out = Self::new(flags, arena)?;
        for &i in keep {
            out.push(source[i])?;
        }
        Ok(out)
    }

    /// Convex hull as a new sequence of points taken from this one.
    pub fn convex_hull(
        &self,
        orientation: Orientation,
        target: Option<&Arena>,
    ) -> Result<Self, CvError> {
        let source = self.to_vec()?;
        let pts: Vec<Point2d> = source.iter().map(|p| p.to_point2d()).collect();
        let keep = geometry::convex_hull(&pts, orientation);
        let flags = SeqFlags::POLYGON.with_eltype(P::ELTYPE) | SeqFlags::FLAG_CONVEX;
        self.pick(flags, target.unwrap_or(&self.arena), &source, &keep)
    }

    fn approx_one(&self, accuracy: f64, arena: &Arena) -> Result<Self, CvError> {
        let flags = self.flags()?;
        let source = self.to_vec()?;
        let pts: Vec<Point2d> = source.iter().map(|p| p.to_point2d()).collect();
        let closed = flags.contains(SeqFlags::FLAG_CLOSED);
        let keep = geometry::approx_poly_dp(&pts, accuracy, closed)?;
        self.pick(flags, arena, &source, &keep)
    }

    /// Douglas-Peucker approximation of this contour and, depending on
    /// `max_level`, of the contours reachable through its links.
    ///
    /// `0` approximates this contour only and `1` adds its `h_next`
    /// siblings. Each level above 1 also descends one `v_next` level. A
    /// negative level skips siblings and descends `|max_level| - 1` levels.
    /// The result mirrors the source tree's links.
    pub fn approx_poly(
        &self,
        accuracy: f64,
        max_level: i32,
        target: Option<&Arena>,
    ) -> Result<Self, CvError> {
        let arena = target.unwrap_or(&self.arena);
        let siblings = max_level > 0;
        let depth = (max_level.unsigned_abs() as usize).saturating_sub(1);
        let mut seen = HashSet::new();
        self.approx_chain(accuracy, depth, siblings, arena, &mut seen)?
            .ok_or(CvError::InvalidArgument {
                detail: "contour tree revisits its root".into(),
            })
    }

    fn approx_chain(
        &self,
        accuracy: f64,
        depth: usize,
        siblings: bool,
        arena: &Arena,
        seen: &mut HashSet<SeqHandle>,
    ) -> Result<Option<Self>, CvError> {
        let mut head: Option<Self> = None;
        let mut prev: Option<Self> = None;
        let mut cur = Some(self.clone());
        while let Some(src) = cur {
            if !seen.insert(src.handle) {
                break;
            }
            let out = src.approx_one(accuracy, arena)?;
            if depth > 0 {
                if let Some(child) = src.v_next()? {
                    if let Some(c) = child.approx_chain(accuracy, depth - 1, true, arena, seen)? {
                        out.set_v_next(Some(&c))?;
                        c.set_v_prev(Some(&out))?;
                    }
                }
            }
            if let Some(p) = &prev {
                p.set_h_next(Some(&out))?;
                out.set_h_prev(Some(p))?;
            }
            if head.is_none() {
                head = Some(out.clone());
            }
            prev = Some(out);
            cur = if siblings { src.h_next()? } else { None };
        }
        Ok(head)
    }

    /// Minimum-area rotated rectangle enclosing the points.
    pub fn min_area_rect(&self) -> Result<Box2D, CvError> {
        Ok(geometry::min_area_rect(&self.points()?))
    }

    /// Up-right integer bounding rectangle.
    pub fn bounding_rect(&self) -> Result<Rect, CvError> {
        Ok(geometry::bounding_rect(&self.points()?))
    }

    /// Absolute area of the closed contour.
    pub fn area(&self) -> Result<f64, CvError> {
        Ok(geometry::contour_area(&self.points()?))
    }

    /// Perimeter of the closed contour.
    pub fn perimeter(&self) -> Result<f64, CvError> {
        Ok(geometry::arc_length(&self.points()?, true))
    }

    /// Whether the contour is convex.
    pub fn is_convex(&self) -> Result<bool, CvError> {
        Ok(geometry::is_convex(&self.points()?))
    }

    /// `1.0` inside, `-1.0` outside, `0.0` on the contour.
    pub fn in_contour(&self, point: Point2f) -> Result<f64, CvError> {
        let p = point.to_point2d();
        Ok(geometry::point_polygon_test(&self.points()?, p, false))
    }

    /// Signed distance to the contour, positive inside.
    pub fn distance(&self, point: Point2f) -> Result<f64, CvError> {
        let p = point.to_point2d();
        Ok(geometry::point_polygon_test(&self.points()?, p, true))
    }

    /// Spatial and central moments of the contour.
    pub fn moments(&self) -> Result<Moments, CvError> {
        Ok(geometry::moments(&self.points()?))
    }
}

#[cfg(test)]
mod tests {
    use cvarr_arena::ArenaConfig;
    use cvarr_core::Point2i;

    use super::*;

    fn polygon(arena: &Arena, raw: &[(i32, i32)]) -> Sequence<Point2i> {
        let seq = Sequence::new(SeqFlags::POLYGON.with_eltype(Point2i::ELTYPE), arena).unwrap();
        for &(x, y) in raw {
            seq.push(Point2i::new(x, y)).unwrap();
        }
        seq
    }

    fn square(arena: &Arena) -> Sequence<Point2i> {
        polygon(arena, &[(0, 0), (1, 0), (1, 1), (0, 1)])
    }

    #[test]
    fn push_get_total() {
        let seq = Sequence::<f64>::with_fresh_arena(SeqFlags::EMPTY).unwrap();
        assert!(seq.is_empty().unwrap());
        for i in 0..10 {
            seq.push(i as f64).unwrap();
        }
        assert_eq!(seq.total().unwrap(), 10);
        assert_eq!(seq.get(7).unwrap(), 7.0);
        assert!(matches!(
            seq.get(10),
            Err(CvError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn iteration_is_restartable() {
        let seq = Sequence::<i32>::with_fresh_arena(SeqFlags::EMPTY).unwrap();
        for i in 0..5 {
            seq.push(i).unwrap();
        }
        let first: Vec<i32> = seq.iter().collect();
        let second: Vec<i32> = (&seq).into_iter().collect();
        assert_eq!(first, vec![0, 1, 2, 3, 4]);
        assert_eq!(first, second);
    }

    #[test]
    fn iterator_reads_total_once() {
        let seq = Sequence::<i32>::with_fresh_arena(SeqFlags::EMPTY).unwrap();
        seq.push(1).unwrap();
        seq.push(2).unwrap();
        let mut it = seq.iter();
        assert_eq!(it.next(), Some(1));
        seq.push(3).unwrap();
        assert_eq!(it.next(), Some(2));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn from_handle_checks_element_size() {
        let arena = Arena::new();
        let seq = Sequence::<f32>::new(SeqFlags::EMPTY, &arena).unwrap();
        assert!(Sequence::<f32>::from_handle(&arena, seq.handle()).is_ok());
        assert!(matches!(
            Sequence::<f64>::from_handle(&arena, seq.handle()),
            Err(CvError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn links_round_trip() {
        let arena = Arena::new();
        let a = square(&arena);
        let b = square(&arena);
        a.set_h_next(Some(&b)).unwrap();
        b.set_h_prev(Some(&a)).unwrap();
        assert_eq!(a.h_next().unwrap().unwrap().handle(), b.handle());
        assert_eq!(b.h_prev().unwrap().unwrap().handle(), a.handle());
        assert!(a.v_next().unwrap().is_none());
        a.set_h_next(None).unwrap();
        assert!(a.h_next().unwrap().is_none());
    }

    #[test]
    fn links_across_arenas_rejected() {
        let a = square(&Arena::new());
        let b = square(&Arena::new());
        assert_eq!(a.set_v_next(Some(&b)), Err(CvError::ArenaMismatch));
    }

    #[test]
    fn clear_keeps_capacity() {
        let arena = Arena::new();
        let seq = Sequence::<u64>::new(SeqFlags::EMPTY, &arena).unwrap();
        for i in 0..100 {
            seq.push(i).unwrap();
        }
        let used = arena.used_bytes();
        seq.clear().unwrap();
        assert_eq!(seq.total().unwrap(), 0);
        for i in 0..100 {
            seq.push(i).unwrap();
        }
        assert_eq!(arena.used_bytes(), used);
    }

    #[test]
    fn slice_alias_and_copy() {
        let arena = Arena::new();
        let seq = Sequence::<i16>::new(SeqFlags::EMPTY, &arena).unwrap();
        for i in 0..6 {
            seq.push(i).unwrap();
        }
        let alias = seq.slice(2..10, None, false).unwrap();
        assert_eq!(alias.to_vec().unwrap(), vec![2, 3, 4, 5]);
        let other = Arena::new();
        let copy = seq.slice(1..3, Some(&other), true).unwrap();
        assert_eq!(copy.to_vec().unwrap(), vec![1, 2]);
        assert_eq!(copy.arena().id(), other.id());
        assert_eq!(
            seq.slice(0..2, Some(&other), false).unwrap_err(),
            CvError::ArenaMismatch
        );
        assert!(matches!(
            seq.slice(7..8, None, true),
            Err(CvError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn released_arena_is_lifetime_violation() {
        let arena = Arena::new();
        let seq = square(&arena);
        arena.release();
        assert_eq!(seq.total().unwrap_err(), CvError::ArenaLifetimeViolation);
        assert_eq!(seq.iter().count(), 0);
    }

    #[test]
    fn dispose_is_a_no_op() {
        let arena = Arena::new();
        let mut seq = square(&arena);
        seq.dispose();
        assert_eq!(seq.total().unwrap(), 4);
    }

    #[test]
    fn square_geometry() {
        let arena = Arena::new();
        let sq = square(&arena);
        assert_eq!(sq.area().unwrap(), 1.0);
        assert_eq!(sq.perimeter().unwrap(), 4.0);
        assert!(sq.is_convex().unwrap());
        assert_eq!(sq.bounding_rect().unwrap(), Rect::new(0, 0, 2, 2));
        assert!((sq.min_area_rect().unwrap().area() - 1.0).abs() < 1e-6);
        assert_eq!(sq.in_contour(Point2f::new(0.5, 0.5)).unwrap(), 1.0);
        assert_eq!(sq.in_contour(Point2f::new(3.0, 0.5)).unwrap(), -1.0);
        assert_eq!(sq.in_contour(Point2f::new(0.0, 0.5)).unwrap(), 0.0);
        assert_eq!(sq.distance(Point2f::new(0.5, 0.25)).unwrap(), 0.25);
        let m = sq.moments().unwrap();
        assert!((m.m00 - 1.0).abs() < 1e-12);
        assert_eq!(m.centroid(), Some(Point2d::new(0.5, 0.5)));
    }

    #[test]
    fn hull_returns_original_points() {
        let arena = Arena::new();
        let p = polygon(&arena, &[(0, 0), (4, 0), (2, 1), (4, 4), (0, 4)]);
        let hull = p.convex_hull(Orientation::CounterClockwise, None).unwrap();
        assert_eq!(
            hull.to_vec().unwrap(),
            vec![
                Point2i::new(0, 0),
                Point2i::new(4, 0),
                Point2i::new(4, 4),
                Point2i::new(0, 4)
            ]
        );
        assert!(hull.flags().unwrap().contains(SeqFlags::FLAG_CONVEX));
        assert!(hull.is_convex().unwrap());
        assert!(!p.is_convex().unwrap());
    }

    #[test]
    fn approx_follows_tree_levels() {
        let arena = Arena::new();
        let outer = polygon(&arena, &[(0, 0), (5, 0), (10, 0), (10, 10), (0, 10)]);
        let sibling = polygon(&arena, &[(20, 0), (30, 0), (30, 10), (25, 10), (20, 10)]);
        let child = polygon(&arena, &[(2, 2), (4, 2), (4, 4), (3, 4), (2, 4)]);
        outer.set_h_next(Some(&sibling)).unwrap();
        outer.set_v_next(Some(&child)).unwrap();
        child.set_v_prev(Some(&outer)).unwrap();

        let only = outer.approx_poly(0.5, 0, None).unwrap();
        assert_eq!(only.total().unwrap(), 4);
        assert!(only.h_next().unwrap().is_none());
        assert!(only.v_next().unwrap().is_none());

        let level1 = outer.approx_poly(0.5, 1, None).unwrap();
        let sib = level1.h_next().unwrap().unwrap();
        assert_eq!(sib.total().unwrap(), 4);
        assert_eq!(sib.h_prev().unwrap().unwrap().handle(), level1.handle());
        assert!(level1.v_next().unwrap().is_none());

        let level2 = outer.approx_poly(0.5, 2, None).unwrap();
        let kid = level2.v_next().unwrap().unwrap();
        assert_eq!(kid.total().unwrap(), 4);
        assert_eq!(kid.v_prev().unwrap().unwrap().handle(), level2.handle());
        assert!(level2.h_next().unwrap().is_some());

        let children_only = outer.approx_poly(0.5, -2, None).unwrap();
        assert!(children_only.h_next().unwrap().is_none());
        assert!(children_only.v_next().unwrap().is_some());
    }

    #[test]
    fn approx_survives_link_cycles() {
        let arena = Arena::new();
        let a = square(&arena);
        let b = square(&arena);
        a.set_h_next(Some(&b)).unwrap();
        b.set_h_next(Some(&a)).unwrap();
        let out = a.approx_poly(0.1, 1, None).unwrap();
        let next = out.h_next().unwrap().unwrap();
        assert!(next.h_next().unwrap().is_none());
    }

    #[test]
    fn approx_rejects_negative_accuracy() {
        let sq = square(&Arena::new());
        assert!(matches!(
            sq.approx_poly(-1.0, 0, None),
            Err(CvError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn capacity_exceeded_surfaces() {
        let arena = Arena::with_config(ArenaConfig {
            block_size: 64,
            max_blocks: 1,
            chunk_bytes: 64,
        })
        .unwrap();
        let seq = Sequence::<u64>::new(SeqFlags::EMPTY, &arena).unwrap();
        let mut result = Ok(());
        for i in 0..100 {
            result = seq.push(i);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(CvError::CapacityExceeded { .. })));
    }
}
