//! Integration tests: sequences sharing an arena, contour trees and
//! geometry on fixture contours.

use cvarr::prelude::*;
use cvarr_test_utils::fixtures::{circle, rectangle, tiny_arena, unit_square};
use cvarr_test_utils::init_tracing;
use proptest::prelude::*;

fn contour<P: PointLike>(arena: &Arena, points: &[P]) -> Sequence<P> {
    let seq = Sequence::new(SeqFlags::POLYGON.with_eltype(P::ELTYPE), arena).unwrap();
    for &p in points {
        seq.push(p).unwrap();
    }
    seq
}

#[test]
fn unit_square_round_trips_in_order() {
    let arena = Arena::new();
    let sq = contour(&arena, &unit_square());
    assert_eq!(sq.total().unwrap(), 4);
    assert_eq!(sq.to_vec().unwrap(), unit_square());
    assert_eq!(sq.iter().collect::<Vec<_>>(), unit_square());
    assert_eq!(sq.area().unwrap(), 1.0);
}

#[test]
fn many_sequences_share_one_arena() {
    let arena = Arena::new();
    let seqs: Vec<Sequence<i32>> = (0..8)
        .map(|_| Sequence::new(SeqFlags::EMPTY, &arena).unwrap())
        .collect();
    for round in 0..50 {
        for (i, s) in seqs.iter().enumerate() {
            s.push(round * 10 + i as i32).unwrap();
        }
    }
    assert_eq!(arena.sequence_count(), 8);
    for (i, s) in seqs.iter().enumerate() {
        assert_eq!(s.total().unwrap(), 50);
        assert_eq!(s.get(49).unwrap(), 490 + i as i32);
    }
}

#[test]
fn clear_then_refill_reuses_storage() {
    let arena = Arena::new();
    let seq = Sequence::<Point2d>::new(SeqFlags::EMPTY, &arena).unwrap();
    for p in circle(200, 5.0) {
        seq.push(p).unwrap();
    }
    let blocks = arena.block_count();
    let used = arena.used_bytes();
    seq.clear().unwrap();
    assert!(seq.is_empty().unwrap());
    for p in circle(200, 5.0) {
        seq.push(p).unwrap();
    }
    assert_eq!(arena.block_count(), blocks);
    assert_eq!(arena.used_bytes(), used);
}

#[test]
fn released_arena_invalidates_its_sequences() {
    init_tracing();
    let arena = Arena::new();
    let sq = contour(&arena, &unit_square());
    arena.release();
    assert!(arena.is_released());
    assert_eq!(sq.get(0).unwrap_err(), CvError::ArenaLifetimeViolation);
    assert_eq!(sq.push(Point2i::new(5, 5)).unwrap_err(), CvError::ArenaLifetimeViolation);
    assert_eq!(sq.area().unwrap_err(), CvError::ArenaLifetimeViolation);
}

#[test]
fn full_arena_reports_capacity() {
    let arena = tiny_arena();
    let seq = Sequence::<f64>::new(SeqFlags::EMPTY, &arena).unwrap();
    let err = (0..1000).map(|i| seq.push(i as f64)).find_map(Result::err);
    assert!(matches!(err, Some(CvError::CapacityExceeded { .. })));
}

#[test]
fn hull_of_a_square_with_interior_points() {
    let arena = Arena::new();
    let mut pts = rectangle(0, 0, 10, 10);
    pts.extend([Point2i::new(5, 5), Point2i::new(2, 7), Point2i::new(9, 1)]);
    let cloud = contour(&arena, &pts);
    let hull = cloud.convex_hull(Orientation::CounterClockwise, None).unwrap();
    assert_eq!(hull.total().unwrap(), 4);
    assert!(hull.flags().unwrap().contains(SeqFlags::FLAG_CONVEX));
    assert!(hull.is_convex().unwrap());
    assert_eq!(hull.area().unwrap(), 100.0);
}

#[test]
fn approx_poly_collapses_a_dense_rectangle() {
    let arena = Arena::new();
    let mut pts = Vec::new();
    for x in 0..10 {
        pts.push(Point2i::new(x, 0));
    }
    for y in 0..10 {
        pts.push(Point2i::new(10, y));
    }
    for x in (1..=10).rev() {
        pts.push(Point2i::new(x, 10));
    }
    for y in (1..=10).rev() {
        pts.push(Point2i::new(0, y));
    }
    let dense = contour(&arena, &pts);
    let simple = dense.approx_poly(0.5, 0, None).unwrap();
    assert_eq!(simple.total().unwrap(), 4);
    assert_eq!(simple.area().unwrap(), 100.0);
}

#[test]
fn approx_poly_mirrors_a_contour_tree_into_another_arena() {
    let src = Arena::new();
    let outer = contour(&src, &rectangle(0, 0, 20, 20));
    let sibling = contour(&src, &rectangle(30, 0, 5, 5));
    let hole = contour(&src, &rectangle(5, 5, 4, 4));
    outer.set_h_next(Some(&sibling)).unwrap();
    sibling.set_h_prev(Some(&outer)).unwrap();
    outer.set_v_next(Some(&hole)).unwrap();
    hole.set_v_prev(Some(&outer)).unwrap();

    let dst = Arena::new();
    let out = outer.approx_poly(1.0, 2, Some(&dst)).unwrap();
    assert_eq!(out.arena().id(), dst.id());
    let out_sibling = out.h_next().unwrap().unwrap();
    let out_hole = out.v_next().unwrap().unwrap();
    assert_eq!(out_sibling.area().unwrap(), 25.0);
    assert_eq!(out_hole.area().unwrap(), 16.0);
    assert_eq!(out_hole.v_prev().unwrap().unwrap().handle(), out.handle());
    assert!(out_sibling.h_next().unwrap().is_none());

    let solo = outer.approx_poly(1.0, 0, Some(&dst)).unwrap();
    assert!(solo.h_next().unwrap().is_none());
    assert!(solo.v_next().unwrap().is_none());
}

#[test]
fn rotated_rectangle_is_found() {
    let arena = Arena::new();
    let diamond = [(5, 0), (10, 5), (5, 10), (0, 5)].map(|(x, y)| Point2f::new(x as f32, y as f32));
    let seq = contour(&arena, &diamond);
    let b = seq.min_area_rect().unwrap();
    assert!((b.area() - 50.0).abs() < 1e-3);
    assert_eq!(seq.bounding_rect().unwrap(), Rect::new(0, 0, 11, 11));
    assert_eq!(seq.in_contour(Point2f::new(5.0, 5.0)).unwrap(), 1.0);
    assert_eq!(seq.in_contour(Point2f::new(0.5, 0.5)).unwrap(), -1.0);
}

#[test]
fn circle_moments_are_centred() {
    let arena = Arena::new();
    let seq = contour(&arena, &circle(64, 10.0));
    let c = seq.moments().unwrap().centroid().unwrap();
    assert!(c.x.abs() < 1e-9 && c.y.abs() < 1e-9);
    assert!((seq.perimeter().unwrap() - std::f64::consts::TAU * 10.0).abs() < 0.1);
}

proptest! {
    #[test]
    fn slices_see_the_right_elements(values in prop::collection::vec(any::<i32>(), 1..200),
                                     a in 0usize..200, b in 0usize..200) {
        let (start, end) = (a.min(b), a.max(b) + 1);
        prop_assume!(start < values.len());
        let arena = Arena::new();
        let seq = Sequence::<i32>::new(SeqFlags::EMPTY, &arena).unwrap();
        for &v in &values {
            seq.push(v).unwrap();
        }
        let end = end.min(values.len());
        let alias = seq.slice(start..end, None, false).unwrap();
        let copy = seq.slice(start..end, Some(&Arena::new()), true).unwrap();
        prop_assert_eq!(alias.to_vec().unwrap(), values[start..end].to_vec());
        prop_assert_eq!(copy.to_vec().unwrap(), values[start..end].to_vec());
    }
}
