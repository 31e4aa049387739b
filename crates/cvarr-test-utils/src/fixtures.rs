//! Standard matrices, contours and arenas.
//!
//! - [`two_by_two`]: `[[1, 2], [3, 4]]`, sum 10, determinant -2.
//! - [`unit_square`]: counter-clockwise unit square, area 1.
//! - [`tiny_arena`]: an arena that overflows after a few pushes.

use cvarr_arena::{Arena, ArenaConfig};
use cvarr_core::{Point2d, Point2i};

pub fn two_by_two() -> Vec<Vec<f64>> {
    vec![vec![1.0, 2.0], vec![3.0, 4.0]]
}

/// `rows`×`cols` values counting up from 0 in row-major order.
pub fn counting(rows: usize, cols: usize) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|r| (0..cols).map(|c| (r * cols + c) as f64).collect())
        .collect()
}

pub fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|r| (0..n).map(|c| if r == c { 1.0 } else { 0.0 }).collect())
        .collect()
}

pub fn unit_square() -> Vec<Point2i> {
    [(0, 0), (1, 0), (1, 1), (0, 1)]
        .into_iter()
        .map(|(x, y)| Point2i::new(x, y))
        .collect()
}

/// `w`×`h` axis-aligned rectangle with its corner at `(x, y)`.
pub fn rectangle(x: i32, y: i32, w: i32, h: i32) -> Vec<Point2i> {
    vec![
        Point2i::new(x, y),
        Point2i::new(x + w, y),
        Point2i::new(x + w, y + h),
        Point2i::new(x, y + h),
    ]
}

/// `n` points on a circle of `radius` around the origin, counter-clockwise.
pub fn circle(n: usize, radius: f64) -> Vec<Point2d> {
    (0..n)
        .map(|i| {
            let t = std::f64::consts::TAU * i as f64 / n as f64;
            Point2d::new(radius * t.cos(), radius * t.sin())
        })
        .collect()
}

/// One 64-byte block with 64-byte chunks.
pub fn tiny_arena() -> Arena {
    let config = ArenaConfig {
        block_size: 64,
        max_blocks: 1,
        chunk_bytes: 64,
    };
    match Arena::with_config(config) {
        Ok(arena) => arena,
        Err(e) => panic!("tiny arena config rejected: {e}"),
    }
}
