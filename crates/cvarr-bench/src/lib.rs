//! Seeded inputs for the cvarr benchmarks.
//!
//! - [`random_matrix`]: `rows`×`cols` values in `[-1, 1)`
//! - [`random_cloud`]: integer points in a square
//! - [`fill_sequence`]: push a point list into a fresh sequence

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cvarr::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A `rows`×`cols` matrix of uniform values in `[-1, 1)`.
pub fn random_matrix(rows: usize, cols: usize, seed: u64) -> Result<Matrix<f64>, CvError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let data = (0..rows * cols)
        .map(|_| rng.random::<f64>() * 2.0 - 1.0)
        .collect();
    Matrix::from_vec(rows, cols, data)
}

/// `n` integer points with coordinates in `0..extent`.
pub fn random_cloud(n: usize, extent: i32, seed: u64) -> Vec<Point2i> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| Point2i::new(rng.random_range(0..extent), rng.random_range(0..extent)))
        .collect()
}

/// A closed polygon sequence in `arena` holding `points`.
pub fn fill_sequence(arena: &Arena, points: &[Point2i]) -> Result<Sequence<Point2i>, CvError> {
    let seq = Sequence::new(SeqFlags::POLYGON.with_eltype(Point2i::ELTYPE), arena)?;
    for &p in points {
        seq.push(p)?;
    }
    Ok(seq)
}
