//! Contour geometry on point slices.
//!
//! Contours are treated as polygons in a y-up coordinate system: a positive
//! signed area means counter-clockwise vertex order. Routines that select a
//! subset of the input return indices so callers can rebuild results in
//! their own point type.

use std::f64::consts::TAU;

use cvarr_core::{Box2D, Moments, Orientation, Point2d, Point2f, Rect, Size2f};
use smallvec::SmallVec;

use crate::error::KernelError;

#[inline]
fn cross(o: Point2d, a: Point2d, b: Point2d) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

#[inline]
fn dist(a: Point2d, b: Point2d) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn dist_to_segment(p: Point2d, a: Point2d, b: Point2d) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return dist(p, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    dist(p, Point2d::new(a.x + t * dx, a.y + t * dy))
}

fn dist_to_line(p: Point2d, a: Point2d, b: Point2d) -> f64 {
    let len = dist(a, b);
    if len == 0.0 {
        return dist(p, a);
    }
    cross(a, b, p).abs() / len
}

/// Edges `(prev, cur)` of the closed polygon through `pts`.
fn closed_edges(pts: &[Point2d]) -> impl Iterator<Item = (Point2d, Point2d)> + '_ {
    let n = pts.len();
    (0..n).map(move |i| (pts[(i + n - 1) % n], pts[i]))
}

/// Signed area of the closed polygon; positive for counter-clockwise order.
pub fn signed_area(pts: &[Point2d]) -> f64 {
    closed_edges(pts)
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f64>()
        / 2.0
}

/// Unsigned area of the closed polygon.
pub fn contour_area(pts: &[Point2d]) -> f64 {
    signed_area(pts).abs()
}

/// Total edge length, including the closing edge when `closed`.
pub fn arc_length(pts: &[Point2d], closed: bool) -> f64 {
    let open: f64 = pts.windows(2).map(|w| dist(w[0], w[1])).sum();
    match (closed, pts) {
        (true, [first, .., last]) => open + dist(*last, *first),
        _ => open,
    }
}

/// Smallest integer rectangle containing every point.
///
/// Bounds are floored, so width is `floor(max_x) - floor(min_x) + 1`.
/// An empty slice yields an empty rectangle.
pub fn bounding_rect(pts: &[Point2d]) -> Rect {
    let Some(first) = pts.first() else {
        return Rect::default();
    };
    let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
    for p in &pts[1..] {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    let (x0, y0) = (x0.floor() as i32, y0.floor() as i32);
    let (x1, y1) = (x1.floor() as i32, y1.floor() as i32);
    Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1)
}

/// Convex hull by monotone chain.
///
/// Returns indices into `pts` in the requested order. Duplicate and
/// collinear boundary points are dropped.
pub fn convex_hull(pts: &[Point2d], orientation: Orientation) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..pts.len()).collect();
    idx.sort_by(|&i, &j| {
        pts[i]
            .x
            .total_cmp(&pts[j].x)
            .then(pts[i].y.total_cmp(&pts[j].y))
    });
    idx.dedup_by(|a, b| pts[*a] == pts[*b]);
    if idx.len() < 3 {
        if orientation == Orientation::Clockwise {
            idx.reverse();
        }
        return idx;
    }

    let mut hull: Vec<usize> = Vec::with_capacity(idx.len() + 1);
    let turns_left = |hull: &[usize], next: usize| {
        let n = hull.len();
        cross(pts[hull[n - 2]], pts[hull[n - 1]], pts[next]) > 0.0
    };
    for &i in &idx {
        while hull.len() >= 2 && !turns_left(&hull, i) {
            hull.pop();
        }
        hull.push(i);
    }
    let lower = hull.len() + 1;
    for &i in idx.iter().rev().skip(1) {
        while hull.len() >= lower && !turns_left(&hull, i) {
            hull.pop();
        }
        hull.push(i);
    }
    hull.pop();

    if orientation == Orientation::Clockwise {
        hull.reverse();
    }
    hull
}

/// Whether the closed polygon is convex.
///
/// Every turn must have the same sign and the turns must sum to one full
/// revolution. Fewer than three points, or a 180° reversal, is not convex.
pub fn is_convex(pts: &[Point2d]) -> bool {
    let n = pts.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    let mut turning = 0.0;
    for i in 0..n {
        let (a, b, c) = (pts[(i + n - 1) % n], pts[i], pts[(i + 1) % n]);
        let (e1x, e1y) = (b.x - a.x, b.y - a.y);
        let (e2x, e2y) = (c.x - b.x, c.y - b.y);
        if (e1x == 0.0 && e1y == 0.0) || (e2x == 0.0 && e2y == 0.0) {
            continue;
        }
        let z = e1x * e2y - e1y * e2x;
        let dot = e1x * e2x + e1y * e2y;
        if z == 0.0 {
            if dot < 0.0 {
                return false;
            }
            continue;
        }
        if sign == 0.0 {
            sign = z.signum();
        } else if z.signum() != sign {
            return false;
        }
        turning += z.atan2(dot);
    }
    sign != 0.0 && (turning.abs() - TAU).abs() < 1e-6
}

/// Minimum-area enclosing rotated rectangle, by rotating calipers over the
/// convex hull. The angle is normalised to `[-90, 0)` degrees.
pub fn min_area_rect(pts: &[Point2d]) -> Box2D {
    let hull: Vec<Point2d> = convex_hull(pts, Orientation::CounterClockwise)
        .into_iter()
        .map(|i| pts[i])
        .collect();
    match hull.as_slice() {
        [] => Box2D::default(),
        [p] => normalize_box(*p, 0.0, 0.0, 0.0),
        _ => {
            let n = hull.len();
            let mut best: Option<(f64, Point2d, f64, f64, f64)> = None;
            for i in 0..n {
                let (a, b) = (hull[i], hull[(i + 1) % n]);
                let len = dist(a, b);
                let (ux, uy) = ((b.x - a.x) / len, (b.y - a.y) / len);
                let (mut u0, mut u1, mut v0, mut v1) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
                for p in &hull {
                    let (dx, dy) = (p.x - a.x, p.y - a.y);
                    let u = dx * ux + dy * uy;
                    let v = dy * ux - dx * uy;
                    u0 = u0.min(u);
                    u1 = u1.max(u);
                    v0 = v0.min(v);
                    v1 = v1.max(v);
                }
                let area = (u1 - u0) * (v1 - v0);
                if best.as_ref().is_none_or(|b| area < b.0) {
                    let (cu, cv) = ((u0 + u1) / 2.0, (v0 + v1) / 2.0);
                    let center = Point2d::new(a.x + cu * ux - cv * uy, a.y + cu * uy + cv * ux);
                    best = Some((area, center, u1 - u0, v1 - v0, uy.atan2(ux).to_degrees()));
                }
            }
            match best {
                Some((_, center, w, h, angle)) => normalize_box(center, w, h, angle),
                None => Box2D::default(),
            }
        }
    }
}

fn normalize_box(center: Point2d, mut width: f64, mut height: f64, mut angle: f64) -> Box2D {
    while angle >= 0.0 {
        angle -= 90.0;
        std::mem::swap(&mut width, &mut height);
    }
    while angle < -90.0 {
        angle += 90.0;
        std::mem::swap(&mut width, &mut height);
    }
    Box2D {
        center: Point2f::new(center.x as f32, center.y as f32),
        size: Size2f {
            width: width as f32,
            height: height as f32,
        },
        angle: angle as f32,
    }
}

/// Douglas-Peucker simplification.
///
/// Returns the indices of kept points in input order. A closed contour is
/// split at the point farthest from the first one and both halves are
/// simplified independently.
pub fn approx_poly_dp(
    pts: &[Point2d],
    epsilon: f64,
    closed: bool,
) -> Result<Vec<usize>, KernelError> {
    if !(epsilon >= 0.0) {
        return Err(KernelError::InvalidArgument {
            detail: format!("approximation accuracy must be non-negative, got {epsilon}"),
        });
    }
    let n = pts.len();
    if n <= 2 {
        return Ok((0..n).collect());
    }
    let mut keep = vec![false; n];
    if closed {
        let far = (1..n)
            .map(|i| (i, dist(pts[0], pts[i])))
            .fold((1, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best })
            .0;
        let first: Vec<usize> = (0..=far).collect();
        let second: Vec<usize> = (far..n).chain(std::iter::once(0)).collect();
        simplify(pts, &first, epsilon, &mut keep);
        simplify(pts, &second, epsilon, &mut keep);
    } else {
        let chain: Vec<usize> = (0..n).collect();
        simplify(pts, &chain, epsilon, &mut keep);
    }
    Ok((0..n).filter(|&i| keep[i]).collect())
}

fn simplify(pts: &[Point2d], chain: &[usize], epsilon: f64, keep: &mut [bool]) {
    let mut stack: SmallVec<[(usize, usize); 32]> = SmallVec::new();
    stack.push((0, chain.len() - 1));
    while let Some((lo, hi)) = stack.pop() {
        keep[chain[lo]] = true;
        keep[chain[hi]] = true;
        if hi <= lo + 1 {
            continue;
        }
        let (a, b) = (pts[chain[lo]], pts[chain[hi]]);
        let (split, d) = (lo + 1..hi)
            .map(|k| (k, dist_to_line(pts[chain[k]], a, b)))
            .fold((lo, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if d > epsilon {
            stack.push((lo, split));
            stack.push((split, hi));
        }
    }
}

/// Locate `pt` relative to the closed polygon.
///
/// Without `measure_dist`: `1.0` inside, `-1.0` outside, `0.0` on an edge.
/// With it: the distance to the nearest edge, positive inside and negative
/// outside. An empty polygon reports every point as outside.
pub fn point_polygon_test(pts: &[Point2d], pt: Point2d, measure_dist: bool) -> f64 {
    if pts.is_empty() {
        return if measure_dist { f64::NEG_INFINITY } else { -1.0 };
    }
    let mut inside = false;
    let mut nearest = f64::INFINITY;
    for (a, b) in closed_edges(pts) {
        let on_segment = cross(a, b, pt) == 0.0
            && pt.x >= a.x.min(b.x)
            && pt.x <= a.x.max(b.x)
            && pt.y >= a.y.min(b.y)
            && pt.y <= a.y.max(b.y);
        if on_segment {
            return 0.0;
        }
        if (a.y > pt.y) != (b.y > pt.y) {
            let x = a.x + (pt.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if pt.x < x {
                inside = !inside;
            }
        }
        if measure_dist {
            nearest = nearest.min(dist_to_segment(pt, a, b));
        }
    }
    let sign = if inside { 1.0 } else { -1.0 };
    if measure_dist {
        sign * nearest
    } else {
        sign
    }
}

/// Spatial and central moments of the closed polygon, by Green's theorem.
///
/// Moments are reported for positive orientation regardless of vertex
/// order. A contour with zero area yields all-zero moments.
pub fn moments(pts: &[Point2d]) -> Moments {
    let mut a = [0.0f64; 10];
    for (p, q) in closed_edges(pts) {
        let (xp, yp, x, y) = (p.x, p.y, q.x, q.y);
        let (xp2, yp2, x2, y2) = (xp * xp, yp * yp, x * x, y * y);
        let dxy = xp * y - x * yp;
        let (xs, ys) = (xp + x, yp + y);
        a[0] += dxy;
        a[1] += dxy * xs;
        a[2] += dxy * ys;
        a[3] += dxy * (xp * xs + x2);
        a[4] += dxy * (xp * (ys + yp) + x * (ys + y));
        a[5] += dxy * (yp * ys + y2);
        a[6] += dxy * xs * (xp2 + x2);
        a[7] += dxy * (xp2 * (3.0 * yp + y) + 2.0 * x * xp * ys + x2 * (yp + 3.0 * y));
        a[8] += dxy * (yp2 * (3.0 * xp + x) + 2.0 * y * yp * xs + y2 * (xp + 3.0 * x));
        a[9] += dxy * ys * (yp2 + y2);
    }
    if a[0].abs() <= f64::from(f32::EPSILON) {
        return Moments::default();
    }
    let s = a[0].signum();
    let mut m = Moments {
        m00: s * a[0] / 2.0,
        m10: s * a[1] / 6.0,
        m01: s * a[2] / 6.0,
        m20: s * a[3] / 12.0,
        m11: s * a[4] / 24.0,
        m02: s * a[5] / 12.0,
        m30: s * a[6] / 20.0,
        m21: s * a[7] / 60.0,
        m12: s * a[8] / 60.0,
        m03: s * a[9] / 20.0,
        ..Moments::default()
    };
    let inv_m00 = 1.0 / m.m00;
    let (cx, cy) = (m.m10 * inv_m00, m.m01 * inv_m00);
    m.mu20 = m.m20 - m.m10 * cx;
    m.mu11 = m.m11 - m.m10 * cy;
    m.mu02 = m.m02 - m.m01 * cy;
    m.mu30 = m.m30 - cx * (3.0 * m.mu20 + cx * m.m10);
    m.mu21 = m.m21 - cx * (2.0 * m.mu11 + cx * m.m01) - cy * m.mu20;
    m.mu12 = m.m12 - cy * (2.0 * m.mu11 + cy * m.m10) - cx * m.mu02;
    m.mu03 = m.m03 - cy * (3.0 * m.mu02 + cy * m.m01);
    m.inv_sqrt_m00 = inv_m00.abs().sqrt();
    m
}
