//! Element access and whole-matrix numeric routines.
//!
//! All arithmetic is carried out in `f64` and saturated to the destination
//! depth on store. Destinations are passed by shared reference: a header
//! only describes the payload, writes go through its address.

use cvarr_core::{CmpOp, Depth, Point2i};
use tracing::trace;

use crate::error::KernelError;
use crate::header::MatHeader;
use crate::raw;

fn same_shape(op: &'static str, a: &MatHeader, b: &MatHeader) -> Result<(), KernelError> {
    if a.shape() != b.shape() {
        return Err(KernelError::DimensionMismatch {
            op,
            left: a.shape(),
            right: b.shape(),
        });
    }
    Ok(())
}

fn same_depth(op: &'static str, expected: Depth, found: Depth) -> Result<(), KernelError> {
    if expected != found {
        return Err(KernelError::DepthMismatch {
            op,
            expected,
            found,
        });
    }
    Ok(())
}

fn check_index(h: &MatHeader, row: i64, col: i64) -> Result<(usize, usize), KernelError> {
    if row < 0 || row as usize >= h.rows() {
        return Err(KernelError::InvalidIndex {
            axis: "row",
            index: row,
            bound: h.rows(),
        });
    }
    if col < 0 || col as usize >= h.cols() {
        return Err(KernelError::InvalidIndex {
            axis: "col",
            index: col,
            bound: h.cols(),
        });
    }
    Ok((row as usize, col as usize))
}

/// Visit every `(row, col)` of an `rows`×`cols` grid in row-major order.
fn for_each_cell(rows: usize, cols: usize, mut f: impl FnMut(usize, usize)) {
    for r in 0..rows {
        for c in 0..cols {
            f(r, c);
        }
    }
}

/// Read element `(row, col)` as `f64`.
pub fn get_real_2d(h: &MatHeader, row: i64, col: i64) -> Result<f64, KernelError> {
    let depth = h.require()?;
    let (r, c) = check_index(h, row, col)?;
    Ok(raw::read(h, depth, r, c))
}

/// Store `value` at `(row, col)`, saturating to the header's depth.
pub fn set_real_2d(h: &MatHeader, row: i64, col: i64, value: f64) -> Result<(), KernelError> {
    let depth = h.require()?;
    let (r, c) = check_index(h, row, col)?;
    raw::write(h, depth, r, c, value);
    Ok(())
}

/// Copy `src` into `dst`. Both may be strided views.
pub fn copy(src: &MatHeader, dst: &MatHeader) -> Result<(), KernelError> {
    let sd = src.require()?;
    let dd = dst.require()?;
    same_shape("copy", src, dst)?;
    same_depth("copy", sd, dd)?;
    for_each_cell(src.rows(), src.cols(), |r, c| {
        raw::write(dst, dd, r, c, raw::read(src, sd, r, c));
    });
    Ok(())
}

/// Write the transpose of `src` into `dst`, which must be `cols`×`rows`.
pub fn transpose(src: &MatHeader, dst: &MatHeader) -> Result<(), KernelError> {
    let sd = src.require()?;
    let dd = dst.require()?;
    same_depth("transpose", sd, dd)?;
    if dst.shape() != (src.cols(), src.rows()) {
        return Err(KernelError::DimensionMismatch {
            op: "transpose",
            left: src.shape(),
            right: dst.shape(),
        });
    }
    // Staged so that an in-place square transpose reads unmodified values.
    let staged: Vec<f64> = (0..src.rows())
        .flat_map(|r| (0..src.cols()).map(move |c| (r, c)))
        .map(|(r, c)| raw::read(src, sd, r, c))
        .collect();
    let cols = src.cols();
    for_each_cell(src.rows(), cols, |r, c| {
        raw::write(dst, dd, c, r, staged[r * cols + c]);
    });
    Ok(())
}

/// Determinant of a square matrix, by LU decomposition with partial
/// pivoting.
pub fn det(h: &MatHeader) -> Result<f64, KernelError> {
    let depth = h.require()?;
    let n = h.rows();
    if h.cols() != n {
        return Err(KernelError::DimensionMismatch {
            op: "det",
            left: h.shape(),
            right: (n, n),
        });
    }
    let mut m = Vec::with_capacity(n * n);
    for_each_cell(n, n, |r, c| m.push(raw::read(h, depth, r, c)));

    let mut det = 1.0;
    for k in 0..n {
        let (pivot_row, pivot_abs) = (k..n)
            .map(|r| (r, m[r * n + k].abs()))
            .fold((k, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if pivot_abs == 0.0 {
            return Ok(0.0);
        }
        if pivot_row != k {
            for c in 0..n {
                m.swap(k * n + c, pivot_row * n + c);
            }
            det = -det;
        }
        let pivot = m[k * n + k];
        det *= pivot;
        for r in k + 1..n {
            let factor = m[r * n + k] / pivot;
            for c in k + 1..n {
                m[r * n + c] -= factor * m[k * n + c];
            }
        }
    }
    Ok(det)
}

/// Sum of all elements.
pub fn sum(h: &MatHeader) -> Result<f64, KernelError> {
    let depth = h.require()?;
    let mut acc = 0.0;
    for_each_cell(h.rows(), h.cols(), |r, c| acc += raw::read(h, depth, r, c));
    Ok(acc)
}

fn binary(
    op: &'static str,
    a: &MatHeader,
    b: &MatHeader,
    dst: &MatHeader,
    f: impl Fn(f64, f64) -> f64,
) -> Result<(), KernelError> {
    let ad = a.require()?;
    let bd = b.require()?;
    let dd = dst.require()?;
    same_shape(op, a, b)?;
    same_shape(op, a, dst)?;
    same_depth(op, ad, bd)?;
    same_depth(op, ad, dd)?;
    for_each_cell(a.rows(), a.cols(), |r, c| {
        let v = f(raw::read(a, ad, r, c), raw::read(b, bd, r, c));
        raw::write(dst, dd, r, c, v);
    });
    Ok(())
}

fn unary(
    op: &'static str,
    src: &MatHeader,
    dst: &MatHeader,
    f: impl Fn(f64) -> f64,
) -> Result<(), KernelError> {
    let sd = src.require()?;
    let dd = dst.require()?;
    same_shape(op, src, dst)?;
    same_depth(op, sd, dd)?;
    for_each_cell(src.rows(), src.cols(), |r, c| {
        raw::write(dst, dd, r, c, f(raw::read(src, sd, r, c)));
    });
    Ok(())
}

/// `dst = a + b`, elementwise.
pub fn add(a: &MatHeader, b: &MatHeader, dst: &MatHeader) -> Result<(), KernelError> {
    binary("add", a, b, dst, |x, y| x + y)
}

/// `dst = a - b`, elementwise.
pub fn sub(a: &MatHeader, b: &MatHeader, dst: &MatHeader) -> Result<(), KernelError> {
    binary("sub", a, b, dst, |x, y| x - y)
}

/// `dst = scale * a * b`, elementwise.
pub fn mul(a: &MatHeader, b: &MatHeader, dst: &MatHeader, scale: f64) -> Result<(), KernelError> {
    binary("mul", a, b, dst, |x, y| scale * x * y)
}

/// `dst = src + scalar`.
pub fn add_s(src: &MatHeader, scalar: f64, dst: &MatHeader) -> Result<(), KernelError> {
    unary("add_s", src, dst, |x| x + scalar)
}

/// `dst = src - scalar`.
pub fn sub_s(src: &MatHeader, scalar: f64, dst: &MatHeader) -> Result<(), KernelError> {
    unary("sub_s", src, dst, |x| x - scalar)
}

/// `dst = scalar - src`.
pub fn sub_rs(src: &MatHeader, scalar: f64, dst: &MatHeader) -> Result<(), KernelError> {
    unary("sub_rs", src, dst, |x| scalar - x)
}

/// `dst = src * scale + shift`. Depths may differ; results saturate to
/// `dst`'s depth.
pub fn convert_scale(
    src: &MatHeader,
    dst: &MatHeader,
    scale: f64,
    shift: f64,
) -> Result<(), KernelError> {
    let sd = src.require()?;
    let dd = dst.require()?;
    same_shape("convert_scale", src, dst)?;
    for_each_cell(src.rows(), src.cols(), |r, c| {
        raw::write(dst, dd, r, c, raw::read(src, sd, r, c) * scale + shift);
    });
    Ok(())
}

/// Elementwise comparison. `dst` must be `U8`; it receives 255 where the
/// comparison holds and 0 elsewhere.
pub fn cmp(a: &MatHeader, b: &MatHeader, dst: &MatHeader, op: CmpOp) -> Result<(), KernelError> {
    let ad = a.require()?;
    let bd = b.require()?;
    let dd = dst.require()?;
    same_shape("cmp", a, b)?;
    same_shape("cmp", a, dst)?;
    same_depth("cmp", ad, bd)?;
    same_depth("cmp", Depth::U8, dd)?;
    for_each_cell(a.rows(), a.cols(), |r, c| {
        let hit = op.apply(raw::read(a, ad, r, c), raw::read(b, bd, r, c));
        raw::write(dst, dd, r, c, if hit { 255.0 } else { 0.0 });
    });
    Ok(())
}

/// Number of nonzero elements.
pub fn count_non_zero(h: &MatHeader) -> Result<usize, KernelError> {
    let depth = h.require()?;
    let mut n = 0;
    for_each_cell(h.rows(), h.cols(), |r, c| {
        if raw::read(h, depth, r, c) != 0.0 {
            n += 1;
        }
    });
    Ok(n)
}

/// Extreme values of a matrix and where they first occur.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMaxLoc {
    /// Smallest element.
    pub min_value: f64,
    /// Largest element.
    pub max_value: f64,
    /// First location of the minimum, `x` = column, `y` = row.
    pub min_loc: Point2i,
    /// First location of the maximum, `x` = column, `y` = row.
    pub max_loc: Point2i,
}

/// Minimum and maximum elements in row-major scan order; ties keep the
/// first occurrence.
pub fn min_max_loc(h: &MatHeader) -> Result<MinMaxLoc, KernelError> {
    let depth = h.require()?;
    let first = raw::read(h, depth, 0, 0);
    let mut out = MinMaxLoc {
        min_value: first,
        max_value: first,
        min_loc: Point2i::new(0, 0),
        max_loc: Point2i::new(0, 0),
    };
    for_each_cell(h.rows(), h.cols(), |r, c| {
        let v = raw::read(h, depth, r, c);
        let loc = Point2i::new(c as i32, r as i32);
        if v < out.min_value {
            out.min_value = v;
            out.min_loc = loc;
        }
        if v > out.max_value {
            out.max_value = v;
            out.max_loc = loc;
        }
    });
    Ok(out)
}

/// Transpose selectors for [`gemm`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GemmFlags(pub u32);

impl GemmFlags {
    /// No operand transposed.
    pub const NONE: Self = Self(0);
    /// Use `Aᵀ`.
    pub const A_T: Self = Self(1);
    /// Use `Bᵀ`.
    pub const B_T: Self = Self(2);
    /// Use `Cᵀ`.
    pub const C_T: Self = Self(4);

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for GemmFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Reads an operand through an optional transpose.
struct Operand<'a> {
    h: &'a MatHeader,
    depth: Depth,
    transposed: bool,
}

impl Operand<'_> {
    fn shape(&self) -> (usize, usize) {
        let (r, c) = self.h.shape();
        if self.transposed {
            (c, r)
        } else {
            (r, c)
        }
    }

    fn at(&self, r: usize, c: usize) -> f64 {
        if self.transposed {
            raw::read(self.h, self.depth, c, r)
        } else {
            raw::read(self.h, self.depth, r, c)
        }
    }
}

/// Generalised matrix product:
/// `dst = alpha * op(a) * op(b) + beta * op(c)`, where `op` optionally
/// transposes according to `flags`.
pub fn gemm(
    a: &MatHeader,
    b: &MatHeader,
    alpha: f64,
    c: Option<&MatHeader>,
    beta: f64,
    dst: &MatHeader,
    flags: GemmFlags,
) -> Result<(), KernelError> {
    let a = Operand {
        depth: a.require()?,
        h: a,
        transposed: flags.contains(GemmFlags::A_T),
    };
    let b = Operand {
        depth: b.require()?,
        h: b,
        transposed: flags.contains(GemmFlags::B_T),
    };
    let dd = dst.require()?;
    same_depth("gemm", a.depth, b.depth)?;
    same_depth("gemm", a.depth, dd)?;

    let (m, k) = a.shape();
    let (kb, n) = b.shape();
    if k != kb {
        return Err(KernelError::DimensionMismatch {
            op: "gemm",
            left: (m, k),
            right: (kb, n),
        });
    }
    if dst.shape() != (m, n) {
        return Err(KernelError::DimensionMismatch {
            op: "gemm",
            left: (m, n),
            right: dst.shape(),
        });
    }
    let c = match c {
        Some(h) => {
            let op = Operand {
                depth: h.require()?,
                h,
                transposed: flags.contains(GemmFlags::C_T),
            };
            if op.shape() != (m, n) {
                return Err(KernelError::DimensionMismatch {
                    op: "gemm",
                    left: (m, n),
                    right: op.shape(),
                });
            }
            Some(op)
        }
        None => None,
    };
    trace!(m, k, n, "gemm");

    // Staged so that `dst` may alias an input.
    let mut out = vec![0.0; m * n];
    for i in 0..m {
        for j in 0..n {
            let dot: f64 = (0..k).map(|p| a.at(i, p) * b.at(p, j)).sum();
            let addend = c.as_ref().map_or(0.0, |c| beta * c.at(i, j));
            out[i * n + j] = alpha * dot + addend;
        }
    }
    for_each_cell(m, n, |i, j| raw::write(dst, dd, i, j, out[i * n + j]));
    Ok(())
}
