//! View headers that alias a region of an existing payload.
//!
//! Each routine fills `dst` so that it describes part of `src`'s payload.
//! Nothing ties `dst` to that payload, so the routines are `unsafe`: the
//! caller must keep the payload alive for as long as `dst` is used.
//!
//! ```compile_fail
//! # use cvarr_kernel::{get_rows, MatHeader};
//! # fn derive(src: &MatHeader) {
//! let mut dst = MatHeader::empty();
//! get_rows(src, &mut dst, 0, 1, 1).unwrap();
//! # }
//! ```

use cvarr_core::Rect;

use crate::error::KernelError;
use crate::header::MatHeader;
use crate::raw;

fn range_error(op: &'static str, start: i64, end: i64, bound: usize) -> KernelError {
    KernelError::InvalidRange {
        op,
        start,
        end,
        bound,
    }
}

fn check_range(op: &'static str, start: i64, end: i64, bound: usize) -> Result<(), KernelError> {
    if start < 0 || end <= start || end as usize > bound {
        return Err(range_error(op, start, end, bound));
    }
    Ok(())
}

/// Describe the rectangle `rect` of `src`.
///
/// # Safety
///
/// `dst` must not be passed to a kernel routine after the payload `src`
/// describes has been freed.
#[allow(unsafe_code)]
pub unsafe fn get_sub_rect(
    src: &MatHeader,
    dst: &mut MatHeader,
    rect: Rect,
) -> Result<(), KernelError> {
    let depth = src.require()?;
    let (x, y) = (rect.x as i64, rect.y as i64);
    check_range("sub_rect", x, x + rect.width as i64, src.cols())?;
    check_range("sub_rect", y, y + rect.height as i64, src.rows())?;
    let data = raw::element_ptr(src, depth, y as usize, x as usize);
    dst.set_fields(
        rect.height as usize,
        rect.width as usize,
        depth,
        data,
        src.step(),
    )
}

/// Describe rows `start, start + delta, ...` below `end` of `src`.
///
/// # Safety
///
/// As for [`get_sub_rect`].
#[allow(unsafe_code)]
pub unsafe fn get_rows(
    src: &MatHeader,
    dst: &mut MatHeader,
    start: i64,
    end: i64,
    delta: i64,
) -> Result<(), KernelError> {
    let depth = src.require()?;
    check_range("rows", start, end, src.rows())?;
    if delta < 1 {
        return Err(KernelError::InvalidArgument {
            detail: format!("row step must be positive, got {delta}"),
        });
    }
    let rows = ((end - start - 1) / delta) as usize + 1;
    let step = if rows == 1 {
        src.step()
    } else {
        usize::try_from(delta)
            .ok()
            .and_then(|d| src.step().checked_mul(d))
            .ok_or_else(|| range_error("rows", start, end, src.rows()))?
    };
    let data = raw::element_ptr(src, depth, start as usize, 0);
    dst.set_fields(rows, src.cols(), depth, data, step)
}

/// Describe columns `start..end` of `src`.
///
/// # Safety
///
/// As for [`get_sub_rect`].
#[allow(unsafe_code)]
pub unsafe fn get_cols(
    src: &MatHeader,
    dst: &mut MatHeader,
    start: i64,
    end: i64,
) -> Result<(), KernelError> {
    let depth = src.require()?;
    check_range("cols", start, end, src.cols())?;
    let data = raw::element_ptr(src, depth, 0, start as usize);
    dst.set_fields(
        src.rows(),
        (end - start) as usize,
        depth,
        data,
        src.step(),
    )
}

/// Describe diagonal `k` of `src` as a column.
///
/// `k = 0` is the main diagonal, `k > 0` starts at row `k` (below the main
/// diagonal), `k < 0` starts at column `-k`.
///
/// # Safety
///
/// As for [`get_sub_rect`].
#[allow(unsafe_code)]
pub unsafe fn get_diag(
    src: &MatHeader,
    dst: &mut MatHeader,
    k: i64,
) -> Result<(), KernelError> {
    let depth = src.require()?;
    let offset = usize::try_from(k.unsigned_abs()).unwrap_or(usize::MAX);
    let (row0, col0) = if k >= 0 { (offset, 0) } else { (0, offset) };
    let len = src
        .rows()
        .saturating_sub(row0)
        .min(src.cols().saturating_sub(col0));
    if len == 0 {
        return Err(range_error(
            "diag",
            k,
            k.saturating_add(1),
            src.rows().max(src.cols()),
        ));
    }
    let data = raw::element_ptr(src, depth, row0, col0);
    dst.set_fields(len, 1, depth, data, src.step() + depth.size())
}
