//! Element reads and writes through header payload addresses.
//!
//! The only place the kernel dereferences a payload pointer. Every caller
//! validates the header and bounds-checks `(row, col)` first; each function
//! carries a `// SAFETY:` comment tying it to the [`MatHeader::init`]
//! contract.

#![allow(unsafe_code)]

use cvarr_core::Depth;

use crate::header::MatHeader;

#[inline]
fn offset(h: &MatHeader, depth: Depth, row: usize, col: usize) -> usize {
    row * h.step() + col * depth.size()
}

/// Read element `(row, col)` widened to `f64`.
///
/// Callers guarantee `h` is valid, `depth` is its depth, `row < rows` and
/// `col < cols`.
#[inline]
pub(crate) fn read(h: &MatHeader, depth: Depth, row: usize, col: usize) -> f64 {
    debug_assert!(row < h.rows() && col < h.cols());
    // SAFETY: `MatHeader::init` requires `data` to cover
    // `(rows - 1) * step + cols * size` bytes for as long as the header is in
    // use, and view headers only ever narrow that region. In-range
    // coordinates therefore address a whole element inside the payload.
    // Reads are unaligned because views may start at any byte offset.
    unsafe {
        let p = h.data.add(offset(h, depth, row, col));
        match depth {
            Depth::U8 => p.read() as f64,
            Depth::I8 => p.cast::<i8>().read() as f64,
            Depth::U16 => p.cast::<u16>().read_unaligned() as f64,
            Depth::I16 => p.cast::<i16>().read_unaligned() as f64,
            Depth::I32 => p.cast::<i32>().read_unaligned() as f64,
            Depth::F32 => p.cast::<f32>().read_unaligned() as f64,
            Depth::F64 => p.cast::<f64>().read_unaligned(),
        }
    }
}

/// Write `v`, saturated to `depth`, into element `(row, col)`.
///
/// Same caller guarantees as [`read`].
#[inline]
pub(crate) fn write(h: &MatHeader, depth: Depth, row: usize, col: usize, v: f64) {
    debug_assert!(row < h.rows() && col < h.cols());
    let v = depth.saturate(v);
    // SAFETY: see `read`; the payload is writable per the `init` contract.
    // Values are already saturated, so the narrowing casts are exact.
    unsafe {
        let p = h.data.add(offset(h, depth, row, col));
        match depth {
            Depth::U8 => p.write(v as u8),
            Depth::I8 => p.cast::<i8>().write(v as i8),
            Depth::U16 => p.cast::<u16>().write_unaligned(v as u16),
            Depth::I16 => p.cast::<i16>().write_unaligned(v as i16),
            Depth::I32 => p.cast::<i32>().write_unaligned(v as i32),
            Depth::F32 => p.cast::<f32>().write_unaligned(v as f32),
            Depth::F64 => p.cast::<f64>().write_unaligned(v),
        }
    }
}

/// Address of element `(row, col)`, for deriving view headers.
///
/// Callers guarantee the coordinates are in range.
#[inline]
pub(crate) fn element_ptr(h: &MatHeader, depth: Depth, row: usize, col: usize) -> *mut u8 {
    // `wrapping_add` keeps this safe; in-range coordinates never wrap.
    h.data.wrapping_add(offset(h, depth, row, col))
}
