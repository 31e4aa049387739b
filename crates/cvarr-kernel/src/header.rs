//! The fixed-layout matrix header.

use std::ptr;

use cvarr_core::Depth;

use crate::error::KernelError;

/// Fixed-layout matrix header: `{ type_tag, rows, cols, step, data }`.
///
/// A header never owns its payload. It is only made meaningful by
/// [`MatHeader::init`] or by a view routine deriving it from an initialised
/// header; until then [`is_valid`](Self::is_valid) is false and every
/// kernel routine rejects it.
#[repr(C)]
#[derive(Debug)]
pub struct MatHeader {
    type_tag: i32,
    rows: i32,
    cols: i32,
    step: i32,
    pub(crate) data: *mut u8,
}

impl MatHeader {
    /// Magic value marking an initialised matrix header.
    pub const MAGIC: i32 = 0x4242_0000;
    /// Mask of the magic bits.
    pub const MAGIC_MASK: i32 = 0xFFFF_0000_u32 as i32;
    /// Set when rows are stored back to back with no gap.
    pub const CONT_FLAG: i32 = 1 << 14;

    /// An uninitialised header.
    pub const fn empty() -> Self {
        Self {
            type_tag: 0,
            rows: 0,
            cols: 0,
            step: 0,
            data: ptr::null_mut(),
        }
    }

    /// Point this header at `data`, describing a `rows`×`cols` matrix of
    /// `depth` elements whose rows start `step` bytes apart.
    ///
    /// # Safety
    ///
    /// `data` must be valid for reads and writes of
    /// `(rows - 1) * step + cols * depth.size()` bytes, and must stay valid
    /// for as long as this header, or any view header derived from it, is
    /// passed to a kernel routine.
    #[allow(unsafe_code)]
    pub unsafe fn init(
        &mut self,
        rows: usize,
        cols: usize,
        depth: Depth,
        data: *mut u8,
        step: usize,
    ) -> Result<(), KernelError> {
        if rows == 0 || cols == 0 {
            return Err(KernelError::InvalidArgument {
                detail: format!("matrix dimensions must be positive, got {rows}x{cols}"),
            });
        }
        if data.is_null() {
            return Err(KernelError::InvalidArgument {
                detail: "null payload address".into(),
            });
        }
        if step < cols * depth.size() {
            return Err(KernelError::InvalidArgument {
                detail: format!(
                    "step {step} is shorter than a row of {cols} {depth} elements"
                ),
            });
        }
        self.set_fields(rows, cols, depth, data, step)
    }

    /// Write all fields; `data` validity is the caller's responsibility.
    pub(crate) fn set_fields(
        &mut self,
        rows: usize,
        cols: usize,
        depth: Depth,
        data: *mut u8,
        step: usize,
    ) -> Result<(), KernelError> {
        let narrow = |v: usize| {
            i32::try_from(v).map_err(|_| KernelError::InvalidArgument {
                detail: format!("{v} does not fit a header field"),
            })
        };
        let continuous = rows == 1 || step == cols * depth.size();
        self.type_tag =
            Self::MAGIC | depth as i32 | if continuous { Self::CONT_FLAG } else { 0 };
        self.rows = narrow(rows)?;
        self.cols = narrow(cols)?;
        self.step = narrow(step)?;
        self.data = data;
        Ok(())
    }

    /// Reset to the uninitialised state.
    pub fn invalidate(&mut self) {
        *self = Self::empty();
    }

    /// Whether the header was initialised and not invalidated since.
    pub fn is_valid(&self) -> bool {
        self.type_tag & Self::MAGIC_MASK == Self::MAGIC && !self.data.is_null()
    }

    /// Raw type tag.
    pub fn type_tag(&self) -> i32 {
        self.type_tag
    }

    /// Element depth, if the tag is valid.
    pub fn depth(&self) -> Option<Depth> {
        if self.type_tag & Self::MAGIC_MASK != Self::MAGIC {
            return None;
        }
        Depth::from_code(self.type_tag)
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols as usize
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Distance between row starts in bytes.
    pub fn step(&self) -> usize {
        self.step as usize
    }

    /// Address of element `(0, 0)`.
    pub fn data(&self) -> *const u8 {
        self.data
    }

    /// Whether rows are stored back to back.
    pub fn is_continuous(&self) -> bool {
        self.type_tag & Self::CONT_FLAG != 0
    }

    /// Depth of a valid header, or the error kernel routines report.
    pub(crate) fn require(&self) -> Result<Depth, KernelError> {
        if !self.is_valid() {
            return Err(KernelError::InvalidArgument {
                detail: "uninitialised matrix header".into(),
            });
        }
        self.depth().ok_or(KernelError::UnsupportedDepth {
            type_tag: self.type_tag,
        })
    }
}

impl Default for MatHeader {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_fixed() {
        assert_eq!(
            std::mem::size_of::<MatHeader>(),
            4 * 4 + std::mem::size_of::<*mut u8>()
        );
    }

    #[test]
    fn empty_header_is_invalid() {
        let h = MatHeader::empty();
        assert!(!h.is_valid());
        assert!(h.require().is_err());
    }

    #[test]
    #[allow(unsafe_code)]
    fn init_sets_tag_and_continuity() {
        let mut buf = [0f32; 6];
        let mut h = MatHeader::empty();
        // SAFETY: `buf` covers 2 rows of 3 f32 and outlives `h`.
        unsafe { h.init(2, 3, Depth::F32, buf.as_mut_ptr().cast(), 12) }.unwrap();
        assert!(h.is_valid());
        assert!(h.is_continuous());
        assert_eq!(h.depth(), Some(Depth::F32));
        assert_eq!(h.shape(), (2, 3));
        assert_eq!(h.data(), buf.as_ptr().cast());
        h.invalidate();
        assert!(!h.is_valid());
    }

    #[test]
    #[allow(unsafe_code)]
    fn init_rejects_short_step() {
        let mut buf = [0u8; 4];
        let mut h = MatHeader::empty();
        // SAFETY: rejected before the pointer is recorded.
        let res = unsafe { h.init(2, 2, Depth::F64, buf.as_mut_ptr(), 2) };
        assert!(res.is_err());
        assert!(!h.is_valid());
    }
}
