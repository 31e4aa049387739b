//! Pinned matrix payloads.
//!
//! A [`PinnedBuffer`] owns a heap array whose address never changes for the
//! lifetime of the buffer. Matrix headers record that address, so the
//! buffer is never resized and never hands out Rust references to its
//! elements: the kernel may write through the header at any time.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;
use std::rc::Rc;

use cvarr_core::{Depth, Element};
use cvarr_kernel::{KernelError, MatHeader};

/// A fixed-address element array adopted from a `Vec<T>`.
///
/// Elements are only read and written by value. The type is `!Send` and
/// `!Sync`.
pub struct PinnedBuffer<T: Element> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    _owns: PhantomData<T>,
}

impl<T: Element> PinnedBuffer<T> {
    /// A zero-filled buffer of `len` elements.
    pub fn zeroed(len: usize) -> Self {
        Self::from_vec(vec![T::zeroed(); len])
    }

    /// Adopt `v` without copying.
    pub fn from_vec(v: Vec<T>) -> Self {
        let mut v = ManuallyDrop::new(v);
        let (len, cap) = (v.len(), v.capacity());
        let ptr = NonNull::new(v.as_mut_ptr()).unwrap_or_else(NonNull::dangling);
        Self {
            ptr,
            len,
            cap,
            _owns: PhantomData,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixed address of element 0.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Element `index`, if in range.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        // SAFETY: `index < len` and the allocation is live until drop.
        Some(unsafe { self.ptr.as_ptr().add(index).read() })
    }

    /// Overwrite element `index`. Returns `false` if out of range.
    pub fn set(&self, index: usize, value: T) -> bool {
        if index >= self.len {
            return false;
        }
        // SAFETY: `index < len`; no Rust reference to the elements exists.
        unsafe { self.ptr.as_ptr().add(index).write(value) };
        true
    }

    /// Copy of every element in storage order.
    pub fn to_vec(&self) -> Vec<T> {
        (0..self.len).filter_map(|i| self.get(i)).collect()
    }
}

impl<T: Element> Drop for PinnedBuffer<T> {
    fn drop(&mut self) {
        // SAFETY: `ptr`, `len` and `cap` came from a `Vec<T>` in `from_vec`
        // and were never changed.
        unsafe { drop(Vec::from_raw_parts(self.ptr.as_ptr(), self.len, self.cap)) };
    }
}

impl<T: Element> fmt::Debug for PinnedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

/// Initialise a header over the whole of `payload` as a continuous
/// `rows`×`cols` matrix.
pub(crate) fn bind_header<T: Element>(
    payload: &Rc<PinnedBuffer<T>>,
    rows: usize,
    cols: usize,
    depth: Depth,
) -> Result<Box<MatHeader>, KernelError> {
    if std::mem::size_of::<T>() != depth.size() {
        return Err(KernelError::InvalidArgument {
            detail: format!(
                "{}-byte {} elements cannot back a {depth} header",
                std::mem::size_of::<T>(),
                T::TYPE_NAME
            ),
        });
    }
    if rows.checked_mul(cols) != Some(payload.len()) {
        return Err(KernelError::InvalidArgument {
            detail: format!(
                "{rows}x{cols} matrix does not match a payload of {} elements",
                payload.len()
            ),
        });
    }
    let mut header = Box::new(MatHeader::empty());
    // SAFETY: the payload holds exactly `rows * cols` elements of
    // `depth.size()` bytes each and never moves. Every matrix that holds this header, or a view
    // derived from it, also holds an `Rc` to the payload.
    unsafe {
        header.init(
            rows,
            cols,
            depth,
            payload.as_ptr().cast_mut().cast(),
            cols * depth.size(),
        )?;
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adopts_without_copy() {
        let v = vec![1.0f32, 2.0, 3.0];
        let addr = v.as_ptr();
        let buf = PinnedBuffer::from_vec(v);
        assert_eq!(buf.as_ptr(), addr);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn get_and_set_bounds() {
        let buf = PinnedBuffer::<i16>::zeroed(2);
        assert!(buf.set(1, 9));
        assert!(!buf.set(2, 9));
        assert_eq!(buf.get(1), Some(9));
        assert_eq!(buf.get(2), None);
    }

    #[test]
    fn header_addresses_payload() {
        let payload = Rc::new(PinnedBuffer::<f64>::zeroed(6));
        let h = bind_header(&payload, 2, 3, Depth::F64).unwrap();
        assert_eq!(h.data(), payload.as_ptr().cast());
        assert_eq!(h.step(), 24);
        cvarr_kernel::set_real_2d(&h, 1, 0, 4.0).unwrap();
        assert_eq!(payload.get(3), Some(4.0));
    }

    #[test]
    fn header_shape_must_match_payload() {
        let payload = Rc::new(PinnedBuffer::<u8>::zeroed(4));
        assert!(bind_header(&payload, 3, 2, Depth::U8).is_err());
    }

    #[test]
    fn header_depth_must_match_element_size() {
        let payload = Rc::new(PinnedBuffer::<u8>::zeroed(16));
        assert!(matches!(
            bind_header(&payload, 4, 4, Depth::F64),
            Err(KernelError::InvalidArgument { .. })
        ));
        let wide = Rc::new(PinnedBuffer::<f32>::zeroed(4));
        assert!(bind_header(&wide, 2, 2, Depth::I16).is_err());
        assert!(bind_header(&wide, 2, 2, Depth::I32).is_ok());
    }
}
