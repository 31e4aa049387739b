//! Generic matrices over a pinned payload and a fixed-layout header.
//!
//! A [`Matrix`] owns a boxed [`MatHeader`] and a reference-counted
//! [`PinnedBuffer`]. Views created by `get_*` get their own header but share
//! the payload, so the payload lives until the last matrix referring to it
//! is disposed.

use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::rc::Rc;

use tracing::{trace, warn};

use cvarr_core::{CmpOp, CvError, Depth, Element, Rect};
use cvarr_kernel::{self as kernel, GemmFlags, MatHeader, MinMaxLoc};

use crate::pin::{bind_header, PinnedBuffer};

/// Extreme values of a matrix and where they first occur.
pub type MinMax = MinMaxLoc;

fn depth_of<T: Element>() -> Result<Depth, CvError> {
    T::DEPTH.ok_or(CvError::UnsupportedElementType {
        type_name: T::TYPE_NAME,
    })
}

/// Indices past `i64::MAX` become `i64::MAX`, which every kernel bounds
/// check rejects.
fn index(i: usize) -> i64 {
    i64::try_from(i).unwrap_or(i64::MAX)
}

/// Region of a payload described by a view header.
#[derive(Clone, Copy)]
enum Region {
    Rect(Rect),
    Rows { start: i64, end: i64, delta: i64 },
    Cols { start: i64, end: i64 },
    Diag(i64),
}

/// A `rows`×`cols` matrix of `T`.
pub struct Matrix<T: Element> {
    header: Option<Box<MatHeader>>,
    payload: Option<Rc<PinnedBuffer<T>>>,
    view: bool,
}

impl<T: Element> Matrix<T> {
    fn assemble(rows: usize, cols: usize, buffer: PinnedBuffer<T>) -> Result<Self, CvError> {
        let depth = depth_of::<T>()?;
        let payload = Rc::new(buffer);
        let header = bind_header(&payload, rows, cols, depth)?;
        trace!(rows, cols, %depth, "matrix payload pinned");
        Ok(Self {
            header: Some(header),
            payload: Some(payload),
            view: false,
        })
    }

    /// A zero-filled matrix.
    pub fn new(rows: usize, cols: usize) -> Result<Self, CvError> {
        depth_of::<T>()?;
        let len = rows.checked_mul(cols).ok_or_else(|| CvError::InvalidArgument {
            detail: format!("{rows}x{cols} overflows"),
        })?;
        Self::assemble(rows, cols, PinnedBuffer::zeroed(len))
    }

    /// Adopt a row-major buffer of exactly `rows * cols` elements.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, CvError> {
        depth_of::<T>()?;
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(CvError::DimensionMismatch {
                op: "from_vec",
                left: (rows, cols),
                right: (data.len(), 1),
            });
        }
        Self::assemble(rows, cols, PinnedBuffer::from_vec(data))
    }

    /// Copy a rectangular 2D array.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self, CvError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(CvError::DimensionMismatch {
                    op: "from_rows",
                    left: (r, cols),
                    right: (r, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Self::from_vec(rows.len(), cols, data)
    }

    /// An N×1 column matrix.
    pub fn from_column(values: &[T]) -> Result<Self, CvError> {
        Self::from_vec(values.len(), 1, values.to_vec())
    }

    fn live(&self) -> Result<&MatHeader, CvError> {
        self.header
            .as_deref()
            .ok_or(CvError::UseAfterDispose { what: "matrix" })
    }

    fn shared_payload(&self) -> Result<&Rc<PinnedBuffer<T>>, CvError> {
        self.payload
            .as_ref()
            .ok_or(CvError::UseAfterDispose { what: "matrix" })
    }

    /// The native header, for handing to kernel routines.
    ///
    /// The header is borrowed from the matrix, so the matrix cannot be
    /// disposed while it is in use:
    ///
    /// ```compile_fail
    /// # use cvarr::Matrix;
    /// let mut m = Matrix::<f64>::new(2, 2).unwrap();
    /// let h = m.header().unwrap();
    /// m.dispose();
    /// let _ = cvarr::kernel::get_real_2d(h, 0, 0);
    /// ```
    pub fn header(&self) -> Result<&MatHeader, CvError> {
        self.live()
    }

    /// The pinned payload. For a view this is the whole shared buffer.
    pub fn data(&self) -> Result<&PinnedBuffer<T>, CvError> {
        self.shared_payload().map(Rc::as_ref)
    }

    /// Replace the payload with `data`, un-pinning the old one.
    ///
    /// A view that receives new data stops being a view.
    pub fn set_data(&mut self, rows: usize, cols: usize, data: Vec<T>) -> Result<(), CvError> {
        self.live()?;
        let fresh = Self::from_vec(rows, cols, data)?;
        self.release_payload();
        trace!(rows, cols, "matrix payload replaced");
        self.adopt(fresh);
        Ok(())
    }

    fn adopt(&mut self, mut other: Self) {
        self.header = other.header.take();
        self.payload = other.payload.take();
        self.view = other.view;
    }

    /// Number of rows; 0 once disposed.
    pub fn rows(&self) -> usize {
        self.header.as_ref().map_or(0, |h| h.rows())
    }

    /// Number of columns; 0 once disposed.
    pub fn cols(&self) -> usize {
        self.header.as_ref().map_or(0, |h| h.cols())
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Same as [`cols`](Self::cols).
    pub fn width(&self) -> usize {
        self.cols()
    }

    /// Same as [`rows`](Self::rows).
    pub fn height(&self) -> usize {
        self.rows()
    }

    /// Whether this matrix shares another matrix's payload.
    pub fn is_view(&self) -> bool {
        self.view
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.header.is_none()
    }

    /// Element `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Result<T, CvError> {
        let v = kernel::get_real_2d(self.live()?, index(row), index(col))?;
        Ok(T::from_f64(v))
    }

    /// Overwrite element `(row, col)`. Writes through views are visible in
    /// every matrix sharing the payload.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<(), CvError> {
        kernel::set_real_2d(self.live()?, index(row), index(col), value.to_f64())?;
        Ok(())
    }

    /// Every element in row-major order. Views yield only their own
    /// elements.
    pub fn to_vec(&self) -> Result<Vec<T>, CvError> {
        let h = self.live()?;
        let mut out = Vec::with_capacity(h.rows() * h.cols());
        for r in 0..h.rows() {
            for c in 0..h.cols() {
                out.push(T::from_f64(kernel::get_real_2d(h, index(r), index(c))?));
            }
        }
        Ok(out)
    }

    /// A zero matrix of the same shape.
    pub fn copy_blank(&self) -> Result<Self, CvError> {
        let h = self.live()?;
        Self::new(h.rows(), h.cols())
    }

    /// Deep copy with its own payload.
    pub fn try_clone(&self) -> Result<Self, CvError> {
        let out = self.copy_blank()?;
        kernel::copy(self.live()?, out.live()?)?;
        Ok(out)
    }

    /// Copy every element into `dst`, which may be a view.
    pub fn copy_to(&self, dst: &mut Matrix<T>) -> Result<(), CvError> {
        kernel::copy(self.live()?, dst.live()?)?;
        Ok(())
    }

    /// A new `cols`×`rows` matrix.
    pub fn transpose(&self) -> Result<Self, CvError> {
        let h = self.live()?;
        let out = Self::new(h.cols(), h.rows())?;
        kernel::transpose(h, out.live()?)?;
        Ok(out)
    }

    #[allow(unsafe_code)]
    fn derive_view(&self, region: Region) -> Result<Self, CvError> {
        let src = self.live()?;
        let payload = Rc::clone(self.shared_payload()?);
        let mut header = Box::new(MatHeader::empty());
        let dst = &mut *header;
        // SAFETY: the view keeps its own `Rc` to the payload, so the payload
        // outlives the derived header.
        unsafe {
            match region {
                Region::Rect(rect) => kernel::get_sub_rect(src, dst, rect),
                Region::Rows { start, end, delta } => kernel::get_rows(src, dst, start, end, delta),
                Region::Cols { start, end } => kernel::get_cols(src, dst, start, end),
                Region::Diag(k) => kernel::get_diag(src, dst, k),
            }
        }?;
        Ok(Self {
            header: Some(header),
            payload: Some(payload),
            view: true,
        })
    }

    /// View of the rectangle `rect`.
    pub fn get_sub_matrix(&self, rect: Rect) -> Result<Self, CvError> {
        self.derive_view(Region::Rect(rect))
    }

    /// View of row `row`.
    pub fn get_row(&self, row: usize) -> Result<Self, CvError> {
        let end = row.checked_add(1).ok_or(CvError::InvalidIndex {
            axis: "row",
            index: index(row),
            bound: self.rows(),
        })?;
        self.get_rows(row, end, 1)
    }

    /// View of every `delta`-th row in `start..end`.
    pub fn get_rows(&self, start: usize, end: usize, delta: usize) -> Result<Self, CvError> {
        self.derive_view(Region::Rows {
            start: index(start),
            end: index(end),
            delta: index(delta),
        })
    }

    /// View of column `col`.
    pub fn get_col(&self, col: usize) -> Result<Self, CvError> {
        let end = col.checked_add(1).ok_or(CvError::InvalidIndex {
            axis: "col",
            index: index(col),
            bound: self.cols(),
        })?;
        self.get_cols(col, end)
    }

    /// View of columns `start..end`.
    pub fn get_cols(&self, start: usize, end: usize) -> Result<Self, CvError> {
        self.derive_view(Region::Cols {
            start: index(start),
            end: index(end),
        })
    }

    /// Column view of diagonal `k`: 0 is the main diagonal, `k > 0` lies
    /// below it and `k < 0` above it.
    pub fn get_diag(&self, k: i64) -> Result<Self, CvError> {
        self.derive_view(Region::Diag(k))
    }

    fn check_span(axis: &'static str, start: usize, end: usize, bound: usize) -> Result<(), CvError> {
        if start >= end || end > bound {
            return Err(CvError::InvalidIndex {
                axis,
                index: index(if end > bound { end } else { start }),
                bound,
            });
        }
        Ok(())
    }

    /// Matrix without rows `start..end`. Removing a prefix or suffix yields
    /// a view; removing an interior span yields a concatenated copy.
    pub fn remove_rows(&self, start: usize, end: usize) -> Result<Self, CvError> {
        let rows = self.live()?.rows();
        Self::check_span("row", start, end, rows)?;
        if start == 0 {
            self.get_rows(end, rows, 1)
        } else if end == rows {
            self.get_rows(0, start, 1)
        } else {
            self.get_rows(0, start, 1)?
                .concat_vertical(&self.get_rows(end, rows, 1)?)
        }
    }

    /// Matrix without columns `start..end`; see
    /// [`remove_rows`](Self::remove_rows).
    pub fn remove_cols(&self, start: usize, end: usize) -> Result<Self, CvError> {
        let cols = self.live()?.cols();
        Self::check_span("col", start, end, cols)?;
        if start == 0 {
            self.get_cols(end, cols)
        } else if end == cols {
            self.get_cols(0, start)
        } else {
            self.get_cols(0, start)?
                .concat_horizontal(&self.get_cols(end, cols)?)
        }
    }

    /// `self` stacked on top of `other`.
    pub fn concat_vertical(&self, other: &Matrix<T>) -> Result<Self, CvError> {
        let (a, b) = (self.live()?, other.live()?);
        if a.cols() != b.cols() {
            return Err(CvError::DimensionMismatch {
                op: "concat_vertical",
                left: a.shape(),
                right: b.shape(),
            });
        }
        let out = Self::new(a.rows() + b.rows(), a.cols())?;
        kernel::copy(a, out.get_rows(0, a.rows(), 1)?.live()?)?;
        kernel::copy(b, out.get_rows(a.rows(), out.rows(), 1)?.live()?)?;
        Ok(out)
    }

    /// `self` followed by `other` to the right.
    pub fn concat_horizontal(&self, other: &Matrix<T>) -> Result<Self, CvError> {
        let (a, b) = (self.live()?, other.live()?);
        if a.rows() != b.rows() {
            return Err(CvError::DimensionMismatch {
                op: "concat_horizontal",
                left: a.shape(),
                right: b.shape(),
            });
        }
        let out = Self::new(a.rows(), a.cols() + b.cols())?;
        kernel::copy(a, out.get_cols(0, a.cols())?.live()?)?;
        kernel::copy(b, out.get_cols(a.cols(), out.cols())?.live()?)?;
        Ok(out)
    }

    /// Smallest and largest elements with their first locations.
    pub fn min_max(&self) -> Result<MinMax, CvError> {
        Ok(kernel::min_max_loc(self.live()?)?)
    }

    /// Determinant; the matrix must be square.
    pub fn det(&self) -> Result<f64, CvError> {
        Ok(kernel::det(self.live()?)?)
    }

    /// Sum of all elements.
    pub fn sum(&self) -> Result<f64, CvError> {
        Ok(kernel::sum(self.live()?)?)
    }

    fn elementwise(
        &self,
        other: &Matrix<T>,
        op: fn(&MatHeader, &MatHeader, &MatHeader) -> Result<(), kernel::KernelError>,
    ) -> Result<Self, CvError> {
        let out = self.copy_blank()?;
        op(self.live()?, other.live()?, out.live()?)?;
        Ok(out)
    }

    fn with_scalar(
        &self,
        scalar: f64,
        op: fn(&MatHeader, f64, &MatHeader) -> Result<(), kernel::KernelError>,
    ) -> Result<Self, CvError> {
        let out = self.copy_blank()?;
        op(self.live()?, scalar, out.live()?)?;
        Ok(out)
    }

    /// `self + other`, elementwise.
    pub fn add(&self, other: &Matrix<T>) -> Result<Self, CvError> {
        self.elementwise(other, kernel::add)
    }

    /// `self - other`, elementwise.
    pub fn sub(&self, other: &Matrix<T>) -> Result<Self, CvError> {
        self.elementwise(other, kernel::sub)
    }

    /// `self + scalar`.
    pub fn add_scalar(&self, scalar: f64) -> Result<Self, CvError> {
        self.with_scalar(scalar, kernel::add_s)
    }

    /// `self - scalar`.
    pub fn sub_scalar(&self, scalar: f64) -> Result<Self, CvError> {
        self.with_scalar(scalar, kernel::sub_s)
    }

    /// `scalar - self`.
    pub fn sub_r(&self, scalar: f64) -> Result<Self, CvError> {
        self.with_scalar(scalar, kernel::sub_rs)
    }

    /// `self * scalar`.
    pub fn mul_scalar(&self, scalar: f64) -> Result<Self, CvError> {
        let out = self.copy_blank()?;
        kernel::convert_scale(self.live()?, out.live()?, scalar, 0.0)?;
        Ok(out)
    }

    /// Matrix product; requires `self.cols == other.rows`.
    pub fn mul(&self, other: &Matrix<T>) -> Result<Self, CvError> {
        let (a, b) = (self.live()?, other.live()?);
        if a.cols() != b.rows() {
            return Err(CvError::DimensionMismatch {
                op: "mul",
                left: a.shape(),
                right: b.shape(),
            });
        }
        let out = Self::new(a.rows(), b.cols())?;
        kernel::gemm(a, b, 1.0, None, 0.0, out.live()?, GemmFlags::NONE)?;
        Ok(out)
    }

    /// Elementwise comparison mask: 255 where `op` holds, 0 elsewhere.
    pub fn cmp(&self, other: &Matrix<T>, op: CmpOp) -> Result<Matrix<u8>, CvError> {
        let a = self.live()?;
        let out = Matrix::<u8>::new(a.rows(), a.cols())?;
        kernel::cmp(a, other.live()?, out.live()?, op)?;
        Ok(out)
    }

    /// Exact equality: same shape and no differing element.
    pub fn equals(&self, other: &Matrix<T>) -> Result<bool, CvError> {
        if self.live()?.shape() != other.live()?.shape() {
            return Ok(false);
        }
        let mask = self.cmp(other, CmpOp::Ne)?;
        Ok(kernel::count_non_zero(mask.live()?)? == 0)
    }

    fn release_payload(&mut self) {
        if let Some(payload) = self.payload.take() {
            if !self.view && Rc::strong_count(&payload) > 1 {
                warn!(
                    views = Rc::strong_count(&payload) - 1,
                    "matrix released while views still share its payload"
                );
            }
            drop(payload);
            trace!("matrix payload unpinned");
        }
    }

    /// Un-pin the payload and free the header. Idempotent; every later
    /// operation fails with [`CvError::UseAfterDispose`].
    pub fn dispose(&mut self) {
        self.release_payload();
        if self.header.take().is_some() {
            trace!("matrix header released");
        }
    }
}

impl<T: Element> Drop for Matrix<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: Element> PartialEq for Matrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other).unwrap_or(false)
    }
}

impl<T: Element> fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Matrix");
        s.field("type", &T::TYPE_NAME)
            .field("rows", &self.rows())
            .field("cols", &self.cols())
            .field("view", &self.view);
        if self.is_disposed() {
            s.field("disposed", &true);
        }
        s.finish()
    }
}

impl<T: Element> Add for &Matrix<T> {
    type Output = Result<Matrix<T>, CvError>;
    fn add(self, rhs: Self) -> Self::Output {
        Matrix::add(self, rhs)
    }
}

impl<T: Element> Add<f64> for &Matrix<T> {
    type Output = Result<Matrix<T>, CvError>;
    fn add(self, rhs: f64) -> Self::Output {
        self.add_scalar(rhs)
    }
}

impl<T: Element> Add<&Matrix<T>> for f64 {
    type Output = Result<Matrix<T>, CvError>;
    fn add(self, rhs: &Matrix<T>) -> Self::Output {
        rhs.add_scalar(self)
    }
}

impl<T: Element> Sub for &Matrix<T> {
    type Output = Result<Matrix<T>, CvError>;
    fn sub(self, rhs: Self) -> Self::Output {
        Matrix::sub(self, rhs)
    }
}

impl<T: Element> Sub<f64> for &Matrix<T> {
    type Output = Result<Matrix<T>, CvError>;
    fn sub(self, rhs: f64) -> Self::Output {
        self.sub_scalar(rhs)
    }
}

impl<T: Element> Sub<&Matrix<T>> for f64 {
    type Output = Result<Matrix<T>, CvError>;
    fn sub(self, rhs: &Matrix<T>) -> Self::Output {
        rhs.sub_r(self)
    }
}

impl<T: Element> Mul for &Matrix<T> {
    type Output = Result<Matrix<T>, CvError>;
    fn mul(self, rhs: Self) -> Self::Output {
        Matrix::mul(self, rhs)
    }
}

impl<T: Element> Mul<f64> for &Matrix<T> {
    type Output = Result<Matrix<T>, CvError>;
    fn mul(self, rhs: f64) -> Self::Output {
        self.mul_scalar(rhs)
    }
}

impl<T: Element> Mul<&Matrix<T>> for f64 {
    type Output = Result<Matrix<T>, CvError>;
    fn mul(self, rhs: &Matrix<T>) -> Self::Output {
        rhs.mul_scalar(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> Matrix<f64> {
        Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap()
    }

    #[test]
    fn new_is_zeroed() {
        let m = Matrix::<i32>::new(3, 2).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.to_vec().unwrap(), vec![0; 6]);
        assert_eq!(m.width(), 2);
        assert_eq!(m.height(), 3);
    }

    #[test]
    fn unsupported_element_type() {
        assert_eq!(
            Matrix::<i64>::new(2, 2).unwrap_err(),
            CvError::UnsupportedElementType { type_name: "i64" }
        );
        assert!(Matrix::<u32>::from_vec(1, 1, vec![1]).is_err());
    }

    #[test]
    fn zero_dimension_rejected() {
        assert!(matches!(
            Matrix::<f32>::new(0, 3),
            Err(CvError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(matches!(
            Matrix::from_vec(2, 2, vec![1u8, 2, 3]),
            Err(CvError::DimensionMismatch { op: "from_vec", .. })
        ));
    }

    #[test]
    fn from_rows_rejects_ragged() {
        assert!(Matrix::from_rows(&[vec![1i16, 2], vec![3]]).is_err());
    }

    #[test]
    fn from_vec_pins_caller_buffer() {
        let v = vec![1.0f32; 4];
        let addr = v.as_ptr();
        let m = Matrix::from_vec(2, 2, v).unwrap();
        assert_eq!(m.data().unwrap().as_ptr(), addr);
        assert_eq!(m.header().unwrap().data(), addr.cast());
    }

    #[test]
    fn get_set_bounds() {
        let mut m = Matrix::<u8>::new(2, 2).unwrap();
        m.set(1, 1, 200).unwrap();
        assert_eq!(m.get(1, 1).unwrap(), 200);
        assert!(matches!(
            m.get(2, 0),
            Err(CvError::InvalidIndex { axis: "row", .. })
        ));
        assert!(matches!(
            m.set(0, 5, 1),
            Err(CvError::InvalidIndex { axis: "col", .. })
        ));
    }

    #[test]
    fn sum_transpose_det() {
        let m = two_by_two();
        assert_eq!(m.sum().unwrap(), 10.0);
        let t = m.transpose().unwrap();
        assert_eq!(t.get(0, 1).unwrap(), 3.0);
        assert!((m.det().unwrap() + 2.0).abs() < 1e-12);
        let rect = Matrix::<f64>::new(2, 3).unwrap();
        assert!(matches!(
            rect.det(),
            Err(CvError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn clone_is_deep() {
        let m = two_by_two();
        let mut c = m.try_clone().unwrap();
        assert_eq!(c, m);
        c.set(0, 0, 9.0).unwrap();
        assert_eq!(m.get(0, 0).unwrap(), 1.0);
        assert_ne!(c, m);
    }

    #[test]
    fn views_alias_payload() {
        let m = two_by_two();
        let mut row = m.get_row(1).unwrap();
        assert!(row.is_view());
        row.set(0, 1, 40.0).unwrap();
        assert_eq!(m.get(1, 1).unwrap(), 40.0);
        let col = m.get_col(0).unwrap();
        assert_eq!(col.to_vec().unwrap(), vec![1.0, 3.0]);
        let diag = m.get_diag(0).unwrap();
        assert_eq!(diag.to_vec().unwrap(), vec![1.0, 40.0]);
        assert_eq!(m.get_diag(1).unwrap().to_vec().unwrap(), vec![3.0]);
        assert_eq!(m.get_diag(-1).unwrap().to_vec().unwrap(), vec![2.0]);
    }

    #[test]
    fn view_outlives_disposed_source() {
        let mut m = two_by_two();
        let sub = m.get_sub_matrix(Rect::new(1, 0, 1, 2)).unwrap();
        m.dispose();
        assert_eq!(sub.to_vec().unwrap(), vec![2.0, 4.0]);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut m = two_by_two();
        m.dispose();
        m.dispose();
        assert!(m.is_disposed());
        assert_eq!(
            m.sum().unwrap_err(),
            CvError::UseAfterDispose { what: "matrix" }
        );
        assert!(m.get(0, 0).is_err());
        assert!(m.get_row(0).is_err());
        assert!(m.data().is_err());
        assert_eq!(m.shape(), (0, 0));
    }

    #[test]
    fn set_data_replaces_and_unviews() {
        let m = two_by_two();
        let mut row = m.get_row(0).unwrap();
        row.set_data(1, 3, vec![7.0, 8.0, 9.0]).unwrap();
        assert!(!row.is_view());
        assert_eq!(row.shape(), (1, 3));
        assert_eq!(m.get(0, 0).unwrap(), 1.0);
        assert!(row.set_data(2, 2, vec![1.0]).is_err());
        assert_eq!(row.shape(), (1, 3));
    }

    #[test]
    fn remove_rows_prefix_suffix_interior() {
        let m = Matrix::from_column(&[1i32, 2, 3, 4]).unwrap();
        let prefix = m.remove_rows(0, 1).unwrap();
        assert!(prefix.is_view());
        assert_eq!(prefix.to_vec().unwrap(), vec![2, 3, 4]);
        let suffix = m.remove_rows(3, 4).unwrap();
        assert!(suffix.is_view());
        assert_eq!(suffix.to_vec().unwrap(), vec![1, 2, 3]);
        let interior = m.remove_rows(1, 3).unwrap();
        assert!(!interior.is_view());
        assert_eq!(interior.to_vec().unwrap(), vec![1, 4]);
        assert!(matches!(
            m.remove_rows(2, 2),
            Err(CvError::InvalidIndex { .. })
        ));
        assert!(m.remove_rows(1, 5).is_err());
    }

    #[test]
    fn remove_cols_interior_copies() {
        let m = Matrix::from_rows(&[vec![1i32, 2, 3], vec![4, 5, 6]]).unwrap();
        let out = m.remove_cols(1, 2).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![1, 3, 4, 6]);
        assert!(m.remove_cols(0, 3).is_err());
    }

    #[test]
    fn concat_shapes() {
        let a = two_by_two();
        let v = a.concat_vertical(&a).unwrap();
        assert_eq!(v.shape(), (4, 2));
        assert_eq!(v.get(3, 1).unwrap(), 4.0);
        let h = a.concat_horizontal(&a).unwrap();
        assert_eq!(h.shape(), (2, 4));
        assert_eq!(h.get(1, 2).unwrap(), 3.0);
        let c = Matrix::<f64>::new(3, 3).unwrap();
        assert!(matches!(
            a.concat_vertical(&c),
            Err(CvError::DimensionMismatch { op: "concat_vertical", .. })
        ));
        assert!(matches!(
            a.concat_horizontal(&c),
            Err(CvError::DimensionMismatch { op: "concat_horizontal", .. })
        ));
    }

    #[test]
    fn arithmetic_and_operators() {
        let a = two_by_two();
        let sum = (&a + &a).unwrap();
        assert_eq!(sum.to_vec().unwrap(), vec![2.0, 4.0, 6.0, 8.0]);
        let diff = (&a - 1.0).unwrap();
        assert_eq!(diff.to_vec().unwrap(), vec![0.0, 1.0, 2.0, 3.0]);
        let rdiff = (10.0 - &a).unwrap();
        assert_eq!(rdiff.to_vec().unwrap(), vec![9.0, 8.0, 7.0, 6.0]);
        let scaled = (2.0 * &a).unwrap();
        assert_eq!(scaled, (&a + &a).unwrap());
        let prod = (&a * &a).unwrap();
        assert_eq!(prod.to_vec().unwrap(), vec![7.0, 10.0, 15.0, 22.0]);
        let shifted = (1.0 + &a).unwrap();
        assert_eq!(shifted.get(0, 0).unwrap(), 2.0);
    }

    #[test]
    fn mul_checks_inner_dimension() {
        let a = Matrix::<f32>::new(2, 3).unwrap();
        assert!(matches!(
            &a * &a,
            Err(CvError::DimensionMismatch { op: "mul", .. })
        ));
        let b = Matrix::<f32>::new(3, 4).unwrap();
        assert_eq!((&a * &b).unwrap().shape(), (2, 4));
    }

    #[test]
    fn cmp_and_equals() {
        let a = two_by_two();
        let b = Matrix::from_rows(&[vec![1.0, 0.0], vec![5.0, 4.0]]).unwrap();
        let mask = a.cmp(&b, CmpOp::Eq).unwrap();
        assert_eq!(mask.to_vec().unwrap(), vec![255, 0, 0, 255]);
        assert!(!a.equals(&b).unwrap());
        assert!(a.equals(&a).unwrap());
        let other_shape = Matrix::<f64>::new(1, 4).unwrap();
        assert!(!a.equals(&other_shape).unwrap());
    }

    #[test]
    fn min_max_locations() {
        let m = Matrix::from_rows(&[vec![5i16, -3, 7], vec![7, -3, 0]]).unwrap();
        let mm = m.min_max().unwrap();
        assert_eq!(mm.min_value, -3.0);
        assert_eq!(mm.max_value, 7.0);
        assert_eq!((mm.min_loc.x, mm.min_loc.y), (1, 0));
        assert_eq!((mm.max_loc.x, mm.max_loc.y), (2, 0));
    }

    #[test]
    fn copy_to_view() {
        let big = Matrix::<f64>::new(3, 3).unwrap();
        let mut corner = big.get_sub_matrix(Rect::new(1, 1, 2, 2)).unwrap();
        two_by_two().copy_to(&mut corner).unwrap();
        assert_eq!(big.sum().unwrap(), 10.0);
        assert_eq!(big.get(2, 2).unwrap(), 4.0);
    }

    #[test]
    fn huge_view_indices_are_errors() {
        let m = two_by_two();
        assert!(matches!(
            m.get_row(usize::MAX),
            Err(CvError::InvalidIndex { axis: "row", .. })
        ));
        assert!(matches!(
            m.get_col(usize::MAX),
            Err(CvError::InvalidIndex { axis: "col", .. })
        ));
        assert!(m.get_rows(usize::MAX - 1, usize::MAX, 1).is_err());
        assert!(m.get_cols(0, usize::MAX).is_err());
        assert!(m.get_diag(i64::MIN).is_err());
        assert!(m.get(usize::MAX, 0).is_err());
    }

    #[test]
    fn huge_row_step_keeps_only_the_first_row() {
        let m = two_by_two();
        let first = m.get_rows(0, 1, usize::MAX).unwrap();
        assert_eq!(first.to_vec().unwrap(), vec![1.0, 2.0]);
        let first = m.get_rows(0, 2, usize::MAX).unwrap();
        assert_eq!(first.to_vec().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn views_keep_the_payload_after_parent_replaces_it() {
        let mut m = two_by_two();
        let mut row = m.get_row(1).unwrap();
        m.set_data(1, 1, vec![9000.0]).unwrap();
        assert_eq!(row.to_vec().unwrap(), vec![3.0, 4.0]);
        row.set(0, 1, 40.0).unwrap();
        assert_eq!(row.get(0, 1).unwrap(), 40.0);
        assert_eq!(m.to_vec().unwrap(), vec![9000.0]);
        m.dispose();
        assert_eq!(row.sum().unwrap(), 43.0);
    }
}
