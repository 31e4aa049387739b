//! Matrix element types and their foreign depth codes.
//!
//! Every matrix payload is a contiguous array of one [`Element`] type. The
//! element's [`Depth`] is written into the matrix header so that kernel
//! routines can interpret the raw payload bytes.

use std::fmt;

use bytemuck::Pod;

/// Foreign depth code of a matrix element.
///
/// Values are ABI-stable and occupy the low bits of a header type tag.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Depth {
    /// Unsigned 8-bit integer.
    U8 = 0,
    /// Signed 8-bit integer.
    I8 = 1,
    /// Unsigned 16-bit integer.
    U16 = 2,
    /// Signed 16-bit integer.
    I16 = 3,
    /// Signed 32-bit integer.
    I32 = 4,
    /// 32-bit float.
    F32 = 5,
    /// 64-bit float.
    F64 = 6,
}

impl Depth {
    /// Mask selecting the depth bits of a type tag.
    pub const MASK: i32 = 0x7;

    /// Decode a depth from the low bits of a type tag.
    pub fn from_code(code: i32) -> Option<Self> {
        match code & Self::MASK {
            0 => Some(Self::U8),
            1 => Some(Self::I8),
            2 => Some(Self::U16),
            3 => Some(Self::I16),
            4 => Some(Self::I32),
            5 => Some(Self::F32),
            6 => Some(Self::F64),
            _ => None,
        }
    }

    /// Size of one element of this depth in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Whether values of this depth are floating point.
    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Convert `v` to the nearest representable value of this depth.
    ///
    /// Integer depths round half to even and clamp to their range; float
    /// depths pass through (`F32` is narrowed).
    pub fn saturate(self, v: f64) -> f64 {
        let clamp = |lo: f64, hi: f64| {
            if v.is_nan() {
                0.0
            } else {
                v.round_ties_even().clamp(lo, hi)
            }
        };
        match self {
            Self::U8 => clamp(u8::MIN as f64, u8::MAX as f64),
            Self::I8 => clamp(i8::MIN as f64, i8::MAX as f64),
            Self::U16 => clamp(u16::MIN as f64, u16::MAX as f64),
            Self::I16 => clamp(i16::MIN as f64, i16::MAX as f64),
            Self::I32 => clamp(i32::MIN as f64, i32::MAX as f64),
            Self::F32 => v as f32 as f64,
            Self::F64 => v,
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U8 => "8U",
            Self::I8 => "8S",
            Self::U16 => "16U",
            Self::I16 => "16S",
            Self::I32 => "32S",
            Self::F32 => "32F",
            Self::F64 => "64F",
        };
        f.write_str(name)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A scalar type that can live in a matrix payload.
///
/// Types with `DEPTH == None` are representable in memory but have no
/// foreign depth code; constructing a matrix of them fails with
/// [`CvError::UnsupportedElementType`](crate::CvError::UnsupportedElementType).
///
/// The trait is sealed. Headers address elements by `DEPTH`, so every
/// implementor with a depth has exactly `DEPTH.size()` bytes; outside types
/// cannot opt in:
///
/// ```compile_fail
/// use cvarr_core::{Depth, Element};
///
/// #[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, bytemuck::Pod, bytemuck::Zeroable)]
/// #[repr(transparent)]
/// struct Tiny(u8);
///
/// impl Element for Tiny {
///     const DEPTH: Option<Depth> = Some(Depth::F64);
///     const TYPE_NAME: &'static str = "Tiny";
///     fn to_f64(self) -> f64 { self.0 as f64 }
///     fn from_f64(v: f64) -> Self { Tiny(v as u8) }
/// }
/// ```
pub trait Element: sealed::Sealed + Pod + Default + PartialOrd + fmt::Debug {
    /// Foreign depth code, if the kernel supports this type.
    const DEPTH: Option<Depth>;

    /// Rust type name used in error messages.
    const TYPE_NAME: &'static str;

    /// Widen to `f64`.
    fn to_f64(self) -> f64;

    /// Narrow from `f64`, saturating integer types.
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_element {
    ($t:ty, $depth:expr) => {
        impl sealed::Sealed for $t {}

        impl Element for $t {
            const DEPTH: Option<Depth> = $depth;
            const TYPE_NAME: &'static str = stringify!($t);

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                match Self::DEPTH {
                    Some(d) => d.saturate(v) as $t,
                    None => v as $t,
                }
            }
        }
    };
}

impl_element!(u8, Some(Depth::U8));
impl_element!(i8, Some(Depth::I8));
impl_element!(u16, Some(Depth::U16));
impl_element!(i16, Some(Depth::I16));
impl_element!(i32, Some(Depth::I32));
impl_element!(f32, Some(Depth::F32));
impl_element!(f64, Some(Depth::F64));
impl_element!(u32, None);
impl_element!(i64, None);
impl_element!(u64, None);
