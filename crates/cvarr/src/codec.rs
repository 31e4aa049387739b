//! Binary encode/decode for matrices.
//!
//! ```text
//! [MAGIC "CVMT"] [VERSION u8] [DEPTH u8] [ROWS u32] [COLS u32] [PAYLOAD]
//! ```
//!
//! Integers are little-endian. The payload is `rows * cols` raw elements in
//! row-major order, with no padding between rows.

use std::error::Error;
use std::fmt;
use std::io::{self, Read, Write};

use cvarr_core::{CvError, Depth, Element};

use crate::matrix::Matrix;

/// Magic bytes at the start of every encoded matrix.
pub const MAGIC: [u8; 4] = *b"CVMT";

/// Current encoding version.
pub const FORMAT_VERSION: u8 = 1;

/// Errors from [`encode_matrix`] and [`decode_matrix`].
#[derive(Debug)]
pub enum CodecError {
    /// Reading or writing failed.
    Io(io::Error),
    /// The input does not start with `b"CVMT"`.
    InvalidMagic,
    /// The encoding version is not supported.
    UnsupportedVersion {
        /// Version found in the input.
        found: u8,
    },
    /// The encoded depth does not match the requested element type.
    DepthMismatch {
        /// Depth of the requested element type.
        expected: Depth,
        /// Depth code found in the input.
        found: u8,
    },
    /// Truncated or inconsistent input.
    Malformed {
        /// Human-readable description.
        detail: String,
    },
    /// Building or reading the matrix failed.
    Cv(CvError),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"CVMT\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::DepthMismatch { expected, found } => {
                write!(f, "depth mismatch: expected {expected}, found code {found}")
            }
            Self::Malformed { detail } => write!(f, "malformed matrix: {detail}"),
            Self::Cv(e) => write!(f, "{e}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Cv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<CvError> for CodecError {
    fn from(e: CvError) -> Self {
        Self::Cv(e)
    }
}

fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn read_u8(r: &mut dyn Read) -> Result<u8, CodecError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32_le(r: &mut dyn Read) -> Result<u32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn dimension(v: usize) -> Result<u32, CodecError> {
    u32::try_from(v).map_err(|_| CodecError::Malformed {
        detail: format!("dimension {v} does not fit in u32"),
    })
}

/// Encode `m`. A view encodes only its own elements.
pub fn encode_matrix<T: Element>(w: &mut dyn Write, m: &Matrix<T>) -> Result<(), CodecError> {
    let h = m.header()?;
    let depth = h.depth().ok_or(CodecError::Malformed {
        detail: "header has no depth".into(),
    })?;
    let values = m.to_vec()?;
    w.write_all(&MAGIC)?;
    w.write_all(&[FORMAT_VERSION, depth as u8])?;
    write_u32_le(w, dimension(h.rows())?)?;
    write_u32_le(w, dimension(h.cols())?)?;
    w.write_all(bytemuck::cast_slice(values.as_slice()))?;
    Ok(())
}

/// Decode a matrix of `T`. The encoded depth must be `T`'s depth.
pub fn decode_matrix<T: Element>(r: &mut dyn Read) -> Result<Matrix<T>, CodecError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(CodecError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion { found: version });
    }
    let expected = T::DEPTH.ok_or(CvError::UnsupportedElementType {
        type_name: T::TYPE_NAME,
    })?;
    let found = read_u8(r)?;
    if i32::from(found) != expected as i32 {
        return Err(CodecError::DepthMismatch { expected, found });
    }
    let rows = read_u32_le(r)? as usize;
    let cols = read_u32_le(r)? as usize;
    let size = std::mem::size_of::<T>();
    let len = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(size))
        .ok_or_else(|| CodecError::Malformed {
            detail: format!("{rows}x{cols} payload overflows"),
        })?;

    let mut bytes = Vec::new();
    r.take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(CodecError::Malformed {
            detail: format!("truncated payload: got {} of {len} bytes", bytes.len()),
        });
    }
    let values: Vec<T> = bytes
        .chunks_exact(size)
        .map(bytemuck::pod_read_unaligned)
        .collect();
    Ok(Matrix::from_vec(rows, cols, values)?)
}
