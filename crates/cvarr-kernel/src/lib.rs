//! Numeric and geometry kernel for cvarr containers.
//!
//! The kernel never owns memory. Matrix routines take [`MatHeader`]s that
//! describe caller-owned payloads; geometry routines take point slices.
//! This crate and `cvarr` are the only ones that may contain `unsafe`
//! code, confined to [`MatHeader::init`], the view routines and the
//! private `raw` module.
//!
//! A valid header can only come from `init` or from a view routine, and all
//! of them are `unsafe fn`s whose contract keeps the payload alive. Every
//! safe routine rejects an uninitialised header.
//!
//! # Routines
//!
//! | Area | Functions |
//! |------|-----------|
//! | Element access | [`get_real_2d`], [`set_real_2d`] |
//! | Whole-matrix | [`copy`], [`transpose`], [`det`], [`sum`], [`min_max_loc`], [`count_non_zero`] |
//! | Arithmetic | [`add`], [`sub`], [`mul`], [`cmp`], [`add_s`], [`sub_s`], [`sub_rs`], [`convert_scale`], [`gemm`] |
//! | Views (`unsafe`) | [`get_sub_rect`], [`get_rows`], [`get_cols`], [`get_diag`] |
//! | Geometry | [`geometry`] module |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod error;
pub mod geometry;
pub mod header;
pub mod mat;
mod raw;
pub mod view;

pub use error::KernelError;
pub use header::MatHeader;
pub use mat::{
    add, add_s, cmp, convert_scale, copy, count_non_zero, det, gemm, get_real_2d, min_max_loc,
    mul, set_real_2d, sub, sub_rs, sub_s, sum, transpose, GemmFlags, MinMaxLoc,
};
pub use view::{get_cols, get_diag, get_rows, get_sub_rect};
