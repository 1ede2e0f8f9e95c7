//! Low-level building blocks for custom spectral pipelines.
//!
//! These expose the interpolation primitives behind [`crate::refine_peak`].
//! Most users should prefer [`crate::ReferenceAnalyzer`] or the functions in
//! [`crate::extract`].

pub use crate::refine::complex::interpolate_complex;
pub use crate::refine::quad1d::parabolic_peak_offset;
pub use crate::spectrum::fft_frequencies;
