//! Error types for refwave.

use crate::refine::PeakFallback;
use thiserror::Error;

/// Result alias for refwave operations.
pub type RefWaveResult<T> = std::result::Result<T, RefWaveError>;

/// Errors that can occur when analysing a reference waveform.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RefWaveError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Time and value sequences have different lengths.
    #[error("length mismatch: {time} time samples, {values} values")]
    LengthMismatch { time: usize, values: usize },
    /// Too few samples for the requested analysis.
    #[error("waveform too short: need at least {needed} samples, got {got}")]
    TooShort { needed: usize, got: usize },
    /// The time axis is not strictly increasing with a constant interval.
    #[error("non-uniform sampling at sample {index}: expected interval {expected:e}, got {got:e}")]
    NonUniformSampling {
        index: usize,
        expected: f64,
        got: f64,
    },
    /// Pad factors must be at least 1.
    #[error("invalid pad factor: {0}")]
    InvalidPadFactor(usize),
    /// Sub-bin refinement was skipped and the caller asked for a refined peak.
    #[error("degenerate peak: {0}")]
    DegeneratePeak(PeakFallback),
    /// The least-squares solver stopped without meeting its tolerances.
    #[error("fit did not converge after {iterations} iterations: {reason}")]
    FitDidNotConverge {
        iterations: usize,
        reason: &'static str,
    },
}
