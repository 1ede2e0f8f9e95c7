//! Sub-bin refinement of spectral peaks.
//!
//! The offset of the peak is estimated from a parabola through the three bin
//! magnitudes around the target. The complex bin values are then interpolated
//! at that offset, which yields a magnitude and a phase that are consistent
//! with each other at the fractional bin position.
//!
//! Refinement is skipped (and the centre bin returned unchanged) when the
//! target sits on the spectrum boundary, is not a local maximum, has a flat
//! top, or produces an offset outside `[-1, 1]`. The reason is kept on the
//! returned [`PeakEstimate`].

pub(crate) mod complex;
pub(crate) mod quad1d;

use crate::trace::trace_warn;
use crate::util::{RefWaveError, RefWaveResult};
use complex::interpolate_complex;
use quad1d::parabolic_peak_offset;
use rustfft::num_complex::Complex64;
use std::fmt;

/// Reason a peak was returned without sub-bin refinement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeakFallback {
    /// The bin has no left or right neighbour.
    Boundary,
    /// The bin magnitude is below one of its neighbours.
    NotLocalMaximum,
    /// The parabola denominator is numerically zero.
    FlatTop,
    /// The vertex offset fell outside `[-1, 1]`.
    OffsetOutOfRange,
}

impl PeakFallback {
    /// Short machine-friendly name.
    pub fn as_str(self) -> &'static str {
        match self {
            PeakFallback::Boundary => "boundary",
            PeakFallback::NotLocalMaximum => "not_local_maximum",
            PeakFallback::FlatTop => "flat_top",
            PeakFallback::OffsetOutOfRange => "offset_out_of_range",
        }
    }
}

impl fmt::Display for PeakFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-bin estimate of a spectral peak.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakEstimate {
    /// Fractional bin index.
    pub position: f64,
    /// Magnitude of the interpolated complex value.
    pub magnitude: f64,
    /// Phase of the interpolated complex value in (-pi, pi].
    pub phase: f64,
    /// Set when refinement was skipped.
    pub fallback: Option<PeakFallback>,
}

impl PeakEstimate {
    fn unrefined(index: usize, value: Complex64, reason: PeakFallback) -> Self {
        trace_warn!("peak_fallback", index = index, reason = reason.as_str());
        Self {
            position: index as f64,
            magnitude: value.norm(),
            phase: value.arg(),
            fallback: Some(reason),
        }
    }

    /// Returns true when sub-bin interpolation was applied.
    pub fn is_refined(&self) -> bool {
        self.fallback.is_none()
    }

    /// Returns the estimate, or [`RefWaveError::DegeneratePeak`] if refinement
    /// was skipped.
    pub fn require_refined(self) -> RefWaveResult<Self> {
        match self.fallback {
            None => Ok(self),
            Some(reason) => Err(RefWaveError::DegeneratePeak(reason)),
        }
    }
}

/// Refines the peak at `index` of `bins` by complex quadratic interpolation.
///
/// # Panics
///
/// Panics if `index` is out of bounds for `bins`.
pub fn refine_peak(bins: &[Complex64], index: usize) -> PeakEstimate {
    let x0 = bins[index];
    if index == 0 || index + 1 >= bins.len() {
        return PeakEstimate::unrefined(index, x0, PeakFallback::Boundary);
    }

    let xm = bins[index - 1];
    let xp = bins[index + 1];
    let offset = match parabolic_peak_offset(xm.norm(), x0.norm(), xp.norm()) {
        Ok(offset) => offset,
        Err(reason) => return PeakEstimate::unrefined(index, x0, reason),
    };

    let value = interpolate_complex(xm, x0, xp, offset);
    PeakEstimate {
        position: index as f64 + offset,
        magnitude: value.re.hypot(value.im),
        phase: value.im.atan2(value.re),
        fallback: None,
    }
}

#[cfg(test)]
mod tests {
    use super::{refine_peak, PeakFallback};
    use crate::util::RefWaveError;
    use rustfft::num_complex::Complex64;

    fn real_bins(mags: &[f64]) -> Vec<Complex64> {
        mags.iter().map(|&m| Complex64::new(m, 0.0)).collect()
    }

    #[test]
    fn boundary_bins_are_unrefined() {
        let bins = real_bins(&[5.0, 1.0, 0.5, 3.0]);
        let first = refine_peak(&bins, 0);
        assert_eq!(first.position, 0.0);
        assert_eq!(first.magnitude, 5.0);
        assert_eq!(first.fallback, Some(PeakFallback::Boundary));

        let last = refine_peak(&bins, 3);
        assert_eq!(last.position, 3.0);
        assert_eq!(last.fallback, Some(PeakFallback::Boundary));
        assert_eq!(
            last.require_refined(),
            Err(RefWaveError::DegeneratePeak(PeakFallback::Boundary))
        );
    }

    #[test]
    fn non_peak_is_unrefined() {
        let bins = real_bins(&[1.0, 2.0, 3.0, 1.0]);
        let est = refine_peak(&bins, 1);
        assert_eq!(est.position, 1.0);
        assert_eq!(est.magnitude, 2.0);
        assert_eq!(est.fallback, Some(PeakFallback::NotLocalMaximum));
    }

    #[test]
    fn flat_top_is_unrefined() {
        let bins = real_bins(&[0.0, 2.0, 2.0, 2.0, 0.0]);
        let est = refine_peak(&bins, 2);
        assert_eq!(est.fallback, Some(PeakFallback::FlatTop));
        assert_eq!(est.position, 2.0);
    }

    #[test]
    fn complex_phase_follows_rotated_bins() {
        let rot = Complex64::from_polar(1.0, 0.8);
        let bins: Vec<Complex64> = [0.2, 0.9, 1.0, 0.6, 0.1]
            .iter()
            .map(|&m| rot * m)
            .collect();
        let est = refine_peak(&bins, 2);
        assert!(est.is_refined());
        assert!((est.position - 1.7).abs() < 1e-12);
        assert!((est.phase - 0.8).abs() < 1e-12);
        assert!(est.magnitude >= 1.0);
    }
}
