//! Parabolic vertex estimate from three magnitude samples.

use crate::refine::PeakFallback;

/// Interpolation denominators below this magnitude are treated as flat tops.
pub(crate) const FLAT_TOP_EPS: f64 = 1e-12;

/// Estimates the sub-bin vertex offset of the parabola through
/// `(-1, ym)`, `(0, y0)`, `(+1, yp)`.
///
/// The centre sample must be a local maximum (`y0 >= ym` and `y0 >= yp`).
/// On success the offset lies in `[-1, 1]`; otherwise the reason the
/// refinement has to be skipped is returned.
pub fn parabolic_peak_offset(ym: f64, y0: f64, yp: f64) -> Result<f64, PeakFallback> {
    if !(y0 >= ym && y0 >= yp) {
        return Err(PeakFallback::NotLocalMaximum);
    }

    let denom = ym - 2.0 * y0 + yp;
    if denom.abs() < FLAT_TOP_EPS {
        return Err(PeakFallback::FlatTop);
    }

    let offset = 0.5 * (ym - yp) / denom;
    // The local-maximum check bounds |offset| by 0.5, so the error arm never fires.
    if offset.is_finite() && offset.abs() <= 1.0 {
        Ok(offset)
    } else {
        Err(PeakFallback::OffsetOutOfRange)
    }
}
