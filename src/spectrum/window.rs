//! Symmetric Hann analysis window.

use std::f64::consts::TAU;

/// Hann window coefficients with their cached sum.
///
/// The window is symmetric: `w[n] = 0.5 - 0.5 * cos(2 * pi * n / (N - 1))`,
/// so both end samples are zero. A single-sample window is `[1.0]`.
#[derive(Clone, Debug, PartialEq)]
pub struct HannWindow {
    coeffs: Vec<f64>,
    sum: f64,
}

impl HannWindow {
    /// Builds a window of length `len`.
    pub fn new(len: usize) -> Self {
        let coeffs: Vec<f64> = match len {
            0 => Vec::new(),
            1 => vec![1.0],
            _ => {
                let denom = (len - 1) as f64;
                (0..len)
                    .map(|n| 0.5 - 0.5 * (TAU * n as f64 / denom).cos())
                    .collect()
            }
        };
        let sum = coeffs.iter().sum();
        Self { coeffs, sum }
    }

    /// Returns the window length.
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// Returns true for a zero-length window.
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Returns the coefficients.
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Returns the sum of all coefficients (coherent gain times length).
    pub fn sum(&self) -> f64 {
        self.sum
    }
}

#[cfg(test)]
mod tests {
    use super::HannWindow;

    #[test]
    fn hann_is_symmetric_with_zero_ends() {
        let w = HannWindow::new(9);
        let c = w.coeffs();
        assert_eq!(c[0], 0.0);
        assert!(c[8].abs() < 1e-15);
        assert!((c[4] - 1.0).abs() < 1e-15);
        for i in 0..9 {
            assert!((c[i] - c[8 - i]).abs() < 1e-15);
        }
    }

    #[test]
    fn hann_sum_is_half_of_len_minus_one() {
        let w = HannWindow::new(1001);
        assert!((w.sum() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn hann_three_points() {
        let w = HannWindow::new(3);
        assert!((w.coeffs()[1] - 1.0).abs() < 1e-15);
        assert!((w.sum() - 1.0).abs() < 1e-15);
    }
}
