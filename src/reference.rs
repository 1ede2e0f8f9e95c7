//! Reference oscillator parameters.

use std::f64::consts::TAU;

/// Frequency, amplitude and phase of a reference sinusoid
/// `y(t) = amplitude * sin(2 * pi * frequency * t - phase_offset)`.
///
/// `frequency` is in Hz and `phase_offset` in radians, referenced to `t = 0`.
/// The same shape is used for the spectral initial guess and for the
/// least-squares result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceParameters {
    /// Oscillation frequency in Hz.
    pub frequency: f64,
    /// Peak amplitude in the units of the sampled values.
    pub amplitude: f64,
    /// Phase subtracted from the sine argument, in radians.
    pub phase_offset: f64,
}

impl ReferenceParameters {
    /// Returns the angular frequency in rad/s.
    pub fn angular_frequency(&self) -> f64 {
        TAU * self.frequency
    }

    /// Evaluates the sinusoid at time `t`.
    pub fn evaluate(&self, t: f64) -> f64 {
        self.amplitude * (TAU * self.frequency * t - self.phase_offset).sin()
    }

    /// Samples the sinusoid on a time axis.
    pub fn sample(&self, time: &[f64]) -> Vec<f64> {
        time.iter().map(|&t| self.evaluate(t)).collect()
    }
}
