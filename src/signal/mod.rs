//! Sampled waveforms on a uniform time axis.
//!
//! `Waveform` is a borrowed view over caller-owned time and value slices. It
//! validates once on construction that both sequences have the same length,
//! that there are enough samples to interpolate a spectral peak, and that the
//! time axis advances by a constant positive interval. The interval is taken
//! from the first two time samples.

use crate::util::{RefWaveError, RefWaveResult};

/// Minimum number of samples accepted by [`Waveform`].
pub const MIN_SAMPLES: usize = 3;

/// Relative tolerance on each sampling interval against the first one.
const UNIFORM_RTOL: f64 = 1e-6;

/// Borrowed, validated view of a uniformly sampled waveform.
#[derive(Copy, Clone, Debug)]
pub struct Waveform<'a> {
    time: &'a [f64],
    values: &'a [f64],
    dt: f64,
}

impl<'a> Waveform<'a> {
    /// Creates a view from matching time and value slices.
    pub fn new(time: &'a [f64], values: &'a [f64]) -> RefWaveResult<Self> {
        if time.len() != values.len() {
            return Err(RefWaveError::LengthMismatch {
                time: time.len(),
                values: values.len(),
            });
        }
        if time.len() < MIN_SAMPLES {
            return Err(RefWaveError::TooShort {
                needed: MIN_SAMPLES,
                got: time.len(),
            });
        }
        if !time.iter().chain(values.iter()).all(|v| v.is_finite()) {
            return Err(RefWaveError::InvalidInput("waveform contains non-finite samples"));
        }

        let dt = time[1] - time[0];
        if dt <= 0.0 {
            return Err(RefWaveError::NonUniformSampling {
                index: 1,
                expected: dt,
                got: dt,
            });
        }

        let tol = UNIFORM_RTOL * dt;
        for (idx, pair) in time.windows(2).enumerate().skip(1) {
            let step = pair[1] - pair[0];
            if (step - dt).abs() > tol {
                return Err(RefWaveError::NonUniformSampling {
                    index: idx + 1,
                    expected: dt,
                    got: step,
                });
            }
        }

        Ok(Self { time, values, dt })
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; construction rejects short waveforms.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the sampling interval in seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Returns the sampling rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        1.0 / self.dt
    }

    /// Returns the time of the first sample.
    pub fn t0(&self) -> f64 {
        self.time[0]
    }

    /// Returns the time samples.
    pub fn time(&self) -> &'a [f64] {
        self.time
    }

    /// Returns the value samples.
    pub fn values(&self) -> &'a [f64] {
        self.values
    }
}

/// Owned waveform buffers, typically built from a timebase.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedWaveform {
    time: Vec<f64>,
    values: Vec<f64>,
}

impl OwnedWaveform {
    /// Creates an owned waveform after validating it like [`Waveform::new`].
    pub fn new(time: Vec<f64>, values: Vec<f64>) -> RefWaveResult<Self> {
        Waveform::new(&time, &values)?;
        Ok(Self { time, values })
    }

    /// Builds a waveform sampled at `t0 + i * dt`.
    pub fn from_timebase(t0: f64, dt: f64, values: Vec<f64>) -> RefWaveResult<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(RefWaveError::InvalidInput("sampling interval must be positive"));
        }
        let time = time_axis(t0, dt, values.len());
        Self::new(time, values)
    }

    /// Returns a borrowed view of the buffers.
    pub fn view(&self) -> Waveform<'_> {
        Waveform {
            time: &self.time,
            values: &self.values,
            dt: self.time[1] - self.time[0],
        }
    }

    /// Consumes the waveform and returns `(time, values)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.time, self.values)
    }
}

/// Builds the uniform time axis `t0 + i * dt` for `i in 0..n`.
pub fn time_axis(t0: f64, dt: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| t0 + i as f64 * dt).collect()
}
