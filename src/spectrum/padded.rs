//! Windowed, zero-padded spectrum of a waveform.

use crate::signal::{Waveform, MIN_SAMPLES};
use crate::spectrum::window::HannWindow;
use crate::trace::{trace_event, trace_span};
use crate::util::{RefWaveError, RefWaveResult};
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::TAU;

/// Frequency-domain representation of a Hann-windowed, zero-padded waveform.
///
/// Bins follow the standard FFT ordering: non-negative frequencies first, then
/// negative frequencies. The value is immutable once computed.
#[derive(Clone, Debug)]
pub struct PaddedSpectrum {
    bins: Vec<Complex64>,
    freqs: Vec<f64>,
    window: HannWindow,
    dt: f64,
    pad_factor: usize,
}

impl PaddedSpectrum {
    /// Windows `waveform`, pads it to `len * pad_factor` samples and transforms it.
    pub fn compute(waveform: &Waveform<'_>, pad_factor: usize) -> RefWaveResult<Self> {
        Self::from_samples(waveform.values(), waveform.dt(), pad_factor)
    }

    /// Same as [`PaddedSpectrum::compute`] for a bare value slice and interval.
    pub fn from_samples(values: &[f64], dt: f64, pad_factor: usize) -> RefWaveResult<Self> {
        if values.len() < MIN_SAMPLES {
            return Err(RefWaveError::TooShort {
                needed: MIN_SAMPLES,
                got: values.len(),
            });
        }
        if !values.iter().all(|v| v.is_finite()) {
            return Err(RefWaveError::InvalidInput("waveform contains non-finite samples"));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(RefWaveError::InvalidInput("sampling interval must be positive"));
        }
        if pad_factor == 0 {
            return Err(RefWaveError::InvalidPadFactor(pad_factor));
        }
        let n = values.len();
        let n_pad = n
            .checked_mul(pad_factor)
            .ok_or(RefWaveError::InvalidPadFactor(pad_factor))?;

        let _span = trace_span!("windowed_spectrum", samples = n, padded = n_pad).entered();

        let window = HannWindow::new(n);
        let mut bins: Vec<Complex64> = values
            .iter()
            .zip(window.coeffs())
            .map(|(&y, &w)| Complex64::new(y * w, 0.0))
            .collect();
        bins.resize(n_pad, Complex64::new(0.0, 0.0));

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n_pad);
        fft.process(&mut bins);

        let freqs = fft_frequencies(n_pad, dt);
        trace_event!("spectrum_ready", bins = n_pad, spacing_hz = freqs.get(1).copied().unwrap_or(0.0));

        Ok(Self {
            bins,
            freqs,
            window,
            dt,
            pad_factor,
        })
    }

    /// Returns the complex bins in FFT order.
    pub fn bins(&self) -> &[Complex64] {
        &self.bins
    }

    /// Returns the bin centre frequencies in Hz, in FFT order.
    pub fn frequencies(&self) -> &[f64] {
        &self.freqs
    }

    /// Returns the number of bins (`N * P`).
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Always false; construction rejects empty input.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Returns the analysis window.
    pub fn window(&self) -> &HannWindow {
        &self.window
    }

    /// Returns the sum of the window coefficients used for normalisation.
    pub fn window_sum(&self) -> f64 {
        self.window.sum()
    }

    /// Returns the number of unpadded samples.
    pub fn samples(&self) -> usize {
        self.window.len()
    }

    /// Returns the pad factor.
    pub fn pad_factor(&self) -> usize {
        self.pad_factor
    }

    /// Returns the sampling interval of the source waveform.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Returns the spacing between adjacent bins, `1 / (N * P * dt)`, in Hz.
    pub fn bin_spacing(&self) -> f64 {
        1.0 / (self.bins.len() as f64 * self.dt)
    }

    /// Returns the index whose centre frequency is closest to `freq_hz`.
    ///
    /// Ties resolve to the lowest index.
    pub fn nearest_bin(&self, freq_hz: f64) -> usize {
        let mut best = 0usize;
        let mut best_dist = f64::INFINITY;
        for (idx, &f) in self.freqs.iter().enumerate() {
            let dist = (f - freq_hz).abs();
            if dist < best_dist {
                best = idx;
                best_dist = dist;
            }
        }
        best
    }

    /// Returns the non-negative-frequency half scaled to one-sided amplitude.
    pub fn one_sided(&self) -> OneSidedSpectrum {
        let n_pad = self.bins.len();
        let count = n_pad / 2 + 1;
        let scale = 2.0 / self.window.sum();
        let spacing = self.bin_spacing();
        let frequencies = (0..count).map(|k| k as f64 * spacing).collect();
        let amplitudes = self.bins[..count].iter().map(|c| c.norm() * scale).collect();
        OneSidedSpectrum {
            frequencies,
            amplitudes,
        }
    }
}

/// One-sided amplitude spectrum: bins `0..=N_pad/2`, amplitude `2|Y| / sum(w)`.
#[derive(Clone, Debug, PartialEq)]
pub struct OneSidedSpectrum {
    frequencies: Vec<f64>,
    amplitudes: Vec<f64>,
}

impl OneSidedSpectrum {
    /// Returns bin frequencies in Hz.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Returns bin frequencies in rad/s.
    pub fn angular_frequencies(&self) -> Vec<f64> {
        self.frequencies.iter().map(|f| f * TAU).collect()
    }

    /// Returns window-corrected amplitudes.
    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    /// Returns the index of the largest amplitude (first on ties).
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, &a) in self.amplitudes.iter().enumerate() {
            match best {
                Some((_, best_a)) if a <= best_a => {}
                _ => best = Some((idx, a)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}

/// Bin centre frequencies for an FFT of length `n` with sample spacing `dt`.
///
/// Matches the usual convention: `[0, 1, ..., (n-1)/2, -(n/2), ..., -1] / (n * dt)`.
pub fn fft_frequencies(n: usize, dt: f64) -> Vec<f64> {
    let scale = 1.0 / (n as f64 * dt);
    let positive = (n.saturating_sub(1)) / 2 + 1;
    (0..n)
        .map(|k| {
            if k < positive {
                k as f64 * scale
            } else {
                (k as f64 - n as f64) * scale
            }
        })
        .collect()
}
