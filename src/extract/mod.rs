//! Amplitude, phase and frequency extraction from a padded spectrum.
//!
//! Amplitudes are corrected for the window gain: a tone contributes
//! `A/2 * sum(w)` to its positive-frequency bin, so the one-sided amplitude is
//! `2 * |Y| / sum(w)`. The DC bin has no mirror and is divided by `sum(w)` only.

use crate::reference::ReferenceParameters;
use crate::refine::{refine_peak, PeakEstimate};
use crate::signal::Waveform;
use crate::spectrum::PaddedSpectrum;
use crate::trace::{trace_event, trace_span};
use crate::util::math::wrap_phase;
use crate::util::{RefWaveError, RefWaveResult};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Spectral component estimated near a target frequency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetComponent {
    /// Refined angular frequency in rad/s.
    pub angular_frequency: f64,
    /// Window-corrected one-sided amplitude.
    pub amplitude: f64,
    /// Phase of the refined bin in (-pi, pi], relative to the first sample.
    pub phase: f64,
    /// Underlying sub-bin peak estimate.
    pub peak: PeakEstimate,
}

impl TargetComponent {
    /// Returns the refined frequency in Hz.
    pub fn frequency_hz(&self) -> f64 {
        self.angular_frequency / TAU
    }
}

/// Highest bin of the one-sided amplitude spectrum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoarsePeak {
    /// Bin index (shared by the one-sided and full spectra).
    pub index: usize,
    /// Bin centre frequency in Hz.
    pub frequency: f64,
    /// One-sided amplitude at the bin.
    pub amplitude: f64,
}

/// Result of a blind peak search over one spectrum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectralSearch {
    /// Largest bin before refinement.
    pub coarse: CoarsePeak,
    /// Refined component at the coarse peak.
    pub component: TargetComponent,
    /// Initial guess for the sinusoid fit.
    pub reference: ReferenceParameters,
}

/// Estimates amplitude, phase and refined angular frequency near `target_hz`.
///
/// The target is mapped to the nearest bin, refined by complex quadratic
/// interpolation, and the fractional position is mapped back to a frequency
/// by linear interpolation between the bracketing bins.
pub fn estimate_at_frequency(spectrum: &PaddedSpectrum, target_hz: f64) -> TargetComponent {
    let index = spectrum.nearest_bin(target_hz);
    let peak = refine_peak(spectrum.bins(), index);
    let frequency = position_to_frequency(spectrum, peak.position);

    TargetComponent {
        angular_frequency: frequency * TAU,
        amplitude: 2.0 * peak.magnitude / spectrum.window_sum(),
        phase: peak.phase,
        peak,
    }
}

/// Returns the window-corrected magnitude of the DC bin.
pub fn estimate_dc_component(spectrum: &PaddedSpectrum) -> f64 {
    spectrum.bins()[0].norm() / spectrum.window_sum()
}

/// Returns the largest bin of the one-sided amplitude spectrum.
pub fn coarse_peak(spectrum: &PaddedSpectrum) -> CoarsePeak {
    let one_sided = spectrum.one_sided();
    // The one-sided spectrum always holds at least the DC bin.
    let index = one_sided.argmax().unwrap_or(0);
    CoarsePeak {
        index,
        frequency: one_sided.frequencies()[index].abs(),
        amplitude: one_sided.amplitudes()[index],
    }
}

/// Finds the dominant tone of `waveform` without a target frequency.
///
/// Builds a padded spectrum, takes the largest one-sided bin as a coarse
/// guess and refines it with [`estimate_at_frequency`].
pub fn blind_peak_search(
    waveform: &Waveform<'_>,
    pad_factor: usize,
) -> RefWaveResult<ReferenceParameters> {
    let spectrum = PaddedSpectrum::compute(waveform, pad_factor)?;
    search_spectrum(&spectrum, waveform.t0()).map(|search| search.reference)
}

/// Runs the blind peak search on an existing spectrum.
///
/// `t0` is the time of the first sample. The bin phase is measured relative to
/// that sample, so the returned phase offset is shifted by `2 * pi * f * t0`
/// to reference it to `t = 0`, then wrapped to (-pi, pi]. For a waveform that
/// starts at `t = 0` this is `-(phase + pi/2)`, which converts the cosine
/// phase of the bin to the sine convention of [`ReferenceParameters`].
pub fn search_spectrum(spectrum: &PaddedSpectrum, t0: f64) -> RefWaveResult<SpectralSearch> {
    let _span = trace_span!("blind_peak_search", bins = spectrum.len()).entered();

    let coarse = coarse_peak(spectrum);
    trace_event!(
        "coarse_peak",
        index = coarse.index,
        frequency_hz = coarse.frequency,
        amplitude = coarse.amplitude
    );

    let component = estimate_at_frequency(spectrum, coarse.frequency);
    let frequency = component.frequency_hz();
    if !(frequency.is_finite() && component.amplitude.is_finite()) {
        return Err(RefWaveError::InvalidInput("spectral estimate is not finite"));
    }

    let phase_offset = wrap_phase(-(component.phase + FRAC_PI_2) + TAU * frequency * t0);
    let reference = ReferenceParameters {
        frequency,
        amplitude: component.amplitude,
        phase_offset,
    };
    trace_event!(
        "spectral_estimate",
        frequency_hz = reference.frequency,
        amplitude = reference.amplitude,
        phase_offset = reference.phase_offset,
        refined = component.peak.is_refined()
    );

    Ok(SpectralSearch {
        coarse,
        component,
        reference,
    })
}

fn position_to_frequency(spectrum: &PaddedSpectrum, position: f64) -> f64 {
    let freqs = spectrum.frequencies();
    let lo = position.floor();
    let hi = position.ceil();
    let f_lo = freqs[lo as usize];
    if lo == hi {
        return f_lo;
    }
    let mut f_hi = freqs[hi as usize];
    if f_hi < f_lo {
        // Bracket straddles the wrap from +fs/2 to -fs/2.
        f_hi = f_lo + spectrum.bin_spacing();
    }
    f_lo + (position - lo) * (f_hi - f_lo)
}
