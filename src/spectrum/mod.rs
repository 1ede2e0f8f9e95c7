//! Windowing, zero-padding and transforming a sampled waveform.
//!
//! A [`PaddedSpectrum`] is built once per analysis from a [`crate::Waveform`]
//! and a pad factor `P >= 1`. Padding appends `N * (P - 1)` zeros after the
//! windowed samples, which narrows the bin spacing to `1 / (N * P * dt)`
//! without changing the energy carried by the real samples.

mod padded;
mod window;

pub use padded::{fft_frequencies, OneSidedSpectrum, PaddedSpectrum};
pub use window::HannWindow;
