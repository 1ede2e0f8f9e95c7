//! Refwave estimates the frequency, amplitude and phase of a sampled reference
//! oscillator.
//!
//! The pipeline runs in one direction: a uniformly sampled [`Waveform`] is
//! Hann-windowed and zero-padded into a [`PaddedSpectrum`]; the strongest bin
//! is refined to sub-bin precision by complex quadratic interpolation; the
//! resulting [`ReferenceParameters`] seed a bounded least-squares fit of
//! `A * sin(2 * pi * f * t - phi)` against the raw samples.
//!
//! Frequencies in [`ReferenceParameters`] are in Hz; spectral components
//! additionally report angular frequency in rad/s.

pub mod analyze;
pub mod extract;
pub mod fit;
pub mod lowlevel;
mod reference;
pub mod refine;
pub mod signal;
pub mod spectrum;
mod trace;
pub mod util;

pub use analyze::{AnalysisConfig, ReferenceAnalysis, ReferenceAnalyzer};
pub use extract::{
    blind_peak_search, coarse_peak, estimate_at_frequency, estimate_dc_component,
    search_spectrum, CoarsePeak, SpectralSearch, TargetComponent,
};
pub use fit::{
    solve_bounded, FitConfig, FitReport, LeastSquaresModel, ParamBounds, ReferenceFit,
    ReferenceFitter, SineModel, SolverConfig, Termination,
};
pub use reference::ReferenceParameters;
pub use refine::{refine_peak, PeakEstimate, PeakFallback};
pub use signal::{time_axis, OwnedWaveform, Waveform};
pub use spectrum::{HannWindow, OneSidedSpectrum, PaddedSpectrum};
pub use util::{RefWaveError, RefWaveResult};
