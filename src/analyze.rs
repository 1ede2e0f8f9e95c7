//! End-to-end reference analysis: spectral estimate, DC level, refinement fit.

use crate::extract::{estimate_dc_component, search_spectrum, SpectralSearch};
use crate::fit::{FitConfig, ReferenceFit, ReferenceFitter};
use crate::reference::ReferenceParameters;
use crate::signal::Waveform;
use crate::spectrum::PaddedSpectrum;
use crate::trace::trace_span;
use crate::util::RefWaveResult;

/// Configuration for [`ReferenceAnalyzer`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalysisConfig {
    /// Zero-padding factor for the spectral stage.
    pub pad_factor: usize,
    /// Bounds and stopping rules for the refinement fit.
    pub fit: FitConfig,
    /// Analyse batches in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pad_factor: 5,
            fit: FitConfig::default(),
            parallel: false,
        }
    }
}

/// Everything learned about one reference waveform.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceAnalysis {
    /// Spectral search result, including the initial guess.
    pub spectral: SpectralSearch,
    /// Window-corrected DC level.
    pub dc_component: f64,
    /// Least-squares refinement of the spectral guess.
    pub fit: ReferenceFit,
}

impl ReferenceAnalysis {
    /// Initial guess from the spectrum.
    pub fn initial(&self) -> &ReferenceParameters {
        &self.spectral.reference
    }

    /// Refined parameters from the fit.
    pub fn refined(&self) -> &ReferenceParameters {
        &self.fit.reference
    }
}

/// Runs blind peak search followed by the bounded sinusoid fit.
#[derive(Clone, Debug, Default)]
pub struct ReferenceAnalyzer {
    config: AnalysisConfig,
}

impl ReferenceAnalyzer {
    /// Creates an analyzer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyses one waveform.
    pub fn analyze(&self, waveform: &Waveform<'_>) -> RefWaveResult<ReferenceAnalysis> {
        let _span = trace_span!("analyze_reference", samples = waveform.len()).entered();

        let spectrum = PaddedSpectrum::compute(waveform, self.config.pad_factor)?;
        let spectral = search_spectrum(&spectrum, waveform.t0())?;
        let dc_component = estimate_dc_component(&spectrum);

        let fit = ReferenceFitter::new()
            .with_config(self.config.fit)
            .fit(waveform, &spectral.reference)?;

        Ok(ReferenceAnalysis {
            spectral,
            dc_component,
            fit,
        })
    }

    /// Analyses independent waveforms, one result per input in order.
    ///
    /// With the `rayon` feature and `parallel` set, waveforms are processed on
    /// the rayon thread pool; otherwise sequentially.
    pub fn analyze_batch(&self, waveforms: &[Waveform<'_>]) -> Vec<RefWaveResult<ReferenceAnalysis>> {
        #[cfg(feature = "rayon")]
        if self.config.parallel {
            use rayon::prelude::*;
            return waveforms.par_iter().map(|w| self.analyze(w)).collect();
        }

        waveforms.iter().map(|w| self.analyze(w)).collect()
    }
}
