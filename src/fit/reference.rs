//! Least-squares refinement of the reference sinusoid.
//!
//! The model is `y(t) = A * sin(2 * pi * (f0 + df) * t - phi)` with `f0` held
//! at the initial estimate and `A`, `df`, `phi` free. Bounds default to
//! `A in [0.5 A0, 2 A0]`, `df in [-100, 100]` Hz and `phi in [phi0 - pi, phi0 + pi]`.

use crate::fit::{solve_bounded, FitReport, LeastSquaresModel, ParamBounds, SolverConfig};
use crate::reference::ReferenceParameters;
use crate::signal::Waveform;
use crate::trace::{trace_event, trace_span};
use crate::util::{RefWaveError, RefWaveResult};
use std::f64::consts::{PI, TAU};

const AMPLITUDE: usize = 0;
const SHIFT: usize = 1;
const PHASE: usize = 2;

/// Sine with a fixed base frequency; parameters are `[A, df, phi]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SineModel {
    /// Base frequency `f0` in Hz.
    pub base_frequency: f64,
}

impl LeastSquaresModel for SineModel {
    fn num_params(&self) -> usize {
        3
    }

    fn predict(&self, t: f64, params: &[f64]) -> f64 {
        let arg = TAU * (self.base_frequency + params[SHIFT]) * t - params[PHASE];
        params[AMPLITUDE] * arg.sin()
    }

    fn gradient(&self, t: f64, params: &[f64], grad: &mut [f64]) {
        let arg = TAU * (self.base_frequency + params[SHIFT]) * t - params[PHASE];
        let (sin, cos) = arg.sin_cos();
        let a = params[AMPLITUDE];
        grad[AMPLITUDE] = sin;
        grad[SHIFT] = a * cos * TAU * t;
        grad[PHASE] = -a * cos;
    }
}

/// Bounds and solver settings for [`ReferenceFitter`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitConfig {
    /// Lower amplitude bound as a multiple of the initial amplitude.
    pub amplitude_lower_factor: f64,
    /// Upper amplitude bound as a multiple of the initial amplitude.
    pub amplitude_upper_factor: f64,
    /// Largest frequency correction in Hz, applied symmetrically.
    pub max_frequency_shift: f64,
    /// Half-width of the phase interval around the initial phase, in radians.
    pub phase_half_range: f64,
    /// Least-squares stopping rules.
    pub solver: SolverConfig,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            amplitude_lower_factor: 0.5,
            amplitude_upper_factor: 2.0,
            max_frequency_shift: 100.0,
            phase_half_range: PI,
            solver: SolverConfig::default(),
        }
    }
}

/// Refined reference parameters with solver diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceFit {
    /// `f0 + df`, the fitted amplitude and the fitted phase offset.
    pub reference: ReferenceParameters,
    /// Fitted frequency correction `df` in Hz.
    pub frequency_shift: f64,
    /// Raw solver output, parameters ordered `[A, df, phi]`.
    pub report: FitReport,
}

/// Fits the reference sinusoid to a waveform starting from a spectral guess.
#[derive(Clone, Debug, Default)]
pub struct ReferenceFitter {
    config: FitConfig,
}

impl ReferenceFitter {
    /// Creates a fitter with default bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the fit configuration.
    pub fn with_config(mut self, config: FitConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the fit configuration.
    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Builds the parameter box around `initial`.
    pub fn bounds(&self, initial: &ReferenceParameters) -> RefWaveResult<ParamBounds> {
        let cfg = &self.config;
        if !(initial.amplitude.is_finite() && initial.amplitude > 0.0) {
            return Err(RefWaveError::InvalidInput(
                "initial amplitude must be positive",
            ));
        }
        if !(initial.frequency.is_finite() && initial.phase_offset.is_finite()) {
            return Err(RefWaveError::InvalidInput("initial guess is not finite"));
        }
        if !(cfg.amplitude_lower_factor > 0.0
            && cfg.amplitude_lower_factor <= cfg.amplitude_upper_factor)
        {
            return Err(RefWaveError::InvalidInput("invalid amplitude bound factors"));
        }
        if cfg.max_frequency_shift.is_nan() || cfg.max_frequency_shift < 0.0 {
            return Err(RefWaveError::InvalidInput(
                "frequency shift bound must be non-negative",
            ));
        }
        if cfg.phase_half_range.is_nan() || cfg.phase_half_range <= 0.0 {
            return Err(RefWaveError::InvalidInput("phase range must be positive"));
        }

        ParamBounds::new(
            vec![
                initial.amplitude * cfg.amplitude_lower_factor,
                -cfg.max_frequency_shift,
                initial.phase_offset - cfg.phase_half_range,
            ],
            vec![
                initial.amplitude * cfg.amplitude_upper_factor,
                cfg.max_frequency_shift,
                initial.phase_offset + cfg.phase_half_range,
            ],
        )
    }

    /// Refines `initial` against the raw samples of `waveform`.
    pub fn fit(
        &self,
        waveform: &Waveform<'_>,
        initial: &ReferenceParameters,
    ) -> RefWaveResult<ReferenceFit> {
        let _span = trace_span!("reference_fit", samples = waveform.len()).entered();

        let bounds = self.bounds(initial)?;
        let model = SineModel {
            base_frequency: initial.frequency,
        };
        let start = [initial.amplitude, 0.0, initial.phase_offset];
        let report = solve_bounded(
            &model,
            waveform.time(),
            waveform.values(),
            &start,
            &bounds,
            &self.config.solver,
        )?;

        let frequency_shift = report.params[SHIFT];
        let reference = ReferenceParameters {
            frequency: initial.frequency + frequency_shift,
            amplitude: report.params[AMPLITUDE],
            phase_offset: report.params[PHASE],
        };
        trace_event!(
            "reference_fitted",
            frequency_hz = reference.frequency,
            amplitude = reference.amplitude,
            phase_offset = reference.phase_offset,
            iterations = report.iterations,
            cost = report.cost
        );

        Ok(ReferenceFit {
            reference,
            frequency_shift,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FitConfig, ReferenceFitter, SineModel};
    use crate::fit::LeastSquaresModel;
    use crate::reference::ReferenceParameters;
    use crate::signal::{time_axis, Waveform};
    use crate::util::RefWaveError;

    #[test]
    fn analytic_gradient_matches_finite_differences() {
        struct Numeric(SineModel);
        impl LeastSquaresModel for Numeric {
            fn num_params(&self) -> usize {
                3
            }
            fn predict(&self, t: f64, p: &[f64]) -> f64 {
                self.0.predict(t, p)
            }
        }

        let model = SineModel {
            base_frequency: 3.0,
        };
        let params = [1.2, 0.4, 0.7];
        let mut analytic = [0.0; 3];
        let mut numeric = [0.0; 3];
        model.gradient(0.37, &params, &mut analytic);
        Numeric(model).gradient(0.37, &params, &mut numeric);
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert!((a - n).abs() < 1e-6);
        }
    }

    #[test]
    fn bounds_follow_initial_guess() {
        let initial = ReferenceParameters {
            frequency: 1e3,
            amplitude: 2.0,
            phase_offset: 0.5,
        };
        let bounds = ReferenceFitter::new().bounds(&initial).unwrap();
        assert_eq!(bounds.lower()[0], 1.0);
        assert_eq!(bounds.upper()[0], 4.0);
        assert_eq!(bounds.lower()[1], -100.0);
        assert_eq!(bounds.upper()[1], 100.0);
        assert!((bounds.lower()[2] - (0.5 - std::f64::consts::PI)).abs() < 1e-15);
    }

    #[test]
    fn rejects_non_positive_amplitude() {
        let initial = ReferenceParameters {
            frequency: 1e3,
            amplitude: 0.0,
            phase_offset: 0.0,
        };
        let err = ReferenceFitter::new().bounds(&initial).unwrap_err();
        assert!(matches!(err, RefWaveError::InvalidInput(_)));
    }

    #[test]
    fn corrects_small_frequency_error() {
        let truth = ReferenceParameters {
            frequency: 1_000.0,
            amplitude: 0.8,
            phase_offset: -0.4,
        };
        let t = time_axis(0.0, 1e-5, 2_000);
        let y = truth.sample(&t);
        let waveform = Waveform::new(&t, &y).unwrap();
        let initial = ReferenceParameters {
            frequency: 1_004.0,
            amplitude: 0.7,
            phase_offset: -0.3,
        };
        let fit = ReferenceFitter::new()
            .with_config(FitConfig::default())
            .fit(&waveform, &initial)
            .unwrap();
        assert!((fit.reference.frequency - 1_000.0).abs() < 1e-6);
        assert!((fit.frequency_shift + 4.0).abs() < 1e-6);
        assert!((fit.reference.amplitude - 0.8).abs() < 1e-9);
        assert!((fit.reference.phase_offset + 0.4).abs() < 1e-8);
    }
}
