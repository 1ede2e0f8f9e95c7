//! Bounded nonlinear least squares.
//!
//! A fit is described by a [`LeastSquaresModel`] mapping `(t, params)` to a
//! predicted sample, a [`ParamBounds`] box, and a [`SolverConfig`]. The solver
//! in [`solve_bounded`] minimises `0.5 * sum((model(t_i) - y_i)^2)` with a
//! Levenberg-Marquardt iteration whose trial points are projected onto the box.

mod lm;
pub mod reference;

pub use lm::solve_bounded;
pub use reference::{FitConfig, ReferenceFit, ReferenceFitter, SineModel};

use crate::util::{RefWaveError, RefWaveResult};

/// Parametric model evaluated at scalar abscissas.
pub trait LeastSquaresModel {
    /// Number of free parameters.
    fn num_params(&self) -> usize;

    /// Predicted value at `t`.
    fn predict(&self, t: f64, params: &[f64]) -> f64;

    /// Partial derivatives of [`LeastSquaresModel::predict`] with respect to
    /// each parameter, written into `grad`.
    ///
    /// The default uses central differences.
    fn gradient(&self, t: f64, params: &[f64], grad: &mut [f64]) {
        let mut probe = params.to_vec();
        for (i, g) in grad.iter_mut().enumerate() {
            let h = 1e-7 * params[i].abs().max(1.0);
            probe[i] = params[i] + h;
            let up = self.predict(t, &probe);
            probe[i] = params[i] - h;
            let down = self.predict(t, &probe);
            probe[i] = params[i];
            *g = (up - down) / (2.0 * h);
        }
    }
}

/// Box constraints, one `[lower, upper]` interval per parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ParamBounds {
    /// Creates bounds; every interval must be non-empty and non-NaN.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> RefWaveResult<Self> {
        if lower.len() != upper.len() {
            return Err(RefWaveError::InvalidInput("bounds have different lengths"));
        }
        if lower
            .iter()
            .zip(upper.iter())
            .any(|(lo, hi)| lo.is_nan() || hi.is_nan() || lo > hi)
        {
            return Err(RefWaveError::InvalidInput("lower bound exceeds upper bound"));
        }
        Ok(Self { lower, upper })
    }

    /// Unbounded box for `n` parameters.
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    /// Number of parameters covered.
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    /// Returns true when no parameters are covered.
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Lower bounds.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Returns true if every parameter lies inside its interval.
    pub fn contains(&self, params: &[f64]) -> bool {
        params
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(p, (lo, hi))| p >= lo && p <= hi)
    }

    /// Projects `params` onto the box.
    pub fn clamp(&self, params: &mut [f64]) {
        for (p, (lo, hi)) in params
            .iter_mut()
            .zip(self.lower.iter().zip(self.upper.iter()))
        {
            *p = p.clamp(*lo, *hi);
        }
    }
}

/// Stopping rules for [`solve_bounded`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverConfig {
    /// Maximum number of Jacobian evaluations.
    pub max_iterations: usize,
    /// Relative cost reduction below which an accepted step ends the fit.
    pub ftol: f64,
    /// Relative step length below which the fit ends.
    pub xtol: f64,
    /// Largest cosine between the residual and a Jacobian column at a minimum.
    pub gtol: f64,
    /// Starting Levenberg-Marquardt damping factor.
    pub initial_damping: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
            initial_damping: 1e-3,
        }
    }
}

/// Which stopping rule ended a successful fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The model reproduces the data exactly.
    ZeroResidual,
    /// The gradient is orthogonal to the residual within `gtol`.
    Gradient,
    /// An accepted step reduced the cost by less than `ftol`.
    CostReduction,
    /// The step length fell below `xtol`.
    StepSize,
}

/// Outcome of a converged least-squares fit.
#[derive(Clone, Debug, PartialEq)]
pub struct FitReport {
    /// Best-fit parameters, inside the bounds.
    pub params: Vec<f64>,
    /// Final cost `0.5 * sum(r^2)`.
    pub cost: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Stopping rule that fired.
    pub termination: Termination,
}
