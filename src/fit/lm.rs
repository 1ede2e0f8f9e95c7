//! Projected Levenberg-Marquardt solver.

use crate::fit::{FitReport, LeastSquaresModel, ParamBounds, SolverConfig, Termination};
use crate::trace::trace_step;
use crate::util::math::solve_dense;
use crate::util::{RefWaveError, RefWaveResult};

const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e16;

/// Fits `model` to `(time, observed)` starting from `initial`, keeping every
/// parameter inside `bounds`.
///
/// Each iteration solves the damped normal equations
/// `(J^T J + lambda * diag(J^T J)) dx = -J^T r`, projects `x + dx` onto the
/// box and accepts the trial point only if it lowers the cost. Failure to meet
/// any stopping rule within `max_iterations`, non-finite residuals, or damping
/// growing without a descent step all yield
/// [`RefWaveError::FitDidNotConverge`].
pub fn solve_bounded<M>(
    model: &M,
    time: &[f64],
    observed: &[f64],
    initial: &[f64],
    bounds: &ParamBounds,
    cfg: &SolverConfig,
) -> RefWaveResult<FitReport>
where
    M: LeastSquaresModel + ?Sized,
{
    let p = model.num_params();
    let n = observed.len();
    if time.len() != n {
        return Err(RefWaveError::LengthMismatch {
            time: time.len(),
            values: n,
        });
    }
    if p == 0 {
        return Err(RefWaveError::InvalidInput("model has no free parameters"));
    }
    if initial.len() != p || bounds.len() != p {
        return Err(RefWaveError::InvalidInput(
            "parameter count does not match the model",
        ));
    }
    if n < p {
        return Err(RefWaveError::TooShort { needed: p, got: n });
    }

    let mut x = initial.to_vec();
    bounds.clamp(&mut x);

    let mut residuals = vec![0.0; n];
    let mut trial_residuals = vec![0.0; n];
    let mut jac = vec![0.0; n * p];
    let mut jtj = vec![0.0; p * p];
    let mut grad = vec![0.0; p];
    let mut trial = vec![0.0; p];
    let mut step = vec![0.0; p];

    let mut cost = evaluate_cost(model, time, observed, &x, &mut residuals);
    if !cost.is_finite() {
        return Err(RefWaveError::FitDidNotConverge {
            iterations: 0,
            reason: "non-finite residuals at the initial guess",
        });
    }
    let mut lambda = cfg.initial_damping.max(MIN_DAMPING);

    for iteration in 1..=cfg.max_iterations {
        if cost == 0.0 {
            return Ok(report(x, cost, iteration - 1, Termination::ZeroResidual));
        }

        fill_jacobian(model, time, &x, &mut jac);
        normal_equations(&jac, &residuals, p, &mut jtj, &mut grad);
        if !grad.iter().all(|g| g.is_finite()) {
            return Err(RefWaveError::FitDidNotConverge {
                iterations: iteration,
                reason: "non-finite jacobian",
            });
        }

        let r_norm = (2.0 * cost).sqrt();
        let mut grad_cos = 0.0f64;
        for i in 0..p {
            let col_norm = jtj[i * p + i].sqrt();
            if col_norm > 0.0 {
                grad_cos = grad_cos.max(grad[i].abs() / (col_norm * r_norm));
            }
        }
        if grad_cos <= cfg.gtol {
            return Ok(report(x, cost, iteration, Termination::Gradient));
        }

        let diag_floor = 1e-12 * (0..p).map(|i| jtj[i * p + i]).fold(0.0, f64::max);

        loop {
            let mut a = jtj.clone();
            for i in 0..p {
                a[i * p + i] += lambda * jtj[i * p + i].max(diag_floor);
            }
            step.iter_mut()
                .zip(grad.iter())
                .for_each(|(s, g)| *s = -g);
            if solve_dense(&a, &mut step).is_none() {
                lambda *= 10.0;
                if lambda > MAX_DAMPING {
                    return Err(RefWaveError::FitDidNotConverge {
                        iterations: iteration,
                        reason: "singular normal equations",
                    });
                }
                continue;
            }

            for i in 0..p {
                trial[i] = x[i] + step[i];
            }
            bounds.clamp(&mut trial);
            for i in 0..p {
                step[i] = trial[i] - x[i];
            }
            let step_norm = norm(&step);
            let x_norm = norm(&x);
            let small_step = step_norm <= cfg.xtol * (x_norm + cfg.xtol);

            let trial_cost = evaluate_cost(model, time, observed, &trial, &mut trial_residuals);
            if trial_cost.is_finite() && trial_cost < cost {
                let predicted = predicted_reduction(&jtj, &grad, &step);
                let actual = cost - trial_cost;
                let previous = cost;

                x.copy_from_slice(&trial);
                std::mem::swap(&mut residuals, &mut trial_residuals);
                cost = trial_cost;
                lambda = (lambda * 0.1).max(MIN_DAMPING);
                trace_step!(iteration, cost, lambda);

                if actual <= cfg.ftol * previous && predicted.abs() <= cfg.ftol * previous {
                    return Ok(report(x, cost, iteration, Termination::CostReduction));
                }
                if small_step {
                    return Ok(report(x, cost, iteration, Termination::StepSize));
                }
                break;
            }

            if small_step {
                return Ok(report(x, cost, iteration, Termination::StepSize));
            }
            lambda *= 10.0;
            if lambda > MAX_DAMPING {
                return Err(RefWaveError::FitDidNotConverge {
                    iterations: iteration,
                    reason: "no descent step found",
                });
            }
        }
    }

    Err(RefWaveError::FitDidNotConverge {
        iterations: cfg.max_iterations,
        reason: "iteration limit reached",
    })
}

fn report(params: Vec<f64>, cost: f64, iterations: usize, termination: Termination) -> FitReport {
    FitReport {
        params,
        cost,
        iterations,
        termination,
    }
}

fn evaluate_cost<M>(model: &M, time: &[f64], observed: &[f64], x: &[f64], out: &mut [f64]) -> f64
where
    M: LeastSquaresModel + ?Sized,
{
    let mut sum = 0.0;
    for ((r, &t), &y) in out.iter_mut().zip(time).zip(observed) {
        *r = model.predict(t, x) - y;
        sum += *r * *r;
    }
    0.5 * sum
}

fn fill_jacobian<M>(model: &M, time: &[f64], x: &[f64], jac: &mut [f64])
where
    M: LeastSquaresModel + ?Sized,
{
    let p = x.len();
    for (row, &t) in jac.chunks_exact_mut(p).zip(time) {
        model.gradient(t, x, row);
    }
}

fn normal_equations(jac: &[f64], residuals: &[f64], p: usize, jtj: &mut [f64], grad: &mut [f64]) {
    jtj.fill(0.0);
    grad.fill(0.0);
    for (row, &r) in jac.chunks_exact(p).zip(residuals) {
        for i in 0..p {
            grad[i] += row[i] * r;
            for j in i..p {
                jtj[i * p + j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            jtj[i * p + j] = jtj[j * p + i];
        }
    }
}

fn predicted_reduction(jtj: &[f64], grad: &[f64], step: &[f64]) -> f64 {
    let p = step.len();
    let mut quad = 0.0;
    for i in 0..p {
        for j in 0..p {
            quad += step[i] * jtj[i * p + j] * step[j];
        }
    }
    let linear: f64 = grad.iter().zip(step).map(|(g, s)| g * s).sum();
    -(linear + 0.5 * quad)
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::solve_bounded;
    use crate::fit::{LeastSquaresModel, ParamBounds, SolverConfig};
    use crate::util::RefWaveError;

    struct Exponential;

    impl LeastSquaresModel for Exponential {
        fn num_params(&self) -> usize {
            2
        }

        fn predict(&self, t: f64, p: &[f64]) -> f64 {
            p[0] * (-p[1] * t).exp()
        }
    }

    fn samples() -> (Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (0..40).map(|i| i as f64 * 0.1).collect();
        let y = t.iter().map(|&t| 2.5 * (-1.3 * t).exp()).collect();
        (t, y)
    }

    #[test]
    fn recovers_exponential_decay() {
        let (t, y) = samples();
        let bounds = ParamBounds::unbounded(2);
        let report = solve_bounded(
            &Exponential,
            &t,
            &y,
            &[1.0, 0.5],
            &bounds,
            &SolverConfig::default(),
        )
        .unwrap();
        assert!((report.params[0] - 2.5).abs() < 1e-6);
        assert!((report.params[1] - 1.3).abs() < 1e-6);
        assert!(report.cost < 1e-12);
    }

    #[test]
    fn active_bound_holds() {
        let (t, y) = samples();
        let bounds = ParamBounds::new(vec![0.0, 0.0], vec![2.0, 5.0]).unwrap();
        let report = solve_bounded(
            &Exponential,
            &t,
            &y,
            &[1.0, 0.5],
            &bounds,
            &SolverConfig::default(),
        )
        .unwrap();
        assert!(bounds.contains(&report.params));
        assert!((report.params[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn iteration_limit_is_reported() {
        let (t, y) = samples();
        let cfg = SolverConfig {
            max_iterations: 1,
            ..SolverConfig::default()
        };
        let err = solve_bounded(
            &Exponential,
            &t,
            &y,
            &[1.0, 0.5],
            &ParamBounds::unbounded(2),
            &cfg,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RefWaveError::FitDidNotConverge {
                iterations: 1,
                reason: "iteration limit reached",
            }
        );
    }

    #[test]
    fn rejects_parameter_count_mismatch() {
        let (t, y) = samples();
        let err = solve_bounded(
            &Exponential,
            &t,
            &y,
            &[1.0],
            &ParamBounds::unbounded(1),
            &SolverConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RefWaveError::InvalidInput(_)));
    }
}
