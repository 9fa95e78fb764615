//! Step loop, error control and output sampling.

use nalgebra::DVector;
use tracing::debug;

use crate::error::SolveError;
use crate::options::SolverOptions;
use crate::system::OdeSystem;
use crate::tableau::Tableau;

/// Integration statistics for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub fn_evals: usize,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
}

/// Sampled trajectory.
#[derive(Debug, Clone)]
pub struct Solution {
    pub t: Vec<f64>,
    pub y: Vec<DVector<f64>>,
    pub stats: Stats,
}

impl Solution {
    /// Time series of one state component.
    pub fn component(&self, index: usize) -> Vec<f64> {
        self.y.iter().map(|y| y[index]).collect()
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// Step-size controller using an I-controller.
///
/// h_new = safety * h * error^(-1/(p+1))
#[derive(Debug, Clone)]
struct StepController {
    safety: f64,
    min_factor: f64,
    max_factor: f64,
    exponent: f64,
}

impl StepController {
    fn for_order(error_order: u32) -> Self {
        Self {
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
            exponent: 1.0 / f64::from(error_order + 1),
        }
    }

    fn factor(&self, error: f64) -> f64 {
        if error == 0.0 {
            return self.max_factor;
        }
        if !error.is_finite() {
            return self.min_factor;
        }
        (self.safety * error.powf(-self.exponent)).clamp(self.min_factor, self.max_factor)
    }
}

/// Integrate `system` over `t_span` from `y0`.
///
/// With `t_eval`, the solution is sampled exactly at those times: the
/// stepper never steps past the next requested time. The points must lie
/// within the span and be ordered in the direction of integration. Without
/// `t_eval`, every accepted step is recorded, starting with `t_span.0`.
///
/// A span with `t_span.1 < t_span.0` integrates backward.
pub fn solve<S: OdeSystem>(
    system: &S,
    t_span: (f64, f64),
    y0: &DVector<f64>,
    t_eval: Option<&[f64]>,
    options: &SolverOptions,
) -> Result<Solution, SolveError<S::Error>> {
    options.validate().map_err(SolveError::InvalidInput)?;
    let (t0, t1) = t_span;
    if !(t0.is_finite() && t1.is_finite()) {
        return Err(SolveError::InvalidInput(format!(
            "time span must be finite, got ({t0}, {t1})"
        )));
    }
    if y0.len() != system.dim() {
        return Err(SolveError::InvalidInput(format!(
            "initial state has {} components, system expects {}",
            y0.len(),
            system.dim()
        )));
    }
    if y0.iter().any(|v| !v.is_finite()) {
        return Err(SolveError::InvalidInput("initial state is not finite".into()));
    }
    let direction = if t1 >= t0 { 1.0 } else { -1.0 };
    if let Some(points) = t_eval {
        check_eval_points(points, t0, t1, direction).map_err(SolveError::InvalidInput)?;
    }

    let tableau = options.method.tableau();
    let mut stats = Stats::default();
    let mut out_t = Vec::new();
    let mut out_y = Vec::new();
    let mut next_out = 0;

    let mut record = |t: f64, y: &DVector<f64>, next_out: &mut usize| match t_eval {
        None => {
            out_t.push(t);
            out_y.push(y.clone());
        }
        Some(points) => {
            while *next_out < points.len() && points[*next_out] == t {
                out_t.push(t);
                out_y.push(y.clone());
                *next_out += 1;
            }
        }
    };

    record(t0, y0, &mut next_out);
    if t0 == t1 {
        return Ok(Solution {
            t: out_t,
            y: out_y,
            stats,
        });
    }

    let n = y0.len();
    let mut t = t0;
    let mut y = y0.clone();
    let f_initial = evaluate(system, t, &y, &mut stats)?;
    let mut k = vec![DVector::zeros(n); tableau.stages()];
    let controller = StepController::for_order(tableau.error_order);
    let max_step = options.max_step();

    let mut h_abs = match (options.first_step, tableau.adaptive()) {
        (Some(h), _) => h,
        (None, false) => (t1 - t0).abs() / 100.0,
        (None, true) => initial_step(
            system, t0, &y, &f_initial, direction, tableau, options, &mut stats,
        )?,
    }
    .min(max_step);
    let mut f_start = Some(f_initial);

    let mut attempts = 0;
    let mut rejected_since_accept = false;

    while direction * (t1 - t) > 0.0 {
        let target = t_eval
            .and_then(|points| points.get(next_out).copied())
            .unwrap_or(t1);
        let remaining = (target - t).abs();
        let clipped = h_abs >= remaining;
        let h_try = if clipped { remaining } else { h_abs };
        if !clipped && h_try < options.min_step {
            return Err(SolveError::StepSizeUnderflow { t, h: h_try });
        }

        attempts += 1;
        if attempts > options.max_steps {
            return Err(SolveError::MaxStepsExceeded {
                steps: options.max_steps,
                t,
            });
        }

        let f0 = match f_start.take() {
            Some(f) => f,
            None => evaluate(system, t, &y, &mut stats)?,
        };
        let h = direction * h_try;
        let (y_new, err) = attempt(system, tableau, t, &y, h, &f0, &mut k, &mut stats)?;
        let err_norm = err.map_or(0.0, |e| error_norm(&e, &y, &y_new, options));

        if err_norm <= 1.0 {
            t = if clipped { target } else { advance(t, h, target, direction) };
            if y_new.iter().any(|v| !v.is_finite()) {
                return Err(SolveError::NonFiniteState { t });
            }
            y = y_new;
            stats.accepted_steps += 1;
            f_start = tableau.fsal.then(|| k[k.len() - 1].clone());
            record(t, &y, &mut next_out);

            if tableau.adaptive() {
                let mut factor = controller.factor(err_norm);
                if rejected_since_accept {
                    factor = factor.min(1.0);
                }
                let proposed = h_try * factor;
                h_abs = (if clipped { h_abs.max(proposed) } else { proposed }).min(max_step);
            }
            rejected_since_accept = false;
        } else {
            stats.rejected_steps += 1;
            rejected_since_accept = true;
            f_start = Some(f0);
            h_abs = h_try * controller.factor(err_norm);
            if h_abs < options.min_step {
                return Err(SolveError::StepSizeUnderflow { t, h: h_abs });
            }
        }
    }

    debug!(
        method = ?options.method,
        fn_evals = stats.fn_evals,
        accepted = stats.accepted_steps,
        rejected = stats.rejected_steps,
        samples = out_t.len(),
        "ode solve finished"
    );

    Ok(Solution {
        t: out_t,
        y: out_y,
        stats,
    })
}

/// `t + h`, snapped onto `target` when rounding carries it past.
fn advance(t: f64, h: f64, target: f64, direction: f64) -> f64 {
    let stepped = t + h;
    if direction * (stepped - target) >= 0.0 {
        target
    } else {
        stepped
    }
}

fn check_eval_points(points: &[f64], t0: f64, t1: f64, direction: f64) -> Result<(), String> {
    for (i, &p) in points.iter().enumerate() {
        if !p.is_finite() || direction * (p - t0) < 0.0 || direction * (t1 - p) < 0.0 {
            return Err(format!("t_eval[{i}] = {p} lies outside the span [{t0}, {t1}]"));
        }
        if i > 0 && direction * (p - points[i - 1]) < 0.0 {
            return Err(format!(
                "t_eval must be ordered in the direction of integration (index {i})"
            ));
        }
    }
    Ok(())
}

fn evaluate<S: OdeSystem>(
    system: &S,
    t: f64,
    y: &DVector<f64>,
    stats: &mut Stats,
) -> Result<DVector<f64>, SolveError<S::Error>> {
    let mut dydt = DVector::zeros(y.len());
    system
        .rhs(t, y, &mut dydt)
        .map_err(|source| SolveError::Rhs { t, source })?;
    stats.fn_evals += 1;
    Ok(dydt)
}

/// One step of size `h`. Returns the propagated state and, for embedded
/// methods, the local error vector.
#[allow(clippy::too_many_arguments)]
fn attempt<S: OdeSystem>(
    system: &S,
    tableau: &Tableau,
    t: f64,
    y: &DVector<f64>,
    h: f64,
    f0: &DVector<f64>,
    k: &mut [DVector<f64>],
    stats: &mut Stats,
) -> Result<(DVector<f64>, Option<DVector<f64>>), SolveError<S::Error>> {
    k[0].copy_from(f0);
    for (i, row) in tableau.a.iter().enumerate() {
        let stage = i + 1;
        let mut yi = y.clone();
        for (j, a) in row.iter().enumerate() {
            if *a != 0.0 {
                yi.axpy(h * a, &k[j], 1.0);
            }
        }
        let ti = t + tableau.c[stage] * h;
        system
            .rhs(ti, &yi, &mut k[stage])
            .map_err(|source| SolveError::Rhs { t: ti, source })?;
        stats.fn_evals += 1;
    }

    let mut y_new = y.clone();
    for (kj, b) in k.iter().zip(tableau.b) {
        if *b != 0.0 {
            y_new.axpy(h * b, kj, 1.0);
        }
    }
    let err = tableau.b_hat.map(|b_hat| {
        let mut e = DVector::zeros(y.len());
        for ((kj, b), bh) in k.iter().zip(tableau.b).zip(b_hat) {
            let w = b - bh;
            if w != 0.0 {
                e.axpy(h * w, kj, 1.0);
            }
        }
        e
    });
    Ok((y_new, err))
}

/// RMS of the error scaled by `atol + rtol * max(|y|, |y_new|)`.
fn error_norm(err: &DVector<f64>, y: &DVector<f64>, y_new: &DVector<f64>, options: &SolverOptions) -> f64 {
    let n = err.len();
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = err
        .iter()
        .zip(y.iter().zip(y_new.iter()))
        .map(|(e, (a, b))| {
            let scale = options.atol + options.rtol * a.abs().max(b.abs());
            (e / scale).powi(2)
        })
        .sum();
    (sum / n as f64).sqrt()
}

fn rms_scaled(v: &DVector<f64>, y: &DVector<f64>, options: &SolverOptions) -> f64 {
    let n = v.len().max(1) as f64;
    let sum: f64 = v
        .iter()
        .zip(y.iter())
        .map(|(x, yi)| (x / (options.atol + options.rtol * yi.abs())).powi(2))
        .sum();
    (sum / n).sqrt()
}

/// Starting step from the size of the state, its derivative and an estimate
/// of the second derivative (Hairer, Nørsett & Wanner, II.4).
#[allow(clippy::too_many_arguments)]
fn initial_step<S: OdeSystem>(
    system: &S,
    t0: f64,
    y0: &DVector<f64>,
    f0: &DVector<f64>,
    direction: f64,
    tableau: &Tableau,
    options: &SolverOptions,
    stats: &mut Stats,
) -> Result<f64, SolveError<S::Error>> {
    let d0 = rms_scaled(y0, y0, options);
    let d1 = rms_scaled(f0, y0, options);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };

    let y1 = y0 + f0 * (direction * h0);
    let f1 = evaluate(system, t0 + direction * h0, &y1, stats)?;
    let d2 = rms_scaled(&(f1 - f0), y0, options) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / f64::from(tableau.error_order + 1))
    };
    Ok((100.0 * h0).min(h1).max(options.min_step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Method;
    use approx::assert_relative_eq;
    use std::convert::Infallible;

    /// dy/dt = -k y
    struct Decay {
        k: f64,
    }

    impl OdeSystem for Decay {
        type Error = Infallible;

        fn dim(&self) -> usize {
            1
        }

        fn rhs(&self, _t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) -> Result<(), Infallible> {
            dydt[0] = -self.k * y[0];
            Ok(())
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("left the domain at y = {0}")]
    struct OutOfDomain(f64);

    /// dy/dt = 1, failing once y exceeds a bound.
    struct Bounded {
        limit: f64,
    }

    impl OdeSystem for Bounded {
        type Error = OutOfDomain;

        fn dim(&self) -> usize {
            1
        }

        fn rhs(&self, _t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) -> Result<(), OutOfDomain> {
            if y[0] > self.limit {
                return Err(OutOfDomain(y[0]));
            }
            dydt[0] = 1.0;
            Ok(())
        }
    }

    fn tight(method: Method) -> SolverOptions {
        SolverOptions::default()
            .with_method(method)
            .with_tolerances(1e-10, 1e-12)
    }

    #[test]
    fn test_decay_matches_exponential_for_each_method() {
        let sys = Decay { k: 0.5 };
        let y0 = DVector::from_element(1, 2.0);
        let t_eval = [0.0, 1.0, 2.5, 4.0];
        for method in [Method::Rk45, Method::Rkf45, Method::Rk4] {
            let mut opts = tight(method);
            if method == Method::Rk4 {
                opts.first_step = Some(0.01);
            }
            let sol = solve(&sys, (0.0, 4.0), &y0, Some(&t_eval), &opts).unwrap();
            assert_eq!(sol.t, t_eval.to_vec());
            for (t, y) in sol.t.iter().zip(&sol.y) {
                assert_relative_eq!(y[0], 2.0 * (-0.5 * t).exp(), max_relative = 1e-8);
            }
        }
    }

    #[test]
    fn test_backward_integration() {
        let sys = Decay { k: 1.0 };
        let y0 = DVector::from_element(1, 1.0);
        let t_eval = [0.0, -0.5, -1.0];
        let sol = solve(&sys, (0.0, -1.0), &y0, Some(&t_eval), &tight(Method::Rk45)).unwrap();
        assert_eq!(sol.len(), 3);
        assert_relative_eq!(sol.y[2][0], 1.0_f64.exp(), max_relative = 1e-8);
    }

    #[test]
    fn test_without_t_eval_records_every_accepted_step() {
        let sys = Decay { k: 1.0 };
        let y0 = DVector::from_element(1, 1.0);
        let sol = solve(&sys, (0.0, 1.0), &y0, None, &SolverOptions::default()).unwrap();
        assert_eq!(sol.t[0], 0.0);
        assert_eq!(*sol.t.last().unwrap(), 1.0);
        assert_eq!(sol.len(), sol.stats.accepted_steps + 1);
        assert!(sol.t.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_fsal_saves_evaluations() {
        let sys = Decay { k: 1.0 };
        let y0 = DVector::from_element(1, 1.0);
        let opts = tight(Method::Rk45);
        let sol = solve(&sys, (0.0, 1.0), &y0, None, &opts).unwrap();
        let attempts = sol.stats.accepted_steps + sol.stats.rejected_steps;
        // one initial evaluation, one for step selection, six per attempt
        assert_eq!(sol.stats.fn_evals, 2 + 6 * attempts);
    }

    #[test]
    fn test_invalid_inputs() {
        let sys = Decay { k: 1.0 };
        let y0 = DVector::from_element(1, 1.0);
        let opts = SolverOptions::default();
        let outside = solve(&sys, (0.0, 1.0), &y0, Some(&[0.5, 2.0]), &opts);
        assert!(matches!(outside, Err(SolveError::InvalidInput(_))));
        let unordered = solve(&sys, (0.0, 1.0), &y0, Some(&[0.5, 0.2]), &opts);
        assert!(matches!(unordered, Err(SolveError::InvalidInput(_))));
        let wrong_dim = solve(&sys, (0.0, 1.0), &DVector::zeros(2), None, &opts);
        assert!(matches!(wrong_dim, Err(SolveError::InvalidInput(_))));
    }

    #[test]
    fn test_rhs_failure_propagates_with_time() {
        let sys = Bounded { limit: 0.5 };
        let y0 = DVector::from_element(1, 0.0);
        let err = solve(&sys, (0.0, 2.0), &y0, None, &SolverOptions::default()).unwrap_err();
        match err {
            SolveError::Rhs { t, source } => {
                assert!(t > 0.4 && t <= 2.0, "failed at t = {t}");
                assert!(source.0 > 0.5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_max_steps_exceeded() {
        let sys = Decay { k: 1.0 };
        let y0 = DVector::from_element(1, 1.0);
        let opts = SolverOptions {
            method: Method::Rk4,
            first_step: Some(1e-3),
            max_steps: 10,
            ..Default::default()
        };
        let err = solve(&sys, (0.0, 1.0), &y0, None, &opts).unwrap_err();
        assert!(matches!(err, SolveError::MaxStepsExceeded { steps: 10, .. }));
    }

    #[test]
    fn test_advance_snaps_onto_target() {
        assert_eq!(advance(0.0, 0.30000000000000004, 0.3, 1.0), 0.3);
        assert_eq!(advance(1.0, -0.7000000000000001, 0.3, -1.0), 0.3);
        assert_eq!(advance(0.0, 0.1, 0.3, 1.0), 0.1);
    }

    #[test]
    fn test_fixed_steps_record_every_sample() {
        let sys = Decay { k: 1.0 };
        let y0 = DVector::from_element(1, 1.0);
        let t_eval: Vec<f64> = (0..15).map(|i| i as f64 * 0.07).collect();
        let opts = SolverOptions {
            method: Method::Rk4,
            first_step: Some(0.01),
            ..Default::default()
        };
        let sol = solve(&sys, (0.0, t_eval[14]), &y0, Some(&t_eval), &opts).unwrap();
        assert_eq!(sol.t, t_eval);
    }

    #[test]
    fn test_zero_length_span() {
        let sys = Decay { k: 1.0 };
        let y0 = DVector::from_element(1, 3.0);
        let sol = solve(&sys, (1.0, 1.0), &y0, Some(&[1.0, 1.0]), &SolverOptions::default()).unwrap();
        assert_eq!(sol.t, vec![1.0, 1.0]);
        assert_eq!(sol.stats.fn_evals, 0);
    }
}
