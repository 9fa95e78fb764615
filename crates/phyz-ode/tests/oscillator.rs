use std::convert::Infallible;
use std::f64::consts::PI;

use approx::assert_abs_diff_eq;
use nalgebra::DVector;
use phyz_ode::{Method, OdeSystem, SolverOptions, solve};

/// Planar Kepler problem with unit gravitational parameter.
struct Kepler;

impl OdeSystem for Kepler {
    type Error = Infallible;

    fn dim(&self) -> usize {
        4
    }

    fn rhs(&self, _t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) -> Result<(), Infallible> {
        let r3 = (y[0] * y[0] + y[1] * y[1]).powf(1.5);
        dydt[0] = y[2];
        dydt[1] = y[3];
        dydt[2] = -y[0] / r3;
        dydt[3] = -y[1] / r3;
        Ok(())
    }
}

fn energy(y: &DVector<f64>) -> f64 {
    0.5 * (y[2] * y[2] + y[3] * y[3]) - 1.0 / (y[0] * y[0] + y[1] * y[1]).sqrt()
}

#[test]
fn circular_orbit_closes_after_one_period() {
    let y0 = DVector::from_vec(vec![1.0, 0.0, 0.0, 1.0]);
    let t_eval: Vec<f64> = (0..=8).map(|i| i as f64 * PI / 4.0).collect();
    for method in [Method::Rk45, Method::Rkf45] {
        let opts = SolverOptions::default()
            .with_method(method)
            .with_tolerances(1e-10, 1e-12);
        let sol = solve(&Kepler, (0.0, 2.0 * PI), &y0, Some(&t_eval), &opts).unwrap();
        assert_eq!(sol.len(), t_eval.len());
        let last = sol.y.last().unwrap();
        assert_abs_diff_eq!(last[0], 1.0, epsilon = 1e-7);
        assert_abs_diff_eq!(last[1], 0.0, epsilon = 1e-7);
        for y in &sol.y {
            assert_abs_diff_eq!(energy(y), -0.5, epsilon = 1e-8);
        }
        assert!(sol.stats.rejected_steps <= sol.stats.accepted_steps);
    }
}

#[test]
fn eccentric_orbit_conserves_energy() {
    let y0 = DVector::from_vec(vec![1.0, 0.0, 0.0, 1.2]);
    let e0 = energy(&y0);
    let opts = SolverOptions::default().with_tolerances(1e-10, 1e-12);
    let sol = solve(&Kepler, (0.0, 20.0), &y0, None, &opts).unwrap();
    let x = sol.component(0);
    assert!(x.iter().any(|&v| v < 0.0));
    for y in &sol.y {
        assert_abs_diff_eq!(energy(y), e0, epsilon = 1e-6);
    }
}
