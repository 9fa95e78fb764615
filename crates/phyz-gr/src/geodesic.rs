//! Numerical integration of the geodesic equation.
//!
//! The symbolic Christoffel symbols are compiled once into a numeric field
//! and handed to the adaptive Runge-Kutta solver as an 8-dimensional
//! first-order system in (x^λ, u^λ).

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::DVector;
use phyz_ode::{OdeSystem, SolveError, SolverOptions, solve};
use phyz_symbolic::CompiledExpr;
use serde::{Deserialize, Serialize};

use crate::christoffel::christoffel_symbols;
use crate::coords::CoordinateSystem;
use crate::definition::{ParameterValues, TensorDefinition};
use crate::error::{GrError, Result};
use crate::metric::Metric;
use crate::tensor::{Components3, DIM};

fn default_num_points() -> usize {
    200
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeodesicRequest {
    pub metric: TensorDefinition,
    #[serde(default)]
    pub parameters: ParameterValues,
    pub initial_position: [f64; DIM],
    pub initial_velocity: [f64; DIM],
    pub tau_span: [f64; 2],
    /// Output points. When absent, `num_points` are spread evenly over
    /// `tau_span`.
    #[serde(default)]
    pub tau_eval: Option<Vec<f64>>,
    #[serde(default = "default_num_points")]
    pub num_points: usize,
    #[serde(default)]
    pub solver: SolverOptions,
}

impl GeodesicRequest {
    pub fn new(
        metric: TensorDefinition,
        initial_position: [f64; DIM],
        initial_velocity: [f64; DIM],
        tau_span: [f64; 2],
    ) -> Self {
        Self {
            metric,
            parameters: ParameterValues::new(),
            initial_position,
            initial_velocity,
            tau_span,
            tau_eval: None,
            num_points: default_num_points(),
            solver: SolverOptions::default(),
        }
    }

    fn output_points(&self) -> Result<Vec<f64>> {
        let [t0, t1] = self.tau_span;
        if !(t0.is_finite() && t1.is_finite()) {
            return Err(GrError::Validation(format!(
                "tau_span must be finite, got [{t0}, {t1}]"
            )));
        }
        match &self.tau_eval {
            Some(points) if points.is_empty() => {
                Err(GrError::Validation("tau_eval must not be empty".into()))
            }
            Some(points) => Ok(points.clone()),
            None if self.num_points < 2 => Err(GrError::Validation(format!(
                "num_points must be at least 2, got {}",
                self.num_points
            ))),
            None => Ok(linspace(t0, t1, self.num_points)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeodesicReport {
    pub tau: Vec<f64>,
    pub coordinates: CoordinateSystem,
    pub positions: BTreeMap<String, Vec<f64>>,
    pub velocities: BTreeMap<String, Vec<f64>>,
    pub message: String,
}

/// Christoffel symbols compiled for evaluation at coordinate points.
#[derive(Debug, Clone)]
pub struct ChristoffelField {
    /// Non-zero components as (λ, μ, ν, Γ^λ_μν).
    entries: Vec<(usize, usize, usize, CompiledExpr)>,
}

impl ChristoffelField {
    pub fn compile(gamma: &Components3, coords: &CoordinateSystem) -> Result<Self> {
        let slots = coords.as_slots();
        let mut entries = Vec::new();
        for lam in 0..DIM {
            for mu in 0..DIM {
                for nu in 0..DIM {
                    let e = &gamma[lam][mu][nu];
                    if e.is_zero() {
                        continue;
                    }
                    let compiled = CompiledExpr::compile(e, &slots).map_err(GrError::computation(
                        "christoffel compilation",
                        format!("Γ^{lam}_{mu}{nu}"),
                    ))?;
                    entries.push((lam, mu, nu, compiled));
                }
            }
        }
        Ok(Self { entries })
    }

    /// All 64 components at `x`. Leaving the real domain is an error naming
    /// the point.
    pub fn evaluate(&self, x: &[f64]) -> Result<[[[f64; DIM]; DIM]; DIM]> {
        let mut out = [[[0.0; DIM]; DIM]; DIM];
        for (lam, mu, nu, f) in &self.entries {
            out[*lam][*mu][*nu] = f.eval(x).map_err(|e| {
                GrError::RuntimeComputation(format!(
                    "Christoffel symbol Γ^{lam}_{mu}{nu} cannot be evaluated at {x:?}: {e}"
                ))
            })?;
        }
        Ok(out)
    }
}

/// dx^λ/dτ = u^λ, du^λ/dτ = −Γ^λ_μν u^μ u^ν.
struct GeodesicSystem {
    field: ChristoffelField,
}

impl OdeSystem for GeodesicSystem {
    type Error = GrError;

    fn dim(&self) -> usize {
        2 * DIM
    }

    fn rhs(&self, _tau: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) -> Result<()> {
        let x = &y.as_slice()[..DIM];
        let u = &y.as_slice()[DIM..];
        let gamma = self.field.evaluate(x)?;
        for lam in 0..DIM {
            dydt[lam] = u[lam];
            let mut acc = 0.0;
            for mu in 0..DIM {
                for nu in 0..DIM {
                    acc += gamma[lam][mu][nu] * u[mu] * u[nu];
                }
            }
            dydt[DIM + lam] = -acc;
        }
        Ok(())
    }
}

/// Integrate a geodesic of the substituted metric.
pub fn integrate_geodesic(request: &GeodesicRequest) -> Result<GeodesicReport> {
    let _span = tracing::info_span!("geodesic").entered();
    let metric = Metric::from_definition(&request.metric)?.substitute_values(&request.parameters)?;
    let coords = metric.coordinates().clone();

    let unbound: BTreeSet<String> = metric
        .components()
        .iter()
        .flatten()
        .flat_map(|e| e.free_symbols())
        .filter(|s| !coords.contains(s))
        .collect();
    if !unbound.is_empty() {
        let names: Vec<String> = unbound.into_iter().collect();
        return Err(GrError::Validation(format!(
            "metric has free symbols without values: {}",
            names.join(", ")
        )));
    }
    let tau_eval = request.output_points()?;

    let inverse = metric.inverse()?;
    let gamma = christoffel_symbols(&metric, &inverse)?;
    let system = GeodesicSystem {
        field: ChristoffelField::compile(&gamma, &coords)?,
    };

    let y0 = DVector::from_iterator(
        2 * DIM,
        request
            .initial_position
            .iter()
            .chain(&request.initial_velocity)
            .copied(),
    );
    let [t0, t1] = request.tau_span;
    let solution = solve(&system, (t0, t1), &y0, Some(&tau_eval), &request.solver).map_err(
        |e| match e {
            SolveError::Rhs { source, .. } => source,
            SolveError::InvalidInput(msg) => GrError::Validation(msg),
            other => GrError::RuntimeComputation(format!("geodesic integration failed: {other}")),
        },
    )?;
    tracing::debug!(
        points = solution.len(),
        fn_evals = solution.stats.fn_evals,
        "geodesic integrated"
    );

    let mut positions = BTreeMap::new();
    let mut velocities = BTreeMap::new();
    for (i, name) in coords.names().iter().enumerate() {
        positions.insert(name.clone(), solution.component(i));
        velocities.insert(name.clone(), solution.component(DIM + i));
    }
    Ok(GeodesicReport {
        tau: solution.t,
        coordinates: coords,
        positions,
        velocities,
        message: "Geodesic calculated successfully.".to_owned(),
    })
}

/// `n` evenly spaced points from `a` to `b`, with the last exactly `b`.
pub(crate) fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let step = (b - a) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| a + step * i as f64).collect();
            out[n - 1] = b;
            out
        }
    }
}
