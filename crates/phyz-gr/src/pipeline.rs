//! End-to-end geometry and stress-energy computations on serde inputs.

use std::collections::BTreeMap;

use phyz_symbolic::Expr;
use serde::Serialize;

use crate::christoffel::christoffel_symbols;
use crate::coords::CoordinateSystem;
use crate::definition::TensorDefinition;
use crate::einstein::einstein_tensor;
use crate::error::{GrError, Result};
use crate::format::{format_christoffel, format_rank2, format_riemann, format_scalar};
use crate::metric::Metric;
use crate::ricci::{ricci_scalar, ricci_tensor};
use crate::riemann::riemann_tensor;
use crate::stress_energy::StressEnergyDefinition;
use crate::tensor::{Components2, Components3, Components4};

/// Every curvature quantity derived from one metric.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub metric: Metric,
    pub inverse: Components2,
    pub christoffel: Components3,
    pub riemann: Components4,
    pub ricci_tensor: Components2,
    pub ricci_scalar: Expr,
    pub einstein: Components2,
}

impl Geometry {
    /// Run metric → inverse → Γ → Riemann → Ricci → Einstein.
    pub fn compute(metric: &Metric) -> Result<Self> {
        let _span = tracing::info_span!("geometry", coordinates = %metric.coordinates()).entered();
        let inverse = metric.inverse()?;
        let christoffel = christoffel_symbols(metric, &inverse)?;
        let riemann = riemann_tensor(metric.coordinates(), &christoffel)?;
        let ricci = ricci_tensor(&riemann)?;
        let scalar = ricci_scalar(&inverse, &ricci)?;
        let einstein = einstein_tensor(metric, &ricci, &scalar)?;
        Ok(Self {
            metric: metric.clone(),
            inverse,
            christoffel,
            riemann,
            ricci_tensor: ricci,
            ricci_scalar: scalar,
            einstein,
        })
    }

    pub fn report(&self) -> GeometryReport {
        GeometryReport {
            coordinates: self.metric.coordinates().clone(),
            metric: format_rank2(self.metric.components()),
            inverse_metric: format_rank2(&self.inverse),
            christoffel: format_christoffel(&self.christoffel),
            riemann: format_riemann(&self.riemann),
            ricci_tensor: format_rank2(&self.ricci_tensor),
            ricci_scalar: format_scalar(&self.ricci_scalar),
            einstein_tensor: format_rank2(&self.einstein),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryReport {
    pub coordinates: CoordinateSystem,
    pub metric: BTreeMap<String, String>,
    pub inverse_metric: BTreeMap<String, String>,
    pub christoffel: BTreeMap<String, String>,
    pub riemann: BTreeMap<String, String>,
    pub ricci_tensor: BTreeMap<String, String>,
    pub ricci_scalar: String,
    pub einstein_tensor: BTreeMap<String, String>,
}

pub fn compute_geometry(def: &TensorDefinition) -> Result<GeometryReport> {
    let metric = Metric::from_definition(def)?;
    Ok(Geometry::compute(&metric)?.report())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressEnergyReport {
    pub kind: &'static str,
    pub coordinates: CoordinateSystem,
    pub stress_energy_tensor: BTreeMap<String, String>,
}

/// Build T_μν. The metric is only consulted for the perfect fluid, and its
/// coordinates must then match.
pub fn compute_stress_energy(
    def: &StressEnergyDefinition,
    metric: Option<&TensorDefinition>,
) -> Result<StressEnergyReport> {
    let coordinates = def.coordinates()?;
    let resolved = def.resolve()?;
    let metric = match metric {
        Some(m) if def.requires_metric() => Some(Metric::from_definition(m)?),
        _ => None,
    };
    if let Some(m) = &metric {
        ensure_same_coordinates(m.coordinates(), &coordinates)?;
    }
    let tensor = resolved.tensor(metric.as_ref().map(Metric::components))?;
    Ok(StressEnergyReport {
        kind: def.kind(),
        coordinates,
        stress_energy_tensor: format_rank2(&tensor),
    })
}

pub(crate) fn ensure_same_coordinates(metric: &CoordinateSystem, other: &CoordinateSystem) -> Result<()> {
    if metric != other {
        return Err(GrError::Validation(format!(
            "coordinate mismatch: metric uses {metric}, stress-energy uses {other}"
        )));
    }
    Ok(())
}
