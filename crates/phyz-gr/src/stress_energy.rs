//! Stress-energy tensors: explicit components, vacuum, dust and perfect fluid.

use phyz_symbolic::Expr;
use serde::{Deserialize, Serialize};

use crate::coords::{CoordinateSystem, default_coordinates};
use crate::definition::{parse_entry, parse_grid};
use crate::error::{GrError, Result};
use crate::tensor::{Components2, DIM, zeros2};

fn default_density() -> String {
    "rho".to_owned()
}

fn default_pressure() -> String {
    "p".to_owned()
}

fn default_four_velocity() -> Vec<String> {
    ["-1", "0", "0", "0"].map(str::to_owned).into()
}

/// Stress-energy input, discriminated by `"kind"`.
///
/// The four-velocity is given with lower indices and is used as supplied;
/// it is not normalized against any metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StressEnergyDefinition {
    Components {
        #[serde(default = "default_coordinates", alias = "coords")]
        coordinates: Vec<String>,
        components: Vec<Vec<String>>,
    },
    Vacuum {
        #[serde(default = "default_coordinates", alias = "coords")]
        coordinates: Vec<String>,
    },
    Dust {
        #[serde(default = "default_coordinates", alias = "coords")]
        coordinates: Vec<String>,
        #[serde(default = "default_density")]
        density: String,
        #[serde(default = "default_four_velocity")]
        four_velocity: Vec<String>,
    },
    PerfectFluid {
        #[serde(default = "default_coordinates", alias = "coords")]
        coordinates: Vec<String>,
        #[serde(default = "default_density")]
        density: String,
        #[serde(default = "default_pressure")]
        pressure: String,
        #[serde(default = "default_four_velocity")]
        four_velocity: Vec<String>,
    },
}

impl StressEnergyDefinition {
    pub fn vacuum() -> Self {
        StressEnergyDefinition::Vacuum {
            coordinates: default_coordinates(),
        }
    }

    pub fn dust() -> Self {
        StressEnergyDefinition::Dust {
            coordinates: default_coordinates(),
            density: default_density(),
            four_velocity: default_four_velocity(),
        }
    }

    pub fn perfect_fluid() -> Self {
        StressEnergyDefinition::PerfectFluid {
            coordinates: default_coordinates(),
            density: default_density(),
            pressure: default_pressure(),
            four_velocity: default_four_velocity(),
        }
    }

    /// Parse a JSON document. Unknown kinds and missing fields are
    /// validation errors.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| GrError::Validation(format!("invalid stress-energy definition: {e}")))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StressEnergyDefinition::Components { .. } => "components",
            StressEnergyDefinition::Vacuum { .. } => "vacuum",
            StressEnergyDefinition::Dust { .. } => "dust",
            StressEnergyDefinition::PerfectFluid { .. } => "perfect_fluid",
        }
    }

    pub fn coordinates(&self) -> Result<CoordinateSystem> {
        let names = match self {
            StressEnergyDefinition::Components { coordinates, .. }
            | StressEnergyDefinition::Vacuum { coordinates }
            | StressEnergyDefinition::Dust { coordinates, .. }
            | StressEnergyDefinition::PerfectFluid { coordinates, .. } => coordinates,
        };
        CoordinateSystem::new(names)
    }

    pub fn requires_metric(&self) -> bool {
        matches!(self, StressEnergyDefinition::PerfectFluid { .. })
    }

    /// Parse every expression string once.
    pub fn resolve(&self) -> Result<StressEnergy> {
        Ok(match self {
            StressEnergyDefinition::Components { components, .. } => {
                StressEnergy::Components(parse_grid(components, "stress-energy")?)
            }
            StressEnergyDefinition::Vacuum { .. } => StressEnergy::Vacuum,
            StressEnergyDefinition::Dust {
                density,
                four_velocity,
                ..
            } => StressEnergy::Dust {
                density: parse_entry(density, "density")?,
                four_velocity: parse_four_velocity(four_velocity)?,
            },
            StressEnergyDefinition::PerfectFluid {
                density,
                pressure,
                four_velocity,
                ..
            } => StressEnergy::PerfectFluid {
                density: parse_entry(density, "density")?,
                pressure: parse_entry(pressure, "pressure")?,
                four_velocity: parse_four_velocity(four_velocity)?,
            },
        })
    }
}

fn parse_four_velocity(items: &[String]) -> Result<[Expr; DIM]> {
    if items.len() != DIM {
        return Err(GrError::Validation(format!(
            "four_velocity must have {DIM} components, got {}",
            items.len()
        )));
    }
    let mut out: [Expr; DIM] = std::array::from_fn(|_| Expr::zero());
    for (i, text) in items.iter().enumerate() {
        out[i] = parse_entry(text, &format!("four_velocity component {i}"))?;
    }
    Ok(out)
}

/// A resolved stress-energy source.
#[derive(Debug, Clone, PartialEq)]
pub enum StressEnergy {
    Components(Components2),
    Vacuum,
    /// T_μν = ρ u_μ u_ν
    Dust { density: Expr, four_velocity: [Expr; DIM] },
    /// T_μν = (ρ + p) u_μ u_ν + p g_μν
    PerfectFluid {
        density: Expr,
        pressure: Expr,
        four_velocity: [Expr; DIM],
    },
}

impl StressEnergy {
    /// Build T_μν. `metric` is required for the perfect fluid and ignored
    /// otherwise.
    pub fn tensor(&self, metric: Option<&Components2>) -> Result<Components2> {
        let _span = tracing::debug_span!("stress_energy").entered();
        let raw = match self {
            StressEnergy::Components(t) => t.clone(),
            StressEnergy::Vacuum => zeros2(),
            StressEnergy::Dust {
                density,
                four_velocity: u,
            } => outer(density, u),
            StressEnergy::PerfectFluid {
                density,
                pressure,
                four_velocity: u,
            } => {
                let g = metric.ok_or_else(|| {
                    GrError::Validation("perfect fluid stress-energy requires a metric".into())
                })?;
                let mut t = outer(&(density + pressure), u);
                for mu in 0..DIM {
                    for nu in 0..DIM {
                        if !g[mu][nu].is_zero() {
                            t[mu][nu] = &t[mu][nu] + &(pressure * &g[mu][nu]);
                        }
                    }
                }
                t
            }
        };
        let mut out = zeros2();
        for mu in 0..DIM {
            for nu in 0..DIM {
                out[mu][nu] = raw[mu][nu]
                    .simplify()
                    .map_err(GrError::computation("stress-energy", format!("T_{mu}{nu}")))?;
            }
        }
        Ok(out)
    }
}

/// scale · u_μ u_ν
fn outer(scale: &Expr, u: &[Expr; DIM]) -> Components2 {
    let mut t = zeros2();
    for mu in 0..DIM {
        for nu in 0..DIM {
            if !u[mu].is_zero() && !u[nu].is_zero() {
                t[mu][nu] = Expr::product([scale.clone(), u[mu].clone(), u[nu].clone()]);
            }
        }
    }
    t
}
