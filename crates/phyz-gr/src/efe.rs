//! Verification of the Einstein field equations G_μν = κ T_μν.

use phyz_symbolic::Expr;
use serde::{Deserialize, Serialize};

use crate::definition::{TensorDefinition, parse_entry};
use crate::error::{GrError, Result};
use crate::metric::Metric;
use crate::pipeline::{Geometry, ensure_same_coordinates};
use crate::stress_energy::StressEnergyDefinition;
use crate::tensor::DIM;

fn default_coupling() -> String {
    "1".to_owned()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfeRequest {
    pub metric: TensorDefinition,
    pub stress_energy: StressEnergyDefinition,
    /// κ in G = κT, as an expression (e.g. `8*pi*G`).
    #[serde(default = "default_coupling")]
    pub coupling_constant: String,
}

impl EfeRequest {
    pub fn new(metric: TensorDefinition, stress_energy: StressEnergyDefinition) -> Self {
        Self {
            metric,
            stress_energy,
            coupling_constant: default_coupling(),
        }
    }
}

/// First component of G − κT that does not vanish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub mu: usize,
    pub nu: usize,
    pub residual: String,
    pub residual_latex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfeReport {
    pub verified: bool,
    pub message: String,
    pub mismatch: Option<Mismatch>,
}

/// Compute G from the metric and T from the stress-energy input, then check
/// that every component of G − κT simplifies to zero.
///
/// Residuals are scanned in row-major order and the first non-zero one is
/// reported.
pub fn verify_efe(request: &EfeRequest) -> Result<EfeReport> {
    let _span = tracing::info_span!("verify_efe", kind = request.stress_energy.kind()).entered();
    let metric = Metric::from_definition(&request.metric)?;
    ensure_same_coordinates(metric.coordinates(), &request.stress_energy.coordinates()?)?;
    let kappa = parse_entry(&request.coupling_constant, "coupling constant")?;
    let source = request.stress_energy.resolve()?;

    let geometry = Geometry::compute(&metric)?;
    let t = source.tensor(Some(metric.components()))?;

    let mut residuals = Vec::with_capacity(DIM * DIM);
    for mu in 0..DIM {
        for nu in 0..DIM {
            let d = Expr::sum([
                geometry.einstein[mu][nu].clone(),
                -(&kappa * &t[mu][nu]),
            ])
            .simplify()
            .map_err(GrError::computation("field equations", format!("({mu},{nu})")))?;
            residuals.push((mu, nu, d));
        }
    }

    let report = match residuals.into_iter().find(|(_, _, d)| !d.is_zero()) {
        None => EfeReport {
            verified: true,
            message: "EFEs satisfied.".to_owned(),
            mismatch: None,
        },
        Some((mu, nu, d)) => EfeReport {
            verified: false,
            message: format!("EFEs NOT satisfied. Mismatch found in component ({mu},{nu}): {d}"),
            mismatch: Some(Mismatch {
                mu,
                nu,
                residual: d.to_string(),
                residual_latex: d.to_latex(),
            }),
        },
    };
    tracing::debug!(verified = report.verified, "field equations checked");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_vacuum() {
        let req = EfeRequest::new(
            TensorDefinition::diagonal(["-1", "1", "1", "1"]),
            StressEnergyDefinition::vacuum(),
        );
        let report = verify_efe(&req).unwrap();
        assert!(report.verified);
        assert_eq!(report.message, "EFEs satisfied.");
    }

    #[test]
    fn test_flat_dust_reports_first_component() {
        let req = EfeRequest::new(
            TensorDefinition::diagonal(["-1", "1", "1", "1"]),
            StressEnergyDefinition::dust(),
        );
        let report = verify_efe(&req).unwrap();
        assert!(!report.verified);
        let mismatch = report.mismatch.unwrap();
        assert_eq!((mismatch.mu, mismatch.nu), (0, 0));
        let residual: Expr = mismatch.residual.parse().unwrap();
        assert_eq!(residual.simplify().unwrap(), (-Expr::symbol("rho")).simplify().unwrap());
        assert_eq!(
            report.message,
            format!("EFEs NOT satisfied. Mismatch found in component (0,0): {}", mismatch.residual)
        );
    }

    #[test]
    fn test_coordinate_mismatch() {
        let req = EfeRequest {
            metric: TensorDefinition::diagonal(["-1", "1", "1", "1"]),
            stress_energy: StressEnergyDefinition::Vacuum {
                coordinates: ["t", "x", "y", "z"].map(str::to_owned).into(),
            },
            coupling_constant: "8*pi".into(),
        };
        assert!(matches!(verify_efe(&req), Err(GrError::Validation(_))));
    }

    #[test]
    fn test_request_defaults() {
        let req: EfeRequest = serde_json::from_str(
            r#"{"metric": {"components": [["-1","0","0","0"],["0","1","0","0"],["0","0","1","0"],["0","0","0","1"]]},
                "stress_energy": {"kind": "vacuum"}}"#,
        )
        .unwrap();
        assert_eq!(req.coupling_constant, "1");
    }
}
