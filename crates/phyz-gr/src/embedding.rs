//! Flamm's paraboloid: embedding the equatorial slice of a static,
//! spherically symmetric metric as a surface of revolution z(r).
//!
//! z(r) = ∫ sqrt(g_rr − 1) dr, with the constant chosen so that z → 0 as
//! r → ∞ when that limit is finite.

use std::f64::consts::PI;

use num_complex::Complex64;
use phyz_symbolic::{Antiderivative, CompiledExpr, Expr, Limit, integrate, limit_at_infinity};
use serde::{Deserialize, Serialize};

use crate::definition::{ParameterValues, TensorDefinition};
use crate::error::{GrError, Result};
use crate::geodesic::linspace;
use crate::metric::Metric;

const RADIAL: &str = "r";

fn default_r_max() -> f64 {
    10.0
}

fn default_num_points_r() -> usize {
    50
}

fn default_num_points_phi() -> usize {
    60
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub metric: TensorDefinition,
    #[serde(default)]
    pub parameters: ParameterValues,
    /// Lower sampling bound. Defaults to just outside r = 2M when a positive
    /// `M` is supplied, else 0.1.
    #[serde(default)]
    pub r_min: Option<f64>,
    #[serde(default = "default_r_max")]
    pub r_max: f64,
    #[serde(default = "default_num_points_r")]
    pub num_points_r: usize,
    #[serde(default = "default_num_points_phi")]
    pub num_points_phi: usize,
}

impl EmbeddingRequest {
    pub fn new(metric: TensorDefinition) -> Self {
        Self {
            metric,
            parameters: ParameterValues::new(),
            r_min: None,
            r_max: default_r_max(),
            num_points_r: default_num_points_r(),
            num_points_phi: default_num_points_phi(),
        }
    }

    fn r_min(&self) -> f64 {
        self.r_min.unwrap_or_else(|| match self.parameters.get("M") {
            Some(&m) if m > 0.0 => 2.0 * m * 1.01,
            _ => 0.1,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStatus {
    /// z(r) found and normalized to vanish at infinity.
    Solved,
    /// z(r) found, but the integration constant could not be fixed and was
    /// set to zero.
    Degraded,
    /// The metric is not of the form the embedding applies to.
    Unsuitable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingReport {
    pub status: EmbeddingStatus,
    /// LaTeX of z(r).
    pub z_function: Option<String>,
    pub message: String,
    pub r_values: Option<Vec<f64>>,
    pub z_values: Option<Vec<f64>>,
    /// Surface grids, one row per φ sample and one column per r sample.
    pub x_surface: Option<Vec<Vec<f64>>>,
    pub y_surface: Option<Vec<Vec<f64>>>,
    pub z_surface: Option<Vec<Vec<f64>>>,
}

impl EmbeddingReport {
    fn unsuitable(message: String) -> Self {
        Self {
            status: EmbeddingStatus::Unsuitable,
            z_function: None,
            message,
            r_values: None,
            z_values: None,
            x_surface: None,
            y_surface: None,
            z_surface: None,
        }
    }
}

/// Symbolic z(r) for a metric and how its constant was fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct FlammEmbedding {
    pub z: Expr,
    pub status: EmbeddingStatus,
}

/// Compute z(r) for an already substituted metric.
///
/// Returns `Ok(Err(reason))` when the metric is unsuitable.
pub fn flamm_embedding(metric: &Metric) -> Result<std::result::Result<FlammEmbedding, String>> {
    let coords = metric.coordinates();
    let Some(r) = coords.index_of(RADIAL) else {
        return Ok(Err("Coordinates must include 'r'.".to_owned()));
    };
    let g_rr = metric.component(r, r);
    let others: Vec<&str> = coords
        .names()
        .iter()
        .map(String::as_str)
        .filter(|c| *c != RADIAL && g_rr.depends_on(c))
        .collect();
    if !others.is_empty() {
        return Ok(Err(format!(
            "Metric component g_rr depends on coordinates other than r: {}. Cannot compute Flamm's paraboloid simply.",
            others.join(", ")
        )));
    }

    let integrand = Expr::sqrt(g_rr - &Expr::one())
        .simplify()
        .map_err(GrError::computation("embedding", "sqrt(g_rr - 1)"))?;
    let antiderivative = match integrate(&integrand, RADIAL)
        .map_err(GrError::computation("integration", integrand.to_string()))?
    {
        Antiderivative::Closed(f) => f,
        Antiderivative::Unevaluated { integrand } => {
            return Err(GrError::IntegrationFailed {
                integrand: integrand.to_string(),
            });
        }
    };

    let embedding = match limit_at_infinity(&antiderivative, RADIAL) {
        Ok(Limit::Finite(c)) => FlammEmbedding {
            z: (antiderivative - c)
                .simplify()
                .map_err(GrError::computation("embedding", "z(r) - z(∞)"))?,
            status: EmbeddingStatus::Solved,
        },
        Ok(other) => {
            tracing::warn!(limit = ?other, "z(r) has no finite limit at infinity; integration constant set to 0");
            FlammEmbedding {
                z: antiderivative,
                status: EmbeddingStatus::Degraded,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "limit of z(r) at infinity failed; integration constant set to 0");
            FlammEmbedding {
                z: antiderivative,
                status: EmbeddingStatus::Degraded,
            }
        }
    };
    Ok(Ok(embedding))
}

/// Compute z(r) and, when it depends on r alone, sample it and its surface
/// of revolution.
pub fn solve_embedding(request: &EmbeddingRequest) -> Result<EmbeddingReport> {
    let _span = tracing::info_span!("embedding").entered();
    if request.num_points_r < 2 || request.num_points_phi < 2 {
        return Err(GrError::Validation(format!(
            "num_points_r and num_points_phi must be at least 2, got {} and {}",
            request.num_points_r, request.num_points_phi
        )));
    }
    let metric = Metric::from_definition(&request.metric)?.substitute_values(&request.parameters)?;
    let embedding = match flamm_embedding(&metric)? {
        Ok(e) => e,
        Err(reason) => return Ok(EmbeddingReport::unsuitable(reason)),
    };

    let mut report = EmbeddingReport {
        status: embedding.status,
        z_function: Some(embedding.z.to_latex()),
        message: "Flamm's paraboloid embedding function z(r) calculated successfully.".to_owned(),
        r_values: None,
        z_values: None,
        x_surface: None,
        y_surface: None,
        z_surface: None,
    };
    if embedding.status == EmbeddingStatus::Degraded {
        report
            .message
            .push_str(" (Warning: z(r) has no finite limit as r -> infinity; integration constant set to 0)");
    }

    let extra: Vec<String> = embedding
        .z
        .free_symbols()
        .into_iter()
        .filter(|s| s != RADIAL)
        .collect();
    if !extra.is_empty() {
        report.message.push_str(&format!(
            " (Warning: Cannot evaluate numerically due to symbols: {})",
            extra.join(", ")
        ));
        return Ok(report);
    }

    let (r_min, r_max) = (request.r_min(), request.r_max);
    if r_min >= r_max {
        report
            .message
            .push_str(" (Numerical evaluation skipped: r_min >= r_max)");
        return Ok(report);
    }

    let z_fn = CompiledExpr::compile(&embedding.z, &[RADIAL])
        .map_err(GrError::computation("embedding compilation", "z(r)"))?;
    let r_values = linspace(r_min, r_max, request.num_points_r);
    let mut had_complex = false;
    let z_values: Vec<f64> = r_values
        .iter()
        .map(|&r| {
            let z = z_fn.eval_complex(&[Complex64::new(r, 0.0)]);
            if z.im.abs() > 1e-12 {
                had_complex = true;
            }
            z.re
        })
        .collect();
    if had_complex {
        tracing::warn!("complex values in z(r); keeping the real part");
        report
            .message
            .push_str(" (Warning: complex values of z(r) were truncated to their real part)");
    }

    let phi_values = linspace(0.0, 2.0 * PI, request.num_points_phi);
    let grid = |f: &dyn Fn(f64, f64, f64) -> f64| -> Vec<Vec<f64>> {
        phi_values
            .iter()
            .map(|&phi| {
                r_values
                    .iter()
                    .zip(&z_values)
                    .map(|(&r, &z)| f(r, phi, z))
                    .collect()
            })
            .collect()
    };
    report.x_surface = Some(grid(&|r: f64, phi: f64, _z: f64| r * phi.cos()));
    report.y_surface = Some(grid(&|r: f64, phi: f64, _z: f64| r * phi.sin()));
    report.z_surface = Some(grid(&|_r: f64, _phi: f64, z: f64| z));
    report.message.push_str(&format!(
        " Numerical data generated for r in [{r_min:.2}, {r_max:.2}]."
    ));
    report.r_values = Some(r_values);
    report.z_values = Some(z_values);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_r_min() {
        let mut req = EmbeddingRequest::new(TensorDefinition::diagonal(["-1", "1", "1", "1"]));
        assert_eq!(req.r_min(), 0.1);
        req.parameters.insert("M".into(), 1.0);
        assert!((req.r_min() - 2.02).abs() < 1e-12);
        req.r_min = Some(3.0);
        assert_eq!(req.r_min(), 3.0);
    }

    #[test]
    fn test_flat_space_is_a_plane() {
        let req = EmbeddingRequest::new(TensorDefinition::diagonal([
            "-1",
            "1",
            "r**2",
            "r**2*sin(theta)**2",
        ]));
        let report = solve_embedding(&req).unwrap();
        assert_eq!(report.status, EmbeddingStatus::Solved);
        assert!(report.z_values.unwrap().iter().all(|z| *z == 0.0));
    }

    #[test]
    fn test_missing_radial_coordinate() {
        let mut def = TensorDefinition::diagonal(["-1", "1", "1", "1"]);
        def.coordinates = ["t", "x", "y", "z"].map(str::to_owned).into();
        let report = solve_embedding(&EmbeddingRequest::new(def)).unwrap();
        assert_eq!(report.status, EmbeddingStatus::Unsuitable);
        assert_eq!(report.message, "Coordinates must include 'r'.");
        assert!(report.z_function.is_none());
    }

    #[test]
    fn test_skips_sampling_when_range_is_empty() {
        let mut req = EmbeddingRequest::new(TensorDefinition::diagonal([
            "-(1 - 2*M/r)",
            "1/(1 - 2*M/r)",
            "r**2",
            "r**2*sin(theta)**2",
        ]));
        req.parameters.insert("M".into(), 1.0);
        req.r_min = Some(12.0);
        let report = solve_embedding(&req).unwrap();
        assert!(report.message.ends_with("(Numerical evaluation skipped: r_min >= r_max)"));
        assert!(report.r_values.is_none());
    }
}
