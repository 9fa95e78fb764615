use phyz_symbolic::Expr;

use crate::error::{ComponentFailure, GrError, Result};
use crate::metric::Metric;
use crate::tensor::{Components2, DIM, count_nonzero, iter2, zeros2};

/// G_μν = R_μν − ½ g_μν R, each component simplified on its own.
///
/// A component that fails to simplify does not stop the others; all
/// failures are returned together as [`GrError::ComponentFailures`].
pub fn einstein_tensor(metric: &Metric, ricci: &Components2, scalar: &Expr) -> Result<Components2> {
    let _span = tracing::debug_span!("einstein").entered();
    let half_r = Expr::rational(1, 2) * scalar.clone();
    let mut einstein = zeros2();
    let mut failures = Vec::new();
    for mu in 0..DIM {
        for nu in 0..DIM {
            let trace_term = if half_r.is_zero() {
                Expr::zero()
            } else {
                metric.component(mu, nu) * &half_r
            };
            match (&ricci[mu][nu] - &trace_term).simplify() {
                Ok(value) => einstein[mu][nu] = value,
                Err(source) => {
                    tracing::warn!(mu, nu, error = %source, "Einstein component failed");
                    failures.push(ComponentFailure { mu, nu, source });
                }
            }
        }
    }
    if !failures.is_empty() {
        return Err(GrError::ComponentFailures {
            stage: "einstein tensor",
            failures,
        });
    }
    tracing::debug!(
        stage = "einstein",
        nonzero = count_nonzero(iter2(&einstein)),
        "computed Einstein tensor"
    );
    Ok(einstein)
}
