//! Christoffel symbols of the second kind.

use phyz_symbolic::Expr;

use crate::error::{GrError, Result};
use crate::metric::Metric;
use crate::tensor::{Components2, Components3, DIM, count_nonzero, iter3, zeros3};

/// Γ^λ_μν = ½ g^λρ (∂_μ g_ρν + ∂_ν g_ρμ − ∂_ρ g_μν).
///
/// All 64 first derivatives of the metric are taken once up front. Only
/// μ ≤ ν is computed; the other half is mirrored. Each component is
/// simplified once after the sum over ρ is assembled.
pub fn christoffel_symbols(metric: &Metric, inverse: &Components2) -> Result<Components3> {
    let _span = tracing::debug_span!("christoffel").entered();
    let coords = metric.coordinates();
    let g = metric.components();

    // dg[rho][mu][nu] = ∂_rho g_mu,nu
    let mut dg = zeros3();
    for (rho, plane) in dg.iter_mut().enumerate() {
        let var = coords.name(rho);
        for mu in 0..DIM {
            for nu in 0..DIM {
                if !g[mu][nu].is_zero() {
                    plane[mu][nu] = g[mu][nu].diff(var);
                }
            }
        }
    }

    let mut gamma = zeros3();
    for lam in 0..DIM {
        for mu in 0..DIM {
            for nu in mu..DIM {
                let mut terms = Vec::new();
                for rho in 0..DIM {
                    let g_inv = &inverse[lam][rho];
                    if g_inv.is_zero() {
                        continue;
                    }
                    let bracket = Expr::sum([
                        dg[mu][rho][nu].clone(),
                        dg[nu][rho][mu].clone(),
                        -dg[rho][mu][nu].clone(),
                    ]);
                    if bracket.is_zero() {
                        continue;
                    }
                    terms.push(Expr::product([g_inv.clone(), bracket]));
                }
                if terms.is_empty() {
                    continue;
                }
                let value = (Expr::rational(1, 2) * Expr::sum(terms))
                    .simplify()
                    .map_err(GrError::computation(
                        "christoffel",
                        format!("Γ^{lam}_{mu}{nu}"),
                    ))?;
                gamma[lam][nu][mu] = value.clone();
                gamma[lam][mu][nu] = value;
            }
        }
    }

    tracing::debug!(
        stage = "christoffel",
        nonzero = count_nonzero(iter3(&gamma)),
        "computed Christoffel symbols"
    );
    Ok(gamma)
}
