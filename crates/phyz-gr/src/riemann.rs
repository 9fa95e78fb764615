//! Riemann curvature tensor.

use phyz_symbolic::Expr;

use crate::coords::CoordinateSystem;
use crate::error::{GrError, Result};
use crate::tensor::{Components3, Components4, DIM, count_nonzero, iter4, zeros3, zeros4};

/// R^ρ_σμν = ∂_μ Γ^ρ_νσ − ∂_ν Γ^ρ_μσ + Γ^ρ_μλ Γ^λ_νσ − Γ^ρ_νλ Γ^λ_μσ.
///
/// Derivatives of Γ are taken once. Components with μ < ν are assembled and
/// simplified; μ > ν follows by antisymmetry and μ = ν is zero.
pub fn riemann_tensor(coords: &CoordinateSystem, gamma: &Components3) -> Result<Components4> {
    let _span = tracing::debug_span!("riemann").entered();

    // dgamma[alpha][rho][a][b] = ∂_alpha Γ^rho_ab
    let mut dgamma: [Components3; DIM] = std::array::from_fn(|_| zeros3());
    for (alpha, block) in dgamma.iter_mut().enumerate() {
        let var = coords.name(alpha);
        for rho in 0..DIM {
            for a in 0..DIM {
                for b in a..DIM {
                    let g = &gamma[rho][a][b];
                    if g.is_zero() {
                        continue;
                    }
                    let d = g.diff(var);
                    block[rho][b][a] = d.clone();
                    block[rho][a][b] = d;
                }
            }
        }
    }

    let mut riemann = zeros4();
    for rho in 0..DIM {
        for sigma in 0..DIM {
            for mu in 0..DIM {
                for nu in (mu + 1)..DIM {
                    let mut terms = vec![
                        dgamma[mu][rho][nu][sigma].clone(),
                        -dgamma[nu][rho][mu][sigma].clone(),
                    ];
                    for lam in 0..DIM {
                        let (a, b) = (&gamma[rho][mu][lam], &gamma[lam][nu][sigma]);
                        if !a.is_zero() && !b.is_zero() {
                            terms.push(a * b);
                        }
                        let (c, d) = (&gamma[rho][nu][lam], &gamma[lam][mu][sigma]);
                        if !c.is_zero() && !d.is_zero() {
                            terms.push(-(c * d));
                        }
                    }
                    let value = Expr::sum(terms).simplify().map_err(GrError::computation(
                        "riemann",
                        format!("R^{rho}_{sigma}{mu}{nu}"),
                    ))?;
                    if value.is_zero() {
                        continue;
                    }
                    riemann[rho][sigma][nu][mu] = (-value.clone())
                        .simplify()
                        .map_err(GrError::computation(
                            "riemann",
                            format!("R^{rho}_{sigma}{nu}{mu}"),
                        ))?;
                    riemann[rho][sigma][mu][nu] = value;
                }
            }
        }
    }

    tracing::debug!(
        stage = "riemann",
        nonzero = count_nonzero(iter4(&riemann)),
        "computed Riemann tensor"
    );
    Ok(riemann)
}
