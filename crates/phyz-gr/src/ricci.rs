use phyz_symbolic::Expr;

use crate::error::{GrError, Result};
use crate::tensor::{Components2, Components4, DIM, count_nonzero, iter2, zeros2};

/// R_μν = R^ρ_μρν.
pub fn ricci_tensor(riemann: &Components4) -> Result<Components2> {
    let _span = tracing::debug_span!("ricci_tensor").entered();
    let mut ricci = zeros2();
    for mu in 0..DIM {
        for nu in 0..DIM {
            let trace = Expr::sum((0..DIM).map(|rho| riemann[rho][mu][rho][nu].clone()));
            ricci[mu][nu] = trace
                .simplify()
                .map_err(GrError::computation("ricci tensor", format!("R_{mu}{nu}")))?;
        }
    }
    tracing::debug!(
        stage = "ricci_tensor",
        nonzero = count_nonzero(iter2(&ricci)),
        "computed Ricci tensor"
    );
    Ok(ricci)
}

/// R = g^μν R_μν.
pub fn ricci_scalar(inverse: &Components2, ricci: &Components2) -> Result<Expr> {
    let mut terms = Vec::new();
    for mu in 0..DIM {
        for nu in 0..DIM {
            let (g, r) = (&inverse[mu][nu], &ricci[mu][nu]);
            if !g.is_zero() && !r.is_zero() {
                terms.push(g * r);
            }
        }
    }
    let scalar = Expr::sum(terms)
        .simplify()
        .map_err(GrError::computation("ricci scalar", "R"))?;
    tracing::debug!(stage = "ricci_scalar", zero = scalar.is_zero(), "computed Ricci scalar");
    Ok(scalar)
}
