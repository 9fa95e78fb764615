//! LaTeX rendering of tensor components keyed by index strings.
//!
//! Rank-2 maps are dense. Rank-3 and rank-4 maps omit zero components.

use std::collections::BTreeMap;

use phyz_symbolic::Expr;

use crate::tensor::{Components2, Components3, Components4};

/// All 16 entries, keyed `"ij"`.
pub fn format_rank2(t: &Components2) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (i, row) in t.iter().enumerate() {
        for (j, e) in row.iter().enumerate() {
            out.insert(format!("{i}{j}"), e.to_latex());
        }
    }
    out
}

/// Non-zero Γ^λ_μν keyed `"λ_μν"`.
pub fn format_christoffel(t: &Components3) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (lam, plane) in t.iter().enumerate() {
        for (mu, row) in plane.iter().enumerate() {
            for (nu, e) in row.iter().enumerate() {
                if !e.is_zero() {
                    out.insert(format!("{lam}_{mu}{nu}"), e.to_latex());
                }
            }
        }
    }
    out
}

/// Non-zero R^ρ_σμν keyed `"ρ_σμν"`.
pub fn format_riemann(t: &Components4) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (rho, block) in t.iter().enumerate() {
        for (sigma, plane) in block.iter().enumerate() {
            for (mu, row) in plane.iter().enumerate() {
                for (nu, e) in row.iter().enumerate() {
                    if !e.is_zero() {
                        out.insert(format!("{rho}_{sigma}{mu}{nu}"), e.to_latex());
                    }
                }
            }
        }
    }
    out
}

pub fn format_scalar(e: &Expr) -> String {
    e.to_latex()
}
