//! Public simplification entry points built on the rational normal form.

use num_complex::Complex64;

use crate::compile::CompiledExpr;
use crate::error::Result;
use crate::expr::Expr;
use crate::normal::Normal;

/// Outcome of deciding whether an expression is identically zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroTest {
    Zero,
    NonZero,
    /// The normal form is non-zero but contains compositions it cannot
    /// canonicalize, and numeric probing found no witness either way.
    Undecided,
}

/// Sample points used to probe expressions that escape the normal form.
const PROBES: [f64; 3] = [0.731, 1.618, 2.279];

impl Expr {
    /// Bring the expression into canonical rational form.
    ///
    /// The result is structurally stable: simplifying it again returns an
    /// identical tree, and two expressions that differ only by the modelled
    /// identities simplify to the same tree.
    pub fn simplify(&self) -> Result<Expr> {
        Ok(Normal::from_expr(self)?.to_expr())
    }

    /// Decide whether the expression is identically zero.
    pub fn zero_test(&self) -> Result<ZeroTest> {
        let normal = Normal::from_expr(self)?;
        if normal.is_zero() {
            return Ok(ZeroTest::Zero);
        }
        let reduced = normal.to_expr();
        if !reduced.contains_inverse_composition() {
            return Ok(ZeroTest::NonZero);
        }
        let names: Vec<String> = reduced.free_symbols().into_iter().collect();
        let slots: Vec<&str> = names.iter().map(String::as_str).collect();
        let compiled = CompiledExpr::compile(&reduced, &slots)?;
        for (i, base) in PROBES.iter().enumerate() {
            let args: Vec<Complex64> = (0..slots.len())
                .map(|j| Complex64::new(base + 0.113 * (i + j) as f64, 0.0))
                .collect();
            let value = compiled.eval_complex(&args);
            if value.is_finite() && value.norm() > 1e-9 {
                return Ok(ZeroTest::NonZero);
            }
        }
        Ok(ZeroTest::Undecided)
    }
}
