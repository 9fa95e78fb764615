//! Symbolic differentiation.
//!
//! Forward rules over the expression tree: linearity, the product rule over
//! n-ary products, the general power rule and the chain rule for every
//! [`Func`]. The result is not simplified.

use crate::expr::{Expr, Func};

impl Expr {
    /// Partial derivative with respect to the symbol `var`.
    pub fn diff(&self, var: &str) -> Expr {
        if !self.depends_on(var) {
            return Expr::zero();
        }
        match self {
            Expr::Num(_) => Expr::zero(),
            Expr::Sym(_) => Expr::one(),
            Expr::Add(terms) => Expr::sum(terms.iter().map(|t| t.diff(var))),
            Expr::Mul(factors) => {
                let mut terms = Vec::new();
                for (i, factor) in factors.iter().enumerate() {
                    let d = factor.diff(var);
                    if d.is_zero() {
                        continue;
                    }
                    let product = factors
                        .iter()
                        .enumerate()
                        .map(|(j, g)| if i == j { d.clone() } else { g.clone() });
                    terms.push(Expr::product(product));
                }
                Expr::sum(terms)
            }
            Expr::Pow(base, exp) => {
                let base = base.as_ref();
                let exp = exp.as_ref();
                match (base.depends_on(var), exp.depends_on(var)) {
                    (true, false) => {
                        // n * b^(n-1) * b'
                        Expr::product([
                            exp.clone(),
                            Expr::pow(base.clone(), exp.clone() - Expr::one()),
                            base.diff(var),
                        ])
                    }
                    (false, _) => {
                        // b^e * ln(b) * e'
                        Expr::product([self.clone(), Expr::ln(base.clone()), exp.diff(var)])
                    }
                    (true, true) => {
                        // b^e * (e' ln(b) + e b'/b)
                        let inner = Expr::sum([
                            Expr::product([exp.diff(var), Expr::ln(base.clone())]),
                            Expr::product([exp.clone(), base.diff(var), Expr::recip(base.clone())]),
                        ]);
                        Expr::product([self.clone(), inner])
                    }
                }
            }
            Expr::Func(func, arg) => {
                let a = arg.as_ref().clone();
                let outer = match func {
                    Func::Sin => Expr::cos(a),
                    Func::Cos => -Expr::sin(a),
                    Func::Tan => Expr::one() + Expr::powi(Expr::apply(Func::Tan, a), 2),
                    Func::Exp => Expr::exp(a),
                    Func::Log => Expr::recip(a),
                    Func::Sinh => Expr::apply(Func::Cosh, a),
                    Func::Cosh => Expr::apply(Func::Sinh, a),
                    Func::Tanh => Expr::one() - Expr::powi(Expr::apply(Func::Tanh, a), 2),
                    Func::Asin => {
                        Expr::pow(Expr::one() - Expr::powi(a, 2), Expr::rational(-1, 2))
                    }
                    Func::Acos => {
                        -Expr::pow(Expr::one() - Expr::powi(a, 2), Expr::rational(-1, 2))
                    }
                    Func::Atan => Expr::recip(Expr::one() + Expr::powi(a, 2)),
                };
                Expr::product([outer, arg.diff(var)])
            }
        }
    }
}
