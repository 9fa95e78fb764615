//! Indefinite integration for the shapes that occur in embedding problems.
//!
//! The integrand is simplified first and then matched against a small rule
//! table: linearity, powers of a linear form, radicals of `C·L^k` with `L`
//! linear, and elementary functions of a linear argument. Anything else is
//! returned unevaluated so callers can report it instead of guessing.

use std::collections::BTreeMap;

use num_traits::{One, Signed};

use crate::error::Result;
use crate::expr::{Expr, Func, Rational};
use crate::normal::Normal;
use crate::poly::Poly;

/// Result of [`integrate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Antiderivative {
    /// A closed-form antiderivative, simplified, without integration constant.
    Closed(Expr),
    /// No rule applied. Holds the simplified integrand.
    Unevaluated { integrand: Expr },
}

impl Antiderivative {
    pub fn closed(self) -> Option<Expr> {
        match self {
            Antiderivative::Closed(e) => Some(e),
            Antiderivative::Unevaluated { .. } => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Antiderivative::Closed(_))
    }
}

/// Antiderivative of `expr` with respect to `var`.
///
/// Radicands of the form `C·L^k` are rewritten so that the coefficient of
/// `var` in `L` is positive, which keeps results real on the side of the
/// branch point where the integrand itself is real.
pub fn integrate(expr: &Expr, var: &str) -> Result<Antiderivative> {
    let integrand = expr.simplify()?;
    match antiderivative(&integrand, var)? {
        Some(result) => Ok(Antiderivative::Closed(result.simplify()?)),
        None => Ok(Antiderivative::Unevaluated { integrand }),
    }
}

fn antiderivative(e: &Expr, var: &str) -> Result<Option<Expr>> {
    let x = Expr::symbol(var);
    if !e.depends_on(var) {
        return Ok(Some(Expr::product([e.clone(), x])));
    }
    match e {
        Expr::Num(_) => Ok(Some(Expr::product([e.clone(), x]))),
        Expr::Sym(_) => Ok(Some(Expr::product([Expr::rational(1, 2), Expr::powi(x, 2)]))),
        Expr::Add(terms) => {
            let mut out = Vec::with_capacity(terms.len());
            for term in terms {
                match antiderivative(term, var)? {
                    Some(t) => out.push(t),
                    None => return Ok(None),
                }
            }
            Ok(Some(Expr::sum(out)))
        }
        Expr::Mul(factors) => {
            let (dependent, constant): (Vec<&Expr>, Vec<&Expr>) =
                factors.iter().partition(|f| f.depends_on(var));
            let [single] = dependent.as_slice() else {
                return Ok(None);
            };
            Ok(antiderivative(single, var)?
                .map(|inner| Expr::product(constant.into_iter().cloned().chain([inner]))))
        }
        Expr::Pow(base, exp) => {
            let Some(s) = exp.as_number() else {
                return Ok(None);
            };
            if exp.depends_on(var) {
                return Ok(None);
            }
            if let Some(a) = linear_coefficient(base, var)? {
                return Ok(Some(power_rule(base.as_ref().clone(), a, s)));
            }
            let Some(split) = PowerOfLinear::split(base, var)? else {
                return Ok(None);
            };
            // (C·L^k)^s = C^s · L^(k s)
            let ks = s * &split.k;
            Ok(Some(Expr::product([
                Expr::pow(split.c, Expr::Num(s.clone())),
                power_rule(split.l, split.a, &ks),
            ])))
        }
        Expr::Func(func, arg) => {
            let Some(a) = linear_coefficient(arg, var)? else {
                return Ok(None);
            };
            let u = arg.as_ref().clone();
            let primitive = match func {
                Func::Sin => -Expr::cos(u),
                Func::Cos => Expr::sin(u),
                Func::Exp => Expr::exp(u),
                Func::Sinh => Expr::apply(Func::Cosh, u),
                Func::Cosh => Expr::apply(Func::Sinh, u),
                Func::Log => Expr::product([u.clone(), Expr::ln(u.clone())]) - u,
                _ => return Ok(None),
            };
            Ok(Some(Expr::product([primitive, Expr::recip(a)])))
        }
    }
}

/// `∫ L^n` for `L` linear with slope `a`.
fn power_rule(l: Expr, a: Expr, n: &Rational) -> Expr {
    if *n == -Rational::one() {
        return Expr::product([Expr::ln(l), Expr::recip(a)]);
    }
    let next = n + Rational::one();
    Expr::product([
        Expr::pow(l, Expr::Num(next.clone())),
        Expr::recip(a),
        Expr::Num(next.recip()),
    ])
}

/// Slope of `e` in `var` if `e` is linear in `var` with a non-zero slope.
fn linear_coefficient(e: &Expr, var: &str) -> Result<Option<Expr>> {
    let n = Normal::from_expr(e)?;
    if n.den.keys().any(|f| f.depends_on(var)) {
        return Ok(None);
    }
    Ok(linear_parts(&n.num, var).map(|(a, _)| {
        Normal {
            num: a,
            den: n.den.clone(),
        }
        .to_expr()
    }))
}

/// `(a, b)` with `p = a·var + b`, both free of `var`.
fn linear_parts(p: &Poly, var: &str) -> Option<(Poly, Poly)> {
    let x = Expr::symbol(var);
    if p.degree_in(&x) != 1 {
        return None;
    }
    let a = p.coefficient_of(&x, 1);
    let b = p.coefficient_of(&x, 0);
    if a.is_zero() || a.depends_on(var) || b.depends_on(var) {
        return None;
    }
    Some((a, b))
}

/// A radicand rewritten as `c · l^k` with `l` linear in the variable.
struct PowerOfLinear {
    c: Expr,
    l: Expr,
    a: Expr,
    k: Rational,
}

impl PowerOfLinear {
    /// Only the denominator may carry the variable, as a single linear factor.
    fn split(base: &Expr, var: &str) -> Result<Option<Self>> {
        let n = Normal::from_expr(base)?;
        if n.num.depends_on(var) {
            return Ok(None);
        }
        let mut dependent = n.den.iter().filter(|(f, _)| f.depends_on(var));
        let (Some((factor, exponent)), None) = (dependent.next(), dependent.next()) else {
            return Ok(None);
        };
        let Some((mut a, _)) = linear_parts(factor, var) else {
            return Ok(None);
        };
        let k = -Rational::from_integer((*exponent).into());
        let mut rest: BTreeMap<Poly, u32> = n.den.clone();
        rest.remove(factor);
        let mut c = Normal {
            num: n.num.clone(),
            den: rest,
        };
        let mut l = factor.clone();
        if a.as_constant().is_some_and(|slope| slope.is_negative()) {
            a = a.neg();
            l = l.neg();
            if exponent % 2 == 1 {
                c = c.neg();
            }
        }
        Ok(Some(Self {
            c: c.to_expr(),
            l: l.to_expr(),
            a: a.to_expr(),
            k,
        }))
    }
}
