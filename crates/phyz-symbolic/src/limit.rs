//! Limits as a variable tends to +∞.
//!
//! Rational functions of the variable are decided exactly by comparing
//! degrees. Everything else is handled structurally, combining the limits of
//! sub-expressions; combinations such as `∞ - ∞` or `0 · ∞` give
//! [`Limit::Unknown`].

use std::cmp::Ordering;

use num_integer::Integer;
use num_traits::{Signed, Zero};

use crate::compile::CompiledExpr;
use crate::error::Result;
use crate::expr::{Expr, Func, PI_SYMBOL, Rational};
use crate::normal::Normal;
use crate::poly::Poly;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Limit {
    Finite(Expr),
    PositiveInfinity,
    NegativeInfinity,
    /// Diverges in magnitude with a sign that could not be decided.
    Infinite,
    Unknown,
}

impl Limit {
    pub fn is_finite(&self) -> bool {
        matches!(self, Limit::Finite(_))
    }

    fn infinity(sign: Option<Ordering>) -> Self {
        match sign {
            Some(Ordering::Greater) => Limit::PositiveInfinity,
            Some(Ordering::Less) => Limit::NegativeInfinity,
            _ => Limit::Infinite,
        }
    }

    fn sign(&self) -> Option<Ordering> {
        match self {
            Limit::PositiveInfinity => Some(Ordering::Greater),
            Limit::NegativeInfinity => Some(Ordering::Less),
            Limit::Finite(e) => sign_of(e),
            Limit::Infinite | Limit::Unknown => None,
        }
    }

    fn is_infinite(&self) -> bool {
        matches!(
            self,
            Limit::PositiveInfinity | Limit::NegativeInfinity | Limit::Infinite
        )
    }
}

/// Limit of `expr` as `var → +∞`. Other symbols are treated as constants.
pub fn limit_at_infinity(expr: &Expr, var: &str) -> Result<Limit> {
    let e = expr.simplify()?;
    limit(&e, var)
}

fn limit(e: &Expr, var: &str) -> Result<Limit> {
    if !e.depends_on(var) {
        return Ok(Limit::Finite(e.clone()));
    }
    if let Some(result) = rational_limit(e, var)? {
        return Ok(result);
    }
    match e {
        Expr::Num(_) => Ok(Limit::Finite(e.clone())),
        Expr::Sym(_) => Ok(Limit::PositiveInfinity),
        Expr::Add(terms) => {
            let mut finite = Vec::new();
            let mut infinite: Option<Limit> = None;
            for term in terms {
                match limit(term, var)? {
                    Limit::Finite(v) => finite.push(v),
                    Limit::Unknown => return Ok(Limit::Unknown),
                    inf => match &infinite {
                        None => infinite = Some(inf),
                        Some(seen) if *seen == inf && inf != Limit::Infinite => {}
                        Some(_) => return Ok(Limit::Unknown),
                    },
                }
            }
            match infinite {
                Some(inf) => Ok(inf),
                None => Ok(Limit::Finite(Expr::sum(finite).simplify()?)),
            }
        }
        Expr::Mul(factors) => {
            let mut finite = Vec::new();
            let mut diverges = false;
            let mut sign = Some(Ordering::Greater);
            for factor in factors {
                let l = limit(factor, var)?;
                if l == Limit::Unknown {
                    return Ok(Limit::Unknown);
                }
                diverges |= l.is_infinite();
                sign = combine_signs(sign, l.sign());
                if let Limit::Finite(v) = l {
                    finite.push(v);
                }
            }
            let value = Expr::product(finite).simplify()?;
            if !diverges {
                return Ok(Limit::Finite(value));
            }
            if value.is_zero() {
                return Ok(Limit::Unknown);
            }
            Ok(Limit::infinity(sign))
        }
        Expr::Pow(base, exp) => {
            let Some(q) = exp.as_number() else {
                return Ok(Limit::Unknown);
            };
            power_limit(limit(base, var)?, q)
        }
        Expr::Func(func, arg) => function_limit(*func, limit(arg, var)?),
    }
}

/// Exact answer when `e` is a ratio of polynomials in `var` whose
/// coefficients are free of `var`.
fn rational_limit(e: &Expr, var: &str) -> Result<Option<Limit>> {
    let n = Normal::from_expr(e)?;
    let x = Expr::symbol(var);
    let den = n.den_poly();
    let Some((p, lead_num)) = leading_in(&n.num, &x, var) else {
        return Ok(None);
    };
    let Some((q, lead_den)) = leading_in(&den, &x, var) else {
        return Ok(None);
    };
    let ratio = Normal::from_poly(lead_num).div(&Normal::from_poly(lead_den))?.to_expr();
    Ok(Some(match p.cmp(&q) {
        Ordering::Less => Limit::Finite(Expr::zero()),
        Ordering::Equal => Limit::Finite(ratio),
        Ordering::Greater => Limit::infinity(sign_of(&ratio)),
    }))
}

/// Degree in `x` and leading coefficient, if `p` is a polynomial in `x`.
fn leading_in(p: &Poly, x: &Expr, var: &str) -> Option<(u32, Poly)> {
    let other_dependent = p.kernels().into_iter().any(|k| k != x && k.depends_on(var));
    if other_dependent {
        return None;
    }
    let degree = p.degree_in(x);
    Some((degree, p.coefficient_of(x, degree)))
}

fn power_limit(base: Limit, q: &Rational) -> Result<Limit> {
    let positive = q.is_positive();
    Ok(match base {
        Limit::Finite(b) => {
            if b.is_zero() && !positive {
                return Ok(Limit::Unknown);
            }
            match Expr::pow(b, Expr::Num(q.clone())).simplify() {
                Ok(v) => Limit::Finite(v),
                Err(_) => Limit::Unknown,
            }
        }
        Limit::PositiveInfinity if positive => Limit::PositiveInfinity,
        Limit::PositiveInfinity | Limit::NegativeInfinity | Limit::Infinite if !positive => {
            Limit::Finite(Expr::zero())
        }
        Limit::NegativeInfinity if q.is_integer() => {
            if q.to_integer().is_odd() {
                Limit::NegativeInfinity
            } else {
                Limit::PositiveInfinity
            }
        }
        Limit::Infinite if q.is_integer() => Limit::Infinite,
        _ => Limit::Unknown,
    })
}

fn function_limit(func: Func, arg: Limit) -> Result<Limit> {
    let half_pi = || Expr::product([Expr::rational(1, 2), Expr::symbol(PI_SYMBOL)]);
    Ok(match (func, arg) {
        (_, Limit::Finite(a)) => match Expr::apply(func, a).simplify() {
            Ok(v) => Limit::Finite(v),
            Err(_) => Limit::Unknown,
        },
        (Func::Exp | Func::Log | Func::Sinh | Func::Cosh, Limit::PositiveInfinity) => {
            Limit::PositiveInfinity
        }
        (Func::Exp, Limit::NegativeInfinity) => Limit::Finite(Expr::zero()),
        (Func::Sinh, Limit::NegativeInfinity) => Limit::NegativeInfinity,
        (Func::Cosh, Limit::NegativeInfinity | Limit::Infinite) => Limit::PositiveInfinity,
        (Func::Atan, Limit::PositiveInfinity) => Limit::Finite(half_pi()),
        (Func::Atan, Limit::NegativeInfinity) => Limit::Finite(-half_pi()),
        (Func::Tanh, Limit::PositiveInfinity) => Limit::Finite(Expr::one()),
        (Func::Tanh, Limit::NegativeInfinity) => Limit::Finite(-Expr::one()),
        _ => Limit::Unknown,
    })
}

fn combine_signs(a: Option<Ordering>, b: Option<Ordering>) -> Option<Ordering> {
    match (a?, b?) {
        (Ordering::Equal, _) | (_, Ordering::Equal) => Some(Ordering::Equal),
        (x, y) if x == y => Some(Ordering::Greater),
        _ => Some(Ordering::Less),
    }
}

/// Sign of a closed constant expression, decided numerically.
fn sign_of(e: &Expr) -> Option<Ordering> {
    if let Some(q) = e.as_number() {
        return Some(q.cmp(&Rational::zero()));
    }
    if !e.free_symbols().is_empty() {
        return None;
    }
    let value = CompiledExpr::compile(e, &[]).ok()?.eval(&[]).ok()?;
    value.partial_cmp(&0.0)
}
