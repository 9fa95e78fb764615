//! Rational normal form.
//!
//! An expression is brought into the shape `num / Π fᵢ^eᵢ` where `num` is a
//! polynomial over kernels and every `fᵢ` is a primitive, non-constant
//! polynomial with a positive leading coefficient. Keeping the denominator
//! factored makes common denominators cheap and lets cancellation work one
//! known factor at a time.
//!
//! Two families of kernel relations are applied while multiplying:
//!
//! - `cos(a)^2 → 1 - sin(a)^2` and `cosh(a)^2 → 1 + sinh(a)^2`
//! - a radical `b^(1/q)` raised to a power `≥ q` releases whole powers of `b`
//!
//! With these, the numerator is zero exactly when the expression is zero,
//! up to relations between unrelated kernels (e.g. `sin(2x)` against
//! `sin(x)`), which are not modelled.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::{Result, SymbolicError};
use crate::expr::{Expr, Func, Rational};
use crate::poly::{Monomial, Poly};

/// Largest integer exponent expanded symbolically.
const MAX_EXPONENT: u64 = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Normal {
    pub num: Poly,
    pub den: BTreeMap<Poly, u32>,
}

impl Normal {
    pub fn constant(c: Rational) -> Self {
        Self::from_poly(Poly::constant(c))
    }

    pub fn one() -> Self {
        Self::constant(Rational::one())
    }

    pub fn zero() -> Self {
        Self::from_poly(Poly::zero())
    }

    pub fn from_poly(num: Poly) -> Self {
        Self {
            num,
            den: BTreeMap::new(),
        }
    }

    pub fn kernel(kernel: Expr) -> Self {
        Self::from_poly(Poly::kernel(kernel))
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    pub fn as_constant(&self) -> Option<Rational> {
        if self.den.is_empty() {
            self.num.as_constant()
        } else {
            None
        }
    }

    /// Expanded denominator.
    pub fn den_poly(&self) -> Poly {
        self.den
            .iter()
            .fold(Poly::one(), |acc, (f, e)| acc.mul(&f.pow(*e)))
    }

    // ------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------

    pub fn add(&self, other: &Self) -> Self {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }
        let mut den = self.den.clone();
        for (f, e) in &other.den {
            let slot = den.entry(f.clone()).or_insert(0);
            *slot = (*slot).max(*e);
        }
        let lift = |n: &Normal| -> Poly {
            den.iter().fold(n.num.clone(), |acc, (f, e)| {
                let have = n.den.get(f).copied().unwrap_or(0);
                if *e > have {
                    acc.mul(&f.pow(e - have))
                } else {
                    acc
                }
            })
        };
        let num = lift(self).add(&lift(other));
        let mut out = Self { num, den };
        out.cancel();
        out
    }

    pub fn neg(&self) -> Self {
        Self {
            num: self.num.neg(),
            den: self.den.clone(),
        }
    }

    pub fn scale(&self, k: &Rational) -> Self {
        let mut out = Self {
            num: self.num.scale(k),
            den: self.den.clone(),
        };
        if out.num.is_zero() {
            out.den.clear();
        }
        out
    }

    pub fn mul(&self, other: &Self) -> Result<Self> {
        if self.is_zero() || other.is_zero() {
            return Ok(Self::zero());
        }
        let mut den = self.den.clone();
        for (f, e) in &other.den {
            *den.entry(f.clone()).or_insert(0) += e;
        }
        let mut out = Self {
            num: self.num.mul(&other.num),
            den,
        };
        out.cancel();
        out.reduce()
    }

    pub fn div(&self, other: &Self) -> Result<Self> {
        self.mul(&other.inv()?)
    }

    pub fn inv(&self) -> Result<Self> {
        if self.num.is_zero() {
            return Err(SymbolicError::DivisionByZero);
        }
        let (content, prim) = self.num.primitive();
        let num = self.den_poly().scale(&content.recip());
        let mono = prim.monomial_content();
        let rest = prim.div_monomial(&mono);
        let mut den = BTreeMap::new();
        for (k, e) in mono.factors() {
            den.insert(Poly::kernel(k.clone()), *e);
        }
        if rest.as_constant().is_none() {
            *den.entry(rest).or_insert(0) += 1;
        }
        let mut out = Self { num, den };
        out.cancel();
        out.reduce()
    }

    pub fn powi(&self, n: i64) -> Result<Self> {
        if n == 0 {
            if self.is_zero() {
                return Err(SymbolicError::Domain("0**0 is undefined".into()));
            }
            return Ok(Self::one());
        }
        if n.unsigned_abs() > MAX_EXPONENT {
            return Err(SymbolicError::ExponentTooLarge(n.to_string()));
        }
        let base = if n < 0 { self.inv()? } else { self.clone() };
        let mut k = n.unsigned_abs();
        let mut result = Self::one();
        let mut square = base;
        while k > 0 {
            if k & 1 == 1 {
                result = result.mul(&square)?;
            }
            k >>= 1;
            if k > 0 {
                square = square.mul(&square)?;
            }
        }
        Ok(result)
    }

    /// Remove every denominator factor that divides the numerator.
    fn cancel(&mut self) {
        if self.num.is_zero() {
            self.den.clear();
            return;
        }
        let factors: Vec<Poly> = self.den.keys().cloned().collect();
        for f in factors {
            while let Some(e) = self.den.get(&f).copied() {
                let Some(q) = self.num.div_exact(&f) else {
                    break;
                };
                self.num = q;
                if e == 1 {
                    self.den.remove(&f);
                } else {
                    self.den.insert(f.clone(), e - 1);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Kernel relations
    // ------------------------------------------------------------------

    fn needs_reduction(&self) -> bool {
        poly_needs_reduction(&self.num)
            || self.den.iter().any(|(f, e)| {
                poly_needs_reduction(f)
                    || f
                        .as_kernel()
                        .and_then(radical_index)
                        .is_some_and(|(_, q)| *e >= q)
            })
    }

    fn reduce(self) -> Result<Self> {
        if !self.needs_reduction() {
            return Ok(self);
        }
        let mut acc = reduce_poly(&self.num)?;
        for (f, e) in &self.den {
            let part = match f.as_kernel().and_then(radical_index) {
                Some((radicand, q)) if *e >= q => {
                    let whole = Normal::from_expr(radicand)?.powi(-i64::from(e / q))?;
                    let rest = Normal {
                        num: Poly::one(),
                        den: BTreeMap::from([(f.clone(), e % q)]),
                    };
                    let rest = if e % q == 0 { Normal::one() } else { rest };
                    whole.mul(&rest)?
                }
                _ if poly_needs_reduction(f) => reduce_poly(f)?.powi(-i64::from(*e))?,
                _ => Normal {
                    num: Poly::one(),
                    den: BTreeMap::from([(f.clone(), *e)]),
                },
            };
            acc = acc.mul(&part)?;
        }
        Ok(acc)
    }

    // ------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------

    pub fn from_expr(e: &Expr) -> Result<Self> {
        match e {
            Expr::Num(q) => Ok(Self::constant(q.clone())),
            Expr::Sym(_) => Ok(Self::kernel(e.clone())),
            Expr::Add(terms) => {
                let mut acc = Self::zero();
                for t in terms {
                    acc = acc.add(&Self::from_expr(t)?);
                }
                Ok(acc)
            }
            Expr::Mul(factors) => {
                let mut acc = Self::one();
                for f in factors {
                    acc = acc.mul(&Self::from_expr(f)?)?;
                }
                Ok(acc)
            }
            Expr::Pow(base, exp) => Self::power(base, exp),
            Expr::Func(func, arg) => Self::function(*func, arg),
        }
    }

    fn power(base: &Expr, exp: &Expr) -> Result<Self> {
        let exponent = Self::from_expr(exp)?;
        let Some(q) = exponent.as_constant() else {
            let base = Self::from_expr(base)?;
            if base.as_constant().is_some_and(|c| c.is_one()) {
                return Ok(Self::one());
            }
            return Ok(Self::kernel(Expr::Pow(
                Box::new(base.to_expr()),
                Box::new(exponent.to_expr()),
            )));
        };
        if q.is_integer() {
            let n = q
                .to_integer()
                .to_i64()
                .ok_or_else(|| SymbolicError::ExponentTooLarge(q.to_string()))?;
            return Self::from_expr(base)?.powi(n);
        }
        Self::radical(&Self::from_expr(base)?, &q)
    }

    /// `base^(p/s)` with `s > 1`.
    fn radical(base: &Self, exponent: &Rational) -> Result<Self> {
        let p = exponent
            .numer()
            .to_i64()
            .ok_or_else(|| SymbolicError::ExponentTooLarge(exponent.to_string()))?;
        let s = exponent
            .denom()
            .to_u32()
            .ok_or_else(|| SymbolicError::ExponentTooLarge(exponent.to_string()))?;
        if base.is_zero() {
            return if p > 0 {
                Ok(Self::zero())
            } else {
                Err(SymbolicError::DivisionByZero)
            };
        }
        if let Some(c) = base.as_constant() {
            if let Some(root) = exact_root(&c, s) {
                return Self::constant(root).powi(p);
            }
            if c.is_negative() && s % 2 == 1 {
                let magnitude = Self::radical(&Self::constant(-c), exponent)?;
                let sign = if p % 2 == 0 { 1 } else { -1 };
                return Ok(magnitude.scale(&Rational::from_integer(sign.into())));
            }
        }
        let kernel = Expr::Pow(
            Box::new(base.to_expr()),
            Box::new(Expr::Num(Rational::new(BigInt::one(), BigInt::from(s)))),
        );
        Self::kernel(kernel).powi(p)
    }

    fn function(func: Func, arg: &Expr) -> Result<Self> {
        let arg = Self::from_expr(arg)?;
        if let Some(c) = arg.as_constant() {
            if c.is_zero() {
                return Ok(match func {
                    Func::Sin | Func::Tan | Func::Sinh | Func::Tanh | Func::Asin | Func::Atan => {
                        Self::zero()
                    }
                    Func::Cos | Func::Cosh | Func::Exp => Self::one(),
                    Func::Log => return Err(SymbolicError::Domain("log(0)".into())),
                    Func::Acos => Self::kernel(Expr::Func(func, Box::new(Expr::zero()))),
                });
            }
            if c.is_one() && func == Func::Log {
                return Ok(Self::zero());
            }
        }
        let negated = arg
            .num
            .leading()
            .is_some_and(|(_, c)| c.is_negative());
        if negated && (func.is_odd() || func.is_even()) {
            let inner = Self::function_kernel(func, &arg.neg())?;
            return Ok(if func.is_odd() { inner.neg() } else { inner });
        }
        Self::function_kernel(func, &arg)
    }

    fn function_kernel(func: Func, arg: &Self) -> Result<Self> {
        let arg = arg.to_expr();
        match func {
            Func::Tan => {
                let sin = Self::kernel(Expr::Func(Func::Sin, Box::new(arg.clone())));
                let cos = Self::kernel(Expr::Func(Func::Cos, Box::new(arg)));
                sin.div(&cos)
            }
            _ => Ok(Self::kernel(Expr::Func(func, Box::new(arg)))),
        }
    }

    pub fn to_expr(&self) -> Expr {
        let num = self.num.to_expr();
        if self.den.is_empty() {
            return num;
        }
        let mut factors = vec![num];
        for (f, e) in &self.den {
            factors.push(Expr::powi(f.to_expr(), -i64::from(*e)));
        }
        Expr::product(factors)
    }
}

/// The radicand and index of a kernel `b^(1/q)`.
pub(crate) fn radical_index(kernel: &Expr) -> Option<(&Expr, u32)> {
    match kernel {
        Expr::Pow(base, exp) => match exp.as_ref() {
            Expr::Num(q) if q.numer().is_one() && *q.denom() > BigInt::one() => {
                Some((base.as_ref(), q.denom().to_u32()?))
            }
            _ => None,
        },
        _ => None,
    }
}

fn kernel_needs_reduction(kernel: &Expr, exponent: u32) -> bool {
    match kernel {
        Expr::Func(Func::Cos | Func::Cosh, _) => exponent >= 2,
        _ => radical_index(kernel).is_some_and(|(_, q)| exponent >= q),
    }
}

fn poly_needs_reduction(p: &Poly) -> bool {
    p.terms()
        .any(|(m, _)| m.factors().iter().any(|(k, e)| kernel_needs_reduction(k, *e)))
}

/// Apply the kernel relations to every term of `p`.
fn reduce_poly(p: &Poly) -> Result<Normal> {
    let mut acc = Normal::zero();
    for (m, c) in p.terms() {
        let mut plain = Monomial::one();
        let mut term = Normal::constant(c.clone());
        for (k, e) in m.factors() {
            if !kernel_needs_reduction(k, *e) {
                plain = plain.mul(&Monomial::kernel(k.clone(), *e));
                continue;
            }
            let replaced = match k {
                Expr::Func(func @ (Func::Cos | Func::Cosh), arg) => {
                    let partner = if *func == Func::Cos { Func::Sin } else { Func::Sinh };
                    let square = Poly::kernel(Expr::Func(partner, arg.clone())).pow(2);
                    let pythagoras = if *func == Func::Cos {
                        Poly::one().sub(&square)
                    } else {
                        Poly::one().add(&square)
                    };
                    let odd = Poly::monomial(Monomial::kernel(k.clone(), e % 2), Rational::one());
                    Normal::from_poly(pythagoras.pow(e / 2).mul(&odd))
                }
                _ => match radical_index(k) {
                    Some((radicand, q)) => {
                        let whole = Normal::from_expr(radicand)?.powi(i64::from(e / q))?;
                        let odd = Poly::monomial(Monomial::kernel(k.clone(), e % q), Rational::one());
                        whole.mul(&Normal::from_poly(odd))?
                    }
                    None => Normal::from_poly(Poly::monomial(
                        Monomial::kernel(k.clone(), *e),
                        Rational::one(),
                    )),
                },
            };
            term = term.mul(&replaced)?;
        }
        term = term.mul(&Normal::from_poly(Poly::monomial(plain, Rational::one())))?;
        acc = acc.add(&term);
    }
    Ok(acc)
}

/// Exact `s`-th root of a non-negative rational, if it exists.
fn exact_root(c: &Rational, s: u32) -> Option<Rational> {
    if c.is_negative() {
        return None;
    }
    let n = c.numer().nth_root(s);
    let d = c.denom().nth_root(s);
    let candidate = Rational::new(n, d);
    (num_traits::Pow::pow(&candidate, s) == *c).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn normal(text: &str) -> Normal {
        Normal::from_expr(&parse(text).unwrap()).unwrap()
    }

    #[test]
    fn test_common_factor_cancels() {
        let n = normal("(x**2 - 1)/(x - 1)");
        assert!(n.den.is_empty());
        assert_eq!(n, normal("x + 1"));
    }

    #[test]
    fn test_denominator_is_factored() {
        let n = normal("1/(1 - 2*M/r)");
        assert_eq!(n.den.len(), 1);
        let n = normal("1/(r**2*(r - 2*M))");
        // r and (r - 2M) stay separate factors
        assert_eq!(n.den.len(), 2);
        assert_eq!(n.den.get(&Poly::kernel(Expr::symbol("r"))), Some(&2));
    }

    #[test]
    fn test_pythagorean_identity() {
        assert!(normal("sin(x)**2 + cos(x)**2 - 1").is_zero());
        assert!(normal("cosh(x)**2 - sinh(x)**2 - 1").is_zero());
        assert!(normal("cos(x)**4 - (1 - sin(x)**2)**2").is_zero());
    }

    #[test]
    fn test_radicals_collapse() {
        assert_eq!(normal("sqrt(x)**2"), normal("x"));
        assert_eq!(normal("sqrt(x)*sqrt(x)*sqrt(x)"), normal("x*sqrt(x)"));
        assert_eq!(normal("1/sqrt(x)**2"), normal("1/x"));
        assert_eq!(normal("sqrt(4/9)"), normal("2/3"));
        assert_eq!(normal("(-8)**(1/3)"), normal("-2"));
    }

    #[test]
    fn test_odd_and_even_arguments() {
        assert!(normal("sin(-x) + sin(x)").is_zero());
        assert!(normal("cos(-x) - cos(x)").is_zero());
        assert_eq!(normal("tan(x)"), normal("sin(x)/cos(x)"));
    }

    #[test]
    fn test_special_values() {
        assert!(normal("sin(0)").is_zero());
        assert_eq!(normal("exp(0)"), Normal::one());
        assert!(normal("log(1)").is_zero());
        assert!(matches!(
            Normal::from_expr(&parse("1/(x - x)").unwrap()),
            Err(SymbolicError::DivisionByZero)
        ));
    }

    #[test]
    fn test_huge_exponent_rejected() {
        assert!(matches!(
            Normal::from_expr(&parse("(x + 1)**100000").unwrap()),
            Err(SymbolicError::ExponentTooLarge(_))
        ));
    }
}
