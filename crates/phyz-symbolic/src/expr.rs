//! Expression tree and structural constructors.
//!
//! Constructors perform only cheap local rewrites (flattening, constant
//! folding, dropping identities). Algebraic normalization lives in
//! [`Expr::simplify`].

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Pow, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SymbolicError};

/// Exact rational number used for every literal.
pub type Rational = BigRational;

/// Name of the symbol evaluated numerically as π.
pub const PI_SYMBOL: &str = "pi";

/// Largest integer power of a literal folded eagerly by [`Expr::pow`].
const MAX_FOLDED_POWER: u32 = 256;

/// Elementary functions understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sinh,
    Cosh,
    Tanh,
    Asin,
    Acos,
    Atan,
}

impl Func {
    pub const ALL: [Func; 11] = [
        Func::Sin,
        Func::Cos,
        Func::Tan,
        Func::Exp,
        Func::Log,
        Func::Sinh,
        Func::Cosh,
        Func::Tanh,
        Func::Asin,
        Func::Acos,
        Func::Atan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// The function that undoes `self` on its principal branch.
    pub fn inverse(self) -> Option<Self> {
        match self {
            Func::Exp => Some(Func::Log),
            Func::Log => Some(Func::Exp),
            Func::Sin => Some(Func::Asin),
            Func::Asin => Some(Func::Sin),
            Func::Cos => Some(Func::Acos),
            Func::Acos => Some(Func::Cos),
            Func::Tan => Some(Func::Atan),
            Func::Atan => Some(Func::Tan),
            Func::Sinh | Func::Cosh | Func::Tanh => None,
        }
    }

    /// True for functions with f(-x) = -f(x).
    pub fn is_odd(self) -> bool {
        matches!(
            self,
            Func::Sin | Func::Tan | Func::Sinh | Func::Tanh | Func::Asin | Func::Atan
        )
    }

    /// True for functions with f(-x) = f(x).
    pub fn is_even(self) -> bool {
        matches!(self, Func::Cos | Func::Cosh)
    }
}

/// A symbolic expression.
///
/// Values are immutable; every transformation returns a new tree. Sums and
/// products are n-ary and never nest directly inside a node of the same kind
/// when built through the constructors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expr {
    Num(Rational),
    Sym(String),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Func(Func, Box<Expr>),
}

impl Expr {
    pub fn zero() -> Self {
        Expr::Num(Rational::zero())
    }

    pub fn one() -> Self {
        Expr::Num(Rational::one())
    }

    pub fn int(n: i64) -> Self {
        Expr::Num(Rational::from_integer(BigInt::from(n)))
    }

    /// Exact fraction `numer / denom`. `denom` must be non-zero.
    pub fn rational(numer: i64, denom: i64) -> Self {
        Expr::Num(Rational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn number(value: Rational) -> Self {
        Expr::Num(value)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Sym(name.into())
    }

    /// Exact rational image of a finite double, read through its shortest
    /// decimal representation so that `0.1` becomes `1/10`.
    pub fn from_f64(value: f64) -> Option<Self> {
        rational_from_f64(value).map(Expr::Num)
    }

    /// Flattened sum with literal terms folded into one trailing constant.
    pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Self {
        let mut constant = Rational::zero();
        let mut out = Vec::new();
        for term in terms {
            match term {
                Expr::Num(q) => constant += q,
                Expr::Add(inner) => {
                    for t in inner {
                        match t {
                            Expr::Num(q) => constant += q,
                            other => out.push(other),
                        }
                    }
                }
                other => out.push(other),
            }
        }
        if !constant.is_zero() {
            out.push(Expr::Num(constant));
        }
        match out.len() {
            0 => Expr::zero(),
            1 => out.pop().unwrap_or_else(Expr::zero),
            _ => Expr::Add(out),
        }
    }

    /// Flattened product with literal factors folded into one leading
    /// coefficient.
    pub fn product(factors: impl IntoIterator<Item = Expr>) -> Self {
        let mut coefficient = Rational::one();
        let mut out = Vec::new();
        for factor in factors {
            match factor {
                Expr::Num(q) => coefficient *= q,
                Expr::Mul(inner) => {
                    for f in inner {
                        match f {
                            Expr::Num(q) => coefficient *= q,
                            other => out.push(other),
                        }
                    }
                }
                other => out.push(other),
            }
        }
        if coefficient.is_zero() {
            // A literal division by zero must survive so simplify can reject it.
            let undefined: Vec<Expr> = out.into_iter().filter(Expr::divides_by_zero).collect();
            if undefined.is_empty() {
                return Expr::zero();
            }
            return Expr::Mul(std::iter::once(Expr::zero()).chain(undefined).collect());
        }
        if !coefficient.is_one() {
            out.insert(0, Expr::Num(coefficient));
        }
        match out.len() {
            0 => Expr::one(),
            1 => out.pop().unwrap_or_else(Expr::one),
            _ => Expr::Mul(out),
        }
    }

    pub fn pow(base: Expr, exponent: Expr) -> Self {
        if let Expr::Num(e) = &exponent {
            if e.is_zero() {
                return Expr::one();
            }
            if e.is_one() {
                return base;
            }
            if let Expr::Num(b) = &base {
                if b.is_one() {
                    return Expr::one();
                }
                if e.is_integer() {
                    if let Some(n) = e.to_integer().to_i32() {
                        if n.unsigned_abs() <= MAX_FOLDED_POWER && !(b.is_zero() && n < 0) {
                            return Expr::Num(Pow::pow(b, n));
                        }
                    }
                }
            }
            if e.is_integer() {
                if let Expr::Pow(inner_base, inner_exp) = &base {
                    if let Expr::Num(inner) = inner_exp.as_ref() {
                        return Expr::pow((**inner_base).clone(), Expr::Num(inner * e));
                    }
                }
            }
        }
        Expr::Pow(Box::new(base), Box::new(exponent))
    }

    pub fn powi(base: Expr, n: i64) -> Self {
        Expr::pow(base, Expr::int(n))
    }

    pub fn sqrt(arg: Expr) -> Self {
        Expr::pow(arg, Expr::rational(1, 2))
    }

    pub fn recip(arg: Expr) -> Self {
        Expr::powi(arg, -1)
    }

    pub fn apply(func: Func, arg: Expr) -> Self {
        Expr::Func(func, Box::new(arg))
    }

    pub fn sin(arg: Expr) -> Self {
        Expr::apply(Func::Sin, arg)
    }

    pub fn cos(arg: Expr) -> Self {
        Expr::apply(Func::Cos, arg)
    }

    pub fn exp(arg: Expr) -> Self {
        Expr::apply(Func::Exp, arg)
    }

    pub fn ln(arg: Expr) -> Self {
        Expr::apply(Func::Log, arg)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn as_number(&self) -> Option<&Rational> {
        match self {
            Expr::Num(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Sym(name) => Some(name),
            _ => None,
        }
    }

    /// Structural test for the literal zero. Use [`Expr::simplify`] first
    /// to detect expressions that only cancel to zero.
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Num(q) if q.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Num(q) if q.is_one())
    }

    /// Names of all free symbols. The constant `pi` is not free.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Num(_) => {}
            Expr::Sym(name) => {
                if name != PI_SYMBOL {
                    out.insert(name.clone());
                }
            }
            Expr::Add(items) | Expr::Mul(items) => {
                for item in items {
                    item.collect_symbols(out);
                }
            }
            Expr::Pow(base, exp) => {
                base.collect_symbols(out);
                exp.collect_symbols(out);
            }
            Expr::Func(_, arg) => arg.collect_symbols(out),
        }
    }

    pub fn depends_on(&self, name: &str) -> bool {
        match self {
            Expr::Num(_) => false,
            Expr::Sym(s) => s == name,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(|e| e.depends_on(name)),
            Expr::Pow(base, exp) => base.depends_on(name) || exp.depends_on(name),
            Expr::Func(_, arg) => arg.depends_on(name),
        }
    }

    /// True if some function is applied directly to its own inverse, as in
    /// `exp(log(x))`. Such compositions escape the rational normal form.
    /// True if the tree raises a literal zero to a negative power.
    pub fn divides_by_zero(&self) -> bool {
        match self {
            Expr::Num(_) | Expr::Sym(_) => false,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(Expr::divides_by_zero),
            Expr::Pow(base, exp) => match (base.as_ref(), exp.as_ref()) {
                (Expr::Num(b), Expr::Num(e)) if b.is_zero() && e < &Rational::zero() => true,
                _ => base.divides_by_zero() || exp.divides_by_zero(),
            },
            Expr::Func(_, arg) => arg.divides_by_zero(),
        }
    }

    pub fn contains_inverse_composition(&self) -> bool {
        match self {
            Expr::Num(_) | Expr::Sym(_) => false,
            Expr::Add(items) | Expr::Mul(items) => {
                items.iter().any(Expr::contains_inverse_composition)
            }
            Expr::Pow(base, exp) => {
                base.contains_inverse_composition() || exp.contains_inverse_composition()
            }
            Expr::Func(f, arg) => {
                let direct = matches!(arg.as_ref(), Expr::Func(g, _) if f.inverse() == Some(*g));
                direct || arg.contains_inverse_composition()
            }
        }
    }

    // ------------------------------------------------------------------
    // Substitution
    // ------------------------------------------------------------------

    /// Replace symbols by expressions. Unmapped symbols are kept.
    pub fn substitute(&self, map: &BTreeMap<String, Expr>) -> Expr {
        match self {
            Expr::Num(_) => self.clone(),
            Expr::Sym(name) => map.get(name).cloned().unwrap_or_else(|| self.clone()),
            Expr::Add(items) => Expr::sum(items.iter().map(|e| e.substitute(map))),
            Expr::Mul(items) => Expr::product(items.iter().map(|e| e.substitute(map))),
            Expr::Pow(base, exp) => Expr::pow(base.substitute(map), exp.substitute(map)),
            Expr::Func(f, arg) => Expr::apply(*f, arg.substitute(map)),
        }
    }

    /// Replace symbols by real values, converted to exact rationals.
    pub fn substitute_values(&self, values: &BTreeMap<String, f64>) -> Result<Expr> {
        let mut map = BTreeMap::new();
        for (name, value) in values {
            let q = Expr::from_f64(*value)
                .ok_or_else(|| SymbolicError::NonFiniteValue { name: name.clone() })?;
            map.insert(name.clone(), q);
        }
        Ok(self.substitute(&map))
    }
}

// ----------------------------------------------------------------------------
// Numbers
// ----------------------------------------------------------------------------

/// Parse a decimal literal (`12`, `1.25`, `3e-4`, `.5`) into an exact rational.
pub(crate) fn parse_decimal(text: &str) -> Option<Rational> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], body[idx + 1..].parse::<i32>().ok()?),
        None => (body, 0),
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(idx) => (&mantissa[..idx], &mantissa[idx + 1..]),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits = format!("{int_part}{frac_part}");
    let numer = BigInt::from_str(&digits).ok()?;
    let scale = exponent - i32::try_from(frac_part.len()).ok()?;
    let ten = BigInt::from(10);
    let value = if scale >= 0 {
        Rational::from_integer(numer * Pow::pow(&ten, scale.unsigned_abs()))
    } else {
        Rational::new(numer, Pow::pow(&ten, scale.unsigned_abs()))
    };
    Some(if negative { -value } else { value })
}

pub(crate) fn rational_from_f64(value: f64) -> Option<Rational> {
    if !value.is_finite() {
        return None;
    }
    parse_decimal(&format!("{value}"))
}

pub(crate) fn rational_to_f64(q: &Rational) -> f64 {
    q.to_f64().unwrap_or_else(|| {
        let n = q.numer().to_f64().unwrap_or(f64::NAN);
        let d = q.denom().to_f64().unwrap_or(f64::NAN);
        n / d
    })
}

// ----------------------------------------------------------------------------
// Operators
// ----------------------------------------------------------------------------

impl Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::sum([self, rhs])
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::sum([self, -rhs])
    }
}

impl Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::product([self, rhs])
    }
}

impl Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::product([self, Expr::recip(rhs)])
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::product([Expr::int(-1), self])
    }
}

macro_rules! forward_ref_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $trait::$method(self.clone(), rhs.clone())
            }
        }
    };
}

forward_ref_binop!(Add, add);
forward_ref_binop!(Sub, sub);
forward_ref_binop!(Mul, mul);
forward_ref_binop!(Div, div);

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::int(n)
    }
}

impl FromStr for Expr {
    type Err = SymbolicError;

    fn from_str(s: &str) -> Result<Self> {
        crate::parse::parse(s)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        crate::parse::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_folds_constants_and_flattens() {
        let x = Expr::symbol("x");
        let e = Expr::sum([Expr::int(2), x.clone(), Expr::sum([Expr::int(3), x.clone()])]);
        assert_eq!(e, Expr::Add(vec![x.clone(), x, Expr::int(5)]));
    }

    #[test]
    fn test_product_zero_absorbs() {
        let e = Expr::product([Expr::symbol("x"), Expr::zero(), Expr::symbol("y")]);
        assert!(e.is_zero());
    }

    #[test]
    fn test_zero_coefficient_keeps_division_by_zero() {
        let undefined = Expr::zero() / Expr::zero();
        assert!(!undefined.is_zero());
        assert!(undefined.divides_by_zero());
        assert_eq!(undefined.simplify(), Err(SymbolicError::DivisionByZero));

        let nested = Expr::zero() * (Expr::one() + Expr::one() / Expr::zero());
        assert_eq!(nested.simplify(), Err(SymbolicError::DivisionByZero));

        // an ordinary reciprocal is still absorbed
        assert!((Expr::zero() / Expr::symbol("r")).is_zero());
    }

    #[test]
    fn test_pow_folds_literals() {
        assert_eq!(Expr::powi(Expr::rational(2, 3), 2), Expr::rational(4, 9));
        assert_eq!(Expr::powi(Expr::int(2), -1), Expr::rational(1, 2));
        // 0^-1 is left for the simplifier to reject
        assert!(matches!(Expr::powi(Expr::zero(), -1), Expr::Pow(..)));
    }

    #[test]
    fn test_nested_integer_powers_merge() {
        let x = Expr::symbol("x");
        let e = Expr::powi(Expr::powi(x.clone(), 2), 3);
        assert_eq!(e, Expr::powi(x, 6));
    }

    #[test]
    fn test_parse_decimal_exact() {
        assert_eq!(parse_decimal("0.1"), Some(Rational::new(1.into(), 10.into())));
        assert_eq!(parse_decimal("2.5e2"), Some(Rational::from_integer(250.into())));
        assert_eq!(parse_decimal("1e-3"), Some(Rational::new(1.into(), 1000.into())));
        assert_eq!(parse_decimal("."), None);
    }

    #[test]
    fn test_from_f64_uses_shortest_decimal() {
        assert_eq!(Expr::from_f64(0.1), Some(Expr::rational(1, 10)));
        assert_eq!(Expr::from_f64(1.0), Some(Expr::one()));
        assert_eq!(Expr::from_f64(f64::NAN), None);
    }

    #[test]
    fn test_free_symbols_skip_pi() {
        let e = Expr::symbol("pi") * Expr::symbol("r") + Expr::sin(Expr::symbol("theta"));
        let names: Vec<_> = e.free_symbols().into_iter().collect();
        assert_eq!(names, vec!["r".to_string(), "theta".to_string()]);
    }

    #[test]
    fn test_substitute_values() {
        let e = Expr::symbol("M") / Expr::symbol("r");
        let values = BTreeMap::from([("M".to_string(), 1.5)]);
        let out = e.substitute_values(&values).unwrap();
        assert!(!out.depends_on("M"));
        assert!(out.depends_on("r"));

        let bad = BTreeMap::from([("M".to_string(), f64::INFINITY)]);
        assert!(matches!(
            e.substitute_values(&bad),
            Err(SymbolicError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn test_inverse_composition_detection() {
        let x = Expr::symbol("x");
        assert!(Expr::exp(Expr::ln(x.clone())).contains_inverse_composition());
        assert!(!Expr::exp(Expr::sin(x)).contains_inverse_composition());
    }
}
