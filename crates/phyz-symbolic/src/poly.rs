//! Sparse multivariate polynomials with exact rational coefficients.
//!
//! Indeterminates ("kernels") are arbitrary expressions treated as opaque
//! atoms: symbols, function applications, radicals and symbolic powers.
//! Leading terms use the lexicographic order in which a smaller kernel is the
//! more significant variable.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::expr::{Expr, Rational};

/// Product of kernel powers, sorted by kernel, every exponent positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Monomial(Vec<(Expr, u32)>);

impl Monomial {
    pub fn one() -> Self {
        Self(Vec::new())
    }

    pub fn kernel(kernel: Expr, exponent: u32) -> Self {
        if exponent == 0 {
            Self::one()
        } else {
            Self(vec![(kernel, exponent)])
        }
    }

    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    pub fn factors(&self) -> &[(Expr, u32)] {
        &self.0
    }

    pub fn exponent(&self, kernel: &Expr) -> u32 {
        self.0
            .binary_search_by(|(k, _)| k.cmp(kernel))
            .map_or(0, |idx| self.0[idx].1)
    }

    pub fn mul(&self, other: &Self) -> Self {
        let mut out = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            let (ka, ea) = &self.0[i];
            let (kb, eb) = &other.0[j];
            match ka.cmp(kb) {
                Ordering::Less => {
                    out.push((ka.clone(), *ea));
                    i += 1;
                }
                Ordering::Greater => {
                    out.push((kb.clone(), *eb));
                    j += 1;
                }
                Ordering::Equal => {
                    out.push((ka.clone(), ea + eb));
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&self.0[i..]);
        out.extend_from_slice(&other.0[j..]);
        Self(out)
    }

    /// True if `self` divides `other`.
    pub fn divides(&self, other: &Self) -> bool {
        self.0.iter().all(|(k, e)| other.exponent(k) >= *e)
    }

    /// `self / other`; `other` must divide `self`.
    pub fn div(&self, other: &Self) -> Self {
        let out = self
            .0
            .iter()
            .filter_map(|(k, e)| {
                let remaining = e - other.exponent(k).min(*e);
                (remaining > 0).then(|| (k.clone(), remaining))
            })
            .collect();
        Self(out)
    }

    pub fn gcd(&self, other: &Self) -> Self {
        let out = self
            .0
            .iter()
            .filter_map(|(k, e)| {
                let m = other.exponent(k).min(*e);
                (m > 0).then(|| (k.clone(), m))
            })
            .collect();
        Self(out)
    }

    /// Split off the power of `kernel`: returns (rest, exponent).
    pub fn without(&self, kernel: &Expr) -> (Self, u32) {
        let e = self.exponent(kernel);
        let rest = self.0.iter().filter(|(k, _)| k != kernel).cloned().collect();
        (Self(rest), e)
    }

    pub fn lex_cmp(&self, other: &Self) -> Ordering {
        let (mut i, mut j) = (0, 0);
        loop {
            match (self.0.get(i), other.0.get(j)) {
                (None, None) => return Ordering::Equal,
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (Some((ka, ea)), Some((kb, eb))) => match ka.cmp(kb) {
                    Ordering::Less => return Ordering::Greater,
                    Ordering::Greater => return Ordering::Less,
                    Ordering::Equal => {
                        if ea != eb {
                            return ea.cmp(eb);
                        }
                        i += 1;
                        j += 1;
                    }
                },
            }
        }
    }

    pub fn to_expr(&self) -> Expr {
        Expr::product(
            self.0
                .iter()
                .map(|(k, e)| Expr::powi(k.clone(), i64::from(*e))),
        )
    }
}

/// Polynomial as a map from monomial to non-zero coefficient.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Poly {
    terms: BTreeMap<Monomial, Rational>,
}

impl Poly {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::constant(Rational::one())
    }

    pub fn constant(c: Rational) -> Self {
        Self::monomial(Monomial::one(), c)
    }

    pub fn monomial(m: Monomial, c: Rational) -> Self {
        let mut p = Self::zero();
        p.add_term(m, c);
        p
    }

    pub fn kernel(kernel: Expr) -> Self {
        Self::monomial(Monomial::kernel(kernel, 1), Rational::one())
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &Rational)> {
        self.terms.iter()
    }

    pub fn as_constant(&self) -> Option<Rational> {
        match self.terms.len() {
            0 => Some(Rational::zero()),
            1 => self
                .terms
                .iter()
                .next()
                .filter(|(m, _)| m.is_one())
                .map(|(_, c)| c.clone()),
            _ => None,
        }
    }

    /// The kernel `k` if this polynomial is exactly `k`.
    pub fn as_kernel(&self) -> Option<&Expr> {
        let (m, c) = self.terms.iter().next()?;
        match (self.terms.len(), m.factors()) {
            (1, [(k, 1)]) if c.is_one() => Some(k),
            _ => None,
        }
    }

    pub fn add_term(&mut self, m: Monomial, c: Rational) {
        if c.is_zero() {
            return;
        }
        match self.terms.get_mut(&m) {
            Some(existing) => {
                *existing += c;
                if existing.is_zero() {
                    self.terms.remove(&m);
                }
            }
            None => {
                self.terms.insert(m, c);
            }
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        let (mut out, smaller) = if self.len() >= other.len() {
            (self.clone(), other)
        } else {
            (other.clone(), self)
        };
        for (m, c) in &smaller.terms {
            out.add_term(m.clone(), c.clone());
        }
        out
    }

    pub fn neg(&self) -> Self {
        Self {
            terms: self.terms.iter().map(|(m, c)| (m.clone(), -c)).collect(),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    pub fn scale(&self, k: &Rational) -> Self {
        if k.is_zero() {
            return Self::zero();
        }
        Self {
            terms: self.terms.iter().map(|(m, c)| (m.clone(), c * k)).collect(),
        }
    }

    pub fn mul_monomial(&self, m: &Monomial, k: &Rational) -> Self {
        if k.is_zero() {
            return Self::zero();
        }
        Self {
            terms: self.terms.iter().map(|(mm, c)| (mm.mul(m), c * k)).collect(),
        }
    }

    pub fn mul(&self, other: &Self) -> Self {
        let mut out = Self::zero();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                out.add_term(ma.mul(mb), ca * cb);
            }
        }
        out
    }

    pub fn pow(&self, n: u32) -> Self {
        let mut result = Self::one();
        let mut base = self.clone();
        let mut n = n;
        while n > 0 {
            if n & 1 == 1 {
                result = result.mul(&base);
            }
            n >>= 1;
            if n > 0 {
                base = base.mul(&base);
            }
        }
        result
    }

    pub fn leading(&self) -> Option<(&Monomial, &Rational)> {
        self.terms.iter().max_by(|a, b| a.0.lex_cmp(b.0))
    }

    /// Exact quotient `self / divisor`, or `None` if the division leaves a
    /// remainder.
    pub fn div_exact(&self, divisor: &Self) -> Option<Self> {
        let (lm_d, lc_d) = divisor.leading()?;
        let (lm_d, lc_d) = (lm_d.clone(), lc_d.clone());
        let mut rem = self.clone();
        let mut quotient = Self::zero();
        while let Some((lm_r, lc_r)) = rem.leading() {
            if !lm_d.divides(lm_r) {
                return None;
            }
            let m = lm_r.div(&lm_d);
            let c = lc_r / &lc_d;
            rem = rem.sub(&divisor.mul_monomial(&m, &c));
            quotient.add_term(m, c);
        }
        Some(quotient)
    }

    /// Greatest monomial dividing every term.
    pub fn monomial_content(&self) -> Monomial {
        let mut iter = self.terms.keys();
        let Some(first) = iter.next() else {
            return Monomial::one();
        };
        iter.fold(first.clone(), |acc, m| acc.gcd(m))
    }

    pub fn div_monomial(&self, m: &Monomial) -> Self {
        Self {
            terms: self.terms.iter().map(|(mm, c)| (mm.div(m), c.clone())).collect(),
        }
    }

    /// Split into `content * primitive` where the primitive part has coprime
    /// integer coefficients and a positive leading coefficient.
    pub fn primitive(&self) -> (Rational, Self) {
        if self.is_zero() {
            return (Rational::one(), Self::zero());
        }
        let mut numer_gcd = BigInt::zero();
        let mut denom_lcm = BigInt::one();
        for c in self.terms.values() {
            numer_gcd = numer_gcd.gcd(c.numer());
            denom_lcm = denom_lcm.lcm(c.denom());
        }
        let mut content = Rational::new(numer_gcd, denom_lcm);
        if self.leading().is_some_and(|(_, c)| c.is_negative()) {
            content = -content;
        }
        let inverse = content.recip();
        (content, self.scale(&inverse))
    }

    pub fn kernels(&self) -> BTreeSet<&Expr> {
        self.terms
            .keys()
            .flat_map(|m| m.factors().iter().map(|(k, _)| k))
            .collect()
    }

    pub fn degree_in(&self, kernel: &Expr) -> u32 {
        self.terms.keys().map(|m| m.exponent(kernel)).max().unwrap_or(0)
    }

    /// Coefficient of `kernel^n`, as a polynomial in the remaining kernels.
    pub fn coefficient_of(&self, kernel: &Expr, n: u32) -> Self {
        let mut out = Self::zero();
        for (m, c) in &self.terms {
            let (rest, e) = m.without(kernel);
            if e == n {
                out.add_term(rest, c.clone());
            }
        }
        out
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.kernels().into_iter().any(|k| k.depends_on(name))
    }

    /// Terms ordered from leading to trailing.
    pub fn sorted_terms(&self) -> Vec<(&Monomial, &Rational)> {
        let mut terms: Vec<_> = self.terms.iter().collect();
        terms.sort_by(|a, b| b.0.lex_cmp(a.0));
        terms
    }

    pub fn to_expr(&self) -> Expr {
        Expr::sum(
            self.sorted_terms()
                .into_iter()
                .map(|(m, c)| Expr::product([Expr::Num(c.clone()), m.to_expr()])),
        )
    }
}
