//! Plain-text and LaTeX rendering.

use std::fmt;

use num_traits::{One, Signed};

use crate::expr::{Expr, Func, Rational};

const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_POW: u8 = 3;
const PREC_ATOM: u8 = 4;

const GREEK: [&str; 35] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta", "eta", "theta",
    "vartheta", "iota", "kappa", "lambda", "mu", "nu", "xi", "pi", "rho", "sigma", "tau",
    "upsilon", "phi", "varphi", "chi", "psi", "omega", "Gamma", "Delta", "Theta", "Lambda", "Xi",
    "Pi", "Sigma", "Phi", "Omega",
];

/// A product split into sign, coefficient, numerator and denominator factors.
struct Fraction<'a> {
    negative: bool,
    coefficient: Rational,
    numer: Vec<&'a Expr>,
    denom: Vec<Expr>,
}

impl<'a> Fraction<'a> {
    fn split(factors: &'a [Expr]) -> Self {
        let mut coefficient = Rational::one();
        let mut numer = Vec::new();
        let mut denom = Vec::new();
        for f in factors {
            match f {
                Expr::Num(q) => coefficient *= q,
                Expr::Pow(base, exp) => match exp.as_ref() {
                    Expr::Num(e) if e.is_negative() => {
                        denom.push(Expr::pow((**base).clone(), Expr::Num(-e)));
                    }
                    _ => numer.push(f),
                },
                _ => numer.push(f),
            }
        }
        let negative = coefficient.is_negative();
        Self {
            negative,
            coefficient: coefficient.abs(),
            numer,
            denom,
        }
    }
}

fn precedence(e: &Expr) -> u8 {
    match e {
        Expr::Num(q) => {
            if q.is_negative() {
                PREC_ADD
            } else if q.is_integer() {
                PREC_ATOM
            } else {
                PREC_MUL
            }
        }
        Expr::Sym(_) | Expr::Func(..) => PREC_ATOM,
        Expr::Add(_) => PREC_ADD,
        Expr::Mul(_) => PREC_MUL,
        Expr::Pow(_, exp) => match exp.as_ref() {
            Expr::Num(e) if e.is_negative() => PREC_MUL,
            Expr::Num(e) if is_half(e) => PREC_ATOM,
            _ => PREC_POW,
        },
    }
}

fn is_half(q: &Rational) -> bool {
    *q.numer() == 1.into() && *q.denom() == 2.into()
}

/// Split a term into (is_negative, magnitude) for sum rendering.
fn signed_term(e: &Expr) -> (bool, Expr) {
    match e {
        Expr::Num(q) if q.is_negative() => (true, Expr::Num(-q)),
        Expr::Mul(items) => match items.first() {
            Some(Expr::Num(q)) if q.is_negative() => {
                let mut rest = items.clone();
                rest[0] = Expr::Num(-q);
                (true, Expr::product(rest))
            }
            _ => (false, e.clone()),
        },
        _ => (false, e.clone()),
    }
}

// ----------------------------------------------------------------------------
// Plain text
// ----------------------------------------------------------------------------

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&plain(self))
    }
}

fn plain_wrapped(e: &Expr, min_prec: u8) -> String {
    let s = plain(e);
    if precedence(e) < min_prec {
        format!("({s})")
    } else {
        s
    }
}

fn plain(e: &Expr) -> String {
    match e {
        Expr::Num(q) => {
            if q.is_integer() {
                q.numer().to_string()
            } else {
                format!("{}/{}", q.numer(), q.denom())
            }
        }
        Expr::Sym(name) => name.clone(),
        Expr::Add(terms) => {
            let mut out = String::new();
            for (i, term) in terms.iter().enumerate() {
                let (negative, magnitude) = signed_term(term);
                let body = plain_wrapped(&magnitude, PREC_MUL);
                match (i, negative) {
                    (0, true) => out.push_str(&format!("-{body}")),
                    (0, false) => out.push_str(&body),
                    (_, true) => out.push_str(&format!(" - {body}")),
                    (_, false) => out.push_str(&format!(" + {body}")),
                }
            }
            out
        }
        Expr::Mul(factors) => plain_product(factors),
        Expr::Pow(base, exp) => match exp.as_ref() {
            Expr::Num(q) if q.is_negative() => plain_product(std::slice::from_ref(e)),
            Expr::Num(q) if is_half(q) => format!("sqrt({})", plain(base)),
            _ => format!(
                "{}**{}",
                plain_wrapped(base, PREC_ATOM),
                plain_wrapped(exp, PREC_ATOM)
            ),
        },
        Expr::Func(func, arg) => format!("{}({})", func.name(), plain(arg)),
    }
}

fn plain_product(factors: &[Expr]) -> String {
    let frac = Fraction::split(factors);
    let mut numer: Vec<String> = Vec::new();
    if !frac.coefficient.numer().is_one() || frac.numer.is_empty() {
        numer.push(frac.coefficient.numer().to_string());
    }
    numer.extend(frac.numer.iter().map(|f| plain_wrapped(f, PREC_MUL)));
    let mut out = String::new();
    if frac.negative {
        out.push('-');
    }
    out.push_str(&numer.join("*"));

    let mut denom: Vec<String> = Vec::new();
    if !frac.coefficient.denom().is_one() {
        denom.push(frac.coefficient.denom().to_string());
    }
    let denom_count = denom.len() + frac.denom.len();
    denom.extend(frac.denom.iter().map(|f| {
        if denom_count == 1 {
            plain_wrapped(f, PREC_POW)
        } else {
            plain_wrapped(f, PREC_MUL)
        }
    }));
    match denom.len() {
        0 => {}
        1 => out.push_str(&format!("/{}", denom[0])),
        _ => out.push_str(&format!("/({})", denom.join("*"))),
    }
    out
}

// ----------------------------------------------------------------------------
// LaTeX
// ----------------------------------------------------------------------------

impl Expr {
    /// Render as a LaTeX math-mode string.
    pub fn to_latex(&self) -> String {
        latex(self)
    }
}

/// LaTeX name of a symbol: Greek names become macros and a trailing
/// `_suffix` becomes a subscript.
pub fn latex_symbol(name: &str) -> String {
    let (head, sub) = match name.split_once('_') {
        Some((h, s)) if !h.is_empty() && !s.is_empty() => (h, Some(s)),
        _ => (name, None),
    };
    let head = if GREEK.contains(&head) {
        format!("\\{head}")
    } else {
        head.to_string()
    };
    match sub {
        Some(s) => format!("{head}_{{{}}}", latex_symbol(s)),
        None => head,
    }
}

fn latex_wrapped(e: &Expr, min_prec: u8) -> String {
    let s = latex(e);
    if precedence(e) < min_prec {
        format!("\\left({s}\\right)")
    } else {
        s
    }
}

fn latex_func_name(func: Func) -> &'static str {
    match func {
        Func::Sin => "\\sin",
        Func::Cos => "\\cos",
        Func::Tan => "\\tan",
        Func::Exp => "\\exp",
        Func::Log => "\\log",
        Func::Sinh => "\\sinh",
        Func::Cosh => "\\cosh",
        Func::Tanh => "\\tanh",
        Func::Asin => "\\operatorname{asin}",
        Func::Acos => "\\operatorname{acos}",
        Func::Atan => "\\operatorname{atan}",
    }
}

fn latex_rational(q: &Rational) -> String {
    if q.is_integer() {
        q.numer().to_string()
    } else if q.is_negative() {
        format!("- \\frac{{{}}}{{{}}}", -q.numer(), q.denom())
    } else {
        format!("\\frac{{{}}}{{{}}}", q.numer(), q.denom())
    }
}

fn latex(e: &Expr) -> String {
    match e {
        Expr::Num(q) => latex_rational(q),
        Expr::Sym(name) => latex_symbol(name),
        Expr::Add(terms) => {
            let mut out = String::new();
            for (i, term) in terms.iter().enumerate() {
                let (negative, magnitude) = signed_term(term);
                let body = latex_wrapped(&magnitude, PREC_MUL);
                match (i, negative) {
                    (0, true) => out.push_str(&format!("- {body}")),
                    (0, false) => out.push_str(&body),
                    (_, true) => out.push_str(&format!(" - {body}")),
                    (_, false) => out.push_str(&format!(" + {body}")),
                }
            }
            out
        }
        Expr::Mul(factors) => latex_product(factors),
        Expr::Pow(base, exp) => match exp.as_ref() {
            Expr::Num(q) if q.is_negative() => latex_product(std::slice::from_ref(e)),
            Expr::Num(q) if is_half(q) => format!("\\sqrt{{{}}}", latex(base)),
            Expr::Num(q) if *q.numer() == 1.into() => {
                format!("\\sqrt[{}]{{{}}}", q.denom(), latex(base))
            }
            _ => {
                let exp_text = match exp.as_ref() {
                    Expr::Num(q) => latex_rational(q),
                    other => latex(other),
                };
                match base.as_ref() {
                    Expr::Func(func, arg) if *func != Func::Exp => format!(
                        "{}^{{{}}}\\left({}\\right)",
                        latex_func_name(*func),
                        exp_text,
                        latex(arg)
                    ),
                    _ => format!("{}^{{{}}}", latex_wrapped(base, PREC_ATOM), exp_text),
                }
            }
        },
        Expr::Func(Func::Exp, arg) => format!("e^{{{}}}", latex(arg)),
        Expr::Func(func, arg) => {
            format!("{}\\left({}\\right)", latex_func_name(*func), latex(arg))
        }
    }
}

fn latex_product(factors: &[Expr]) -> String {
    let frac = Fraction::split(factors);
    let mut numer: Vec<String> = Vec::new();
    if !frac.coefficient.numer().is_one() || frac.numer.is_empty() {
        numer.push(frac.coefficient.numer().to_string());
    }
    numer.extend(frac.numer.iter().map(|f| latex_wrapped(f, PREC_MUL)));
    let numer = numer.join(" ");

    let mut denom: Vec<String> = Vec::new();
    if !frac.coefficient.denom().is_one() {
        denom.push(frac.coefficient.denom().to_string());
    }
    denom.extend(frac.denom.iter().map(|f| latex_wrapped(f, PREC_MUL)));

    let sign = if frac.negative { "- " } else { "" };
    if denom.is_empty() {
        format!("{sign}{numer}")
    } else {
        format!("{sign}\\frac{{{numer}}}{{{}}}", denom.join(" "))
    }
}
