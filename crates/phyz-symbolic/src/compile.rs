//! Compilation of expressions into reusable numeric evaluators.
//!
//! Symbols are bound to argument slots once at compile time; evaluation then
//! walks a compact tree of `f64` operations with no name lookups.

use std::f64::consts::PI;

use num_complex::Complex64;
use num_traits::ToPrimitive;

use crate::error::{Result, SymbolicError};
use crate::expr::{Expr, Func, PI_SYMBOL, rational_to_f64};

#[derive(Debug, Clone)]
enum Node {
    Const(f64),
    Slot(usize),
    Sum(Vec<Node>),
    Product(Vec<Node>),
    Powi(Box<Node>, i32),
    Powf(Box<Node>, f64),
    Pow(Box<Node>, Box<Node>),
    Apply(Func, Box<Node>),
}

/// An expression bound to a fixed list of argument names.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    node: Node,
    arity: usize,
}

impl CompiledExpr {
    /// Compile `expr`, mapping each symbol to its index in `slots`.
    ///
    /// The symbol `pi` is bound to π unless it appears in `slots`. Any other
    /// symbol missing from `slots` is an [`SymbolicError::UnboundSymbol`].
    pub fn compile(expr: &Expr, slots: &[&str]) -> Result<Self> {
        Ok(Self {
            node: lower(expr, slots)?,
            arity: slots.len(),
        })
    }

    /// A compiled constant, useful for structurally zero entries.
    pub fn constant(value: f64, arity: usize) -> Self {
        Self {
            node: Node::Const(value),
            arity,
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Evaluate over the reals, rejecting any step that leaves the real
    /// domain or produces a non-finite value.
    pub fn eval(&self, args: &[f64]) -> Result<f64> {
        if args.len() < self.arity {
            return Err(SymbolicError::Domain(format!(
                "expected {} arguments, got {}",
                self.arity,
                args.len()
            )));
        }
        eval_real(&self.node, args)
    }

    /// Evaluate over the complex numbers using principal branches.
    pub fn eval_complex(&self, args: &[Complex64]) -> Complex64 {
        eval_complex(&self.node, args)
    }
}

fn lower(expr: &Expr, slots: &[&str]) -> Result<Node> {
    Ok(match expr {
        Expr::Num(q) => Node::Const(rational_to_f64(q)),
        Expr::Sym(name) => match slots.iter().position(|s| s == name) {
            Some(idx) => Node::Slot(idx),
            None if name == PI_SYMBOL => Node::Const(PI),
            None => return Err(SymbolicError::UnboundSymbol(name.clone())),
        },
        Expr::Add(terms) => Node::Sum(
            terms
                .iter()
                .map(|t| lower(t, slots))
                .collect::<Result<_>>()?,
        ),
        Expr::Mul(factors) => Node::Product(
            factors
                .iter()
                .map(|f| lower(f, slots))
                .collect::<Result<_>>()?,
        ),
        Expr::Pow(base, exp) => {
            let base = Box::new(lower(base, slots)?);
            match exp.as_ref() {
                Expr::Num(q) if q.is_integer() => match q.to_integer().to_i32() {
                    Some(n) => Node::Powi(base, n),
                    None => Node::Powf(base, rational_to_f64(q)),
                },
                Expr::Num(q) => Node::Powf(base, rational_to_f64(q)),
                other => Node::Pow(base, Box::new(lower(other, slots)?)),
            }
        }
        Expr::Func(func, arg) => Node::Apply(*func, Box::new(lower(arg, slots)?)),
    })
}

fn domain(message: String) -> SymbolicError {
    SymbolicError::Domain(message)
}

fn checked(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(domain(format!("{what} produced a non-finite value")))
    }
}

fn eval_real(node: &Node, args: &[f64]) -> Result<f64> {
    match node {
        Node::Const(c) => Ok(*c),
        Node::Slot(i) => Ok(args[*i]),
        Node::Sum(terms) => {
            let mut acc = 0.0;
            for t in terms {
                acc += eval_real(t, args)?;
            }
            checked(acc, "sum")
        }
        Node::Product(factors) => {
            let mut acc = 1.0;
            for f in factors {
                acc *= eval_real(f, args)?;
            }
            checked(acc, "product")
        }
        Node::Powi(base, n) => {
            let b = eval_real(base, args)?;
            if b == 0.0 && *n < 0 {
                return Err(domain("division by zero".into()));
            }
            checked(b.powi(*n), "power")
        }
        Node::Powf(base, e) => {
            let b = eval_real(base, args)?;
            if b < 0.0 {
                return Err(domain(format!("fractional power {e} of negative value {b}")));
            }
            if b == 0.0 && *e < 0.0 {
                return Err(domain("division by zero".into()));
            }
            checked(b.powf(*e), "power")
        }
        Node::Pow(base, exp) => {
            let b = eval_real(base, args)?;
            let e = eval_real(exp, args)?;
            if b < 0.0 && e.fract() != 0.0 {
                return Err(domain(format!("power {e} of negative value {b}")));
            }
            if b == 0.0 && e < 0.0 {
                return Err(domain("division by zero".into()));
            }
            checked(b.powf(e), "power")
        }
        Node::Apply(func, arg) => {
            let x = eval_real(arg, args)?;
            let value = match func {
                Func::Sin => x.sin(),
                Func::Cos => x.cos(),
                Func::Tan => x.tan(),
                Func::Exp => x.exp(),
                Func::Log => {
                    if x <= 0.0 {
                        return Err(domain(format!("log of non-positive value {x}")));
                    }
                    x.ln()
                }
                Func::Sinh => x.sinh(),
                Func::Cosh => x.cosh(),
                Func::Tanh => x.tanh(),
                Func::Asin | Func::Acos if x.abs() > 1.0 => {
                    return Err(domain(format!("{}({x}) is outside [-1, 1]", func.name())));
                }
                Func::Asin => x.asin(),
                Func::Acos => x.acos(),
                Func::Atan => x.atan(),
            };
            checked(value, func.name())
        }
    }
}

fn eval_complex(node: &Node, args: &[Complex64]) -> Complex64 {
    match node {
        Node::Const(c) => Complex64::new(*c, 0.0),
        Node::Slot(i) => args.get(*i).copied().unwrap_or(Complex64::new(f64::NAN, 0.0)),
        Node::Sum(terms) => terms.iter().map(|t| eval_complex(t, args)).sum(),
        Node::Product(factors) => factors.iter().map(|f| eval_complex(f, args)).product(),
        Node::Powi(base, n) => eval_complex(base, args).powi(*n),
        Node::Powf(base, e) => {
            let b = eval_complex(base, args);
            if *e == 0.5 { b.sqrt() } else { b.powf(*e) }
        }
        Node::Pow(base, exp) => eval_complex(base, args).powc(eval_complex(exp, args)),
        Node::Apply(func, arg) => {
            let z = eval_complex(arg, args);
            match func {
                Func::Sin => z.sin(),
                Func::Cos => z.cos(),
                Func::Tan => z.tan(),
                Func::Exp => z.exp(),
                Func::Log => z.ln(),
                Func::Sinh => z.sinh(),
                Func::Cosh => z.cosh(),
                Func::Tanh => z.tanh(),
                Func::Asin => z.asin(),
                Func::Acos => z.acos(),
                Func::Atan => z.atan(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use approx::assert_relative_eq;

    #[test]
    fn test_eval_binds_slots_in_order() {
        let e = parse("M/r + sin(theta)").unwrap();
        let f = CompiledExpr::compile(&e, &["r", "theta", "M"]).unwrap();
        let value = f.eval(&[2.0, 0.5, 1.0]).unwrap();
        assert_relative_eq!(value, 0.5 + 0.5_f64.sin(), epsilon = 1e-14);
    }

    #[test]
    fn test_unbound_symbol_is_rejected() {
        let e = parse("M/r").unwrap();
        assert_eq!(
            CompiledExpr::compile(&e, &["r"]).unwrap_err(),
            SymbolicError::UnboundSymbol("M".into())
        );
        let pi = CompiledExpr::compile(&parse("2*pi").unwrap(), &[]).unwrap();
        assert_relative_eq!(pi.eval(&[]).unwrap(), 2.0 * PI);
    }

    #[test]
    fn test_domain_errors() {
        let inv = CompiledExpr::compile(&parse("1/(r - 2)").unwrap(), &["r"]).unwrap();
        assert!(matches!(inv.eval(&[2.0]), Err(SymbolicError::Domain(_))));
        let root = CompiledExpr::compile(&parse("sqrt(r - 2)").unwrap(), &["r"]).unwrap();
        assert!(matches!(root.eval(&[1.0]), Err(SymbolicError::Domain(_))));
        let log = CompiledExpr::compile(&parse("log(r)").unwrap(), &["r"]).unwrap();
        assert!(matches!(log.eval(&[0.0]), Err(SymbolicError::Domain(_))));
    }

    #[test]
    fn test_complex_evaluation_of_negative_radicand() {
        let root = CompiledExpr::compile(&parse("sqrt(r - 2)").unwrap(), &["r"]).unwrap();
        let z = root.eval_complex(&[Complex64::new(1.0, 0.0)]);
        assert_relative_eq!(z.re, 0.0, epsilon = 1e-14);
        assert_relative_eq!(z.im, 1.0, epsilon = 1e-14);
    }
}
