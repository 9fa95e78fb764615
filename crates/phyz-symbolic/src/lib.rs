//! Exact symbolic expressions for tensor calculus.
//!
//! Expressions are immutable trees over arbitrary-precision rationals, named
//! symbols and the elementary functions. The crate provides the operations a
//! differential-geometry pipeline needs from a computer-algebra system:
//!
//! - **parse / display**: infix text in, plain text or LaTeX out
//! - **diff**: exact partial derivatives
//! - **simplify**: a canonical rational normal form with exact zero testing
//! - **integrate / limit**: the indefinite integrals and limits at infinity
//!   that arise for radial embedding functions
//! - **compile**: bind symbols to slots once, evaluate many times
//!
//! # Architecture
//!
//! - [`expr`]: the [`Expr`] tree, constructors, substitution and queries
//! - [`parse`]: recursive-descent parser with byte-offset error positions
//! - [`display`]: `Display` and [`Expr::to_latex`]
//! - [`diff`]: sum, product, power and chain rules
//! - [`simplify`]: [`Expr::simplify`] and [`Expr::zero_test`] on top of the
//!   polynomial and normal-form internals
//! - [`integrate`], [`limit`]: rule-based calculus
//! - [`compile`]: [`CompiledExpr`] for real and complex evaluation
//!
//! # Example
//!
//! ```
//! use phyz_symbolic::{parse, ZeroTest};
//!
//! // d/dr of the Schwarzschild g_tt, compared against the known result.
//! let g_tt = parse("-(1 - 2*M/r)").unwrap();
//! let d = g_tt.diff("r");
//! let expected = parse("-2*M/r**2").unwrap();
//! assert_eq!((d - expected).zero_test().unwrap(), ZeroTest::Zero);
//! ```

pub mod compile;
pub mod diff;
pub mod display;
pub mod error;
pub mod expr;
pub mod integrate;
pub mod limit;
mod normal;
pub mod parse;
mod poly;
pub mod simplify;

pub use compile::CompiledExpr;
pub use display::latex_symbol;
pub use error::{Result, SymbolicError};
pub use expr::{Expr, Func, PI_SYMBOL, Rational};
pub use integrate::{Antiderivative, integrate};
pub use limit::{Limit, limit_at_infinity};
pub use parse::parse;
pub use simplify::ZeroTest;
