//! Error type shared by every symbolic operation.

use thiserror::Error;

/// Errors raised while parsing, transforming or evaluating expressions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SymbolicError {
    #[error("parse error at offset {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("exponent {0} is too large to expand")]
    ExponentTooLarge(String),

    #[error("unbound symbol '{0}'")]
    UnboundSymbol(String),

    #[error("value for '{name}' is not finite")]
    NonFiniteValue { name: String },

    #[error("domain error: {0}")]
    Domain(String),
}

pub type Result<T> = std::result::Result<T, SymbolicError>;
