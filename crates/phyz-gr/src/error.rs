//! Error taxonomy for the relativity pipeline.

use std::path::PathBuf;

use phyz_symbolic::SymbolicError;
use serde::Serialize;
use thiserror::Error;

/// Coarse category of a [`GrError`], for callers that map failures onto
/// status codes or exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input: shapes, coordinate lists, unknown variants.
    Validation,
    /// The metric determinant is exactly zero.
    Singularity,
    /// The symbolic phase failed.
    Computation,
    /// The numeric phase failed.
    RuntimeComputation,
    /// A resource file could not be read.
    Io,
}

#[derive(Debug, Error)]
pub enum GrError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("metric is singular: determinant {determinant} simplifies to zero")]
    Singularity { determinant: String },

    #[error("cannot decide whether the metric determinant {determinant} is zero")]
    IndeterminateDeterminant { determinant: String },

    #[error("{stage} failed for {context}: {source}")]
    Computation {
        stage: &'static str,
        context: String,
        #[source]
        source: SymbolicError,
    },

    /// Every component of a tensor whose simplification failed, in
    /// row-major order.
    #[error("{stage} failed for {}", describe(.failures))]
    ComponentFailures {
        stage: &'static str,
        failures: Vec<ComponentFailure>,
    },

    #[error("symbolic integration failed for {integrand}")]
    IntegrationFailed { integrand: String },

    #[error("runtime computation error: {0}")]
    RuntimeComputation(String),

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GrError::Validation(_) => ErrorKind::Validation,
            GrError::Singularity { .. } => ErrorKind::Singularity,
            GrError::IndeterminateDeterminant { .. }
            | GrError::Computation { .. }
            | GrError::ComponentFailures { .. }
            | GrError::IntegrationFailed { .. } => ErrorKind::Computation,
            GrError::RuntimeComputation(_) => ErrorKind::RuntimeComputation,
            GrError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Adapter for `map_err` on symbolic operations.
    pub(crate) fn computation(
        stage: &'static str,
        context: impl Into<String>,
    ) -> impl FnOnce(SymbolicError) -> GrError {
        let context = context.into();
        move |source| GrError::Computation {
            stage,
            context,
            source,
        }
    }
}

/// A single rank-2 component that could not be computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentFailure {
    pub mu: usize,
    pub nu: usize,
    pub source: SymbolicError,
}

fn describe(failures: &[ComponentFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("({},{}): {}", f.mu, f.nu, f.source))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, GrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indeterminate_is_a_computation_error() {
        let err = GrError::IndeterminateDeterminant {
            determinant: "exp(log(r)) - r".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Computation);
        let err = GrError::Singularity {
            determinant: "0".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Singularity);
    }

    #[test]
    fn test_component_failures_list_every_index() {
        let err = GrError::ComponentFailures {
            stage: "einstein tensor",
            failures: vec![
                ComponentFailure { mu: 0, nu: 1, source: SymbolicError::DivisionByZero },
                ComponentFailure { mu: 2, nu: 3, source: SymbolicError::DivisionByZero },
            ],
        };
        assert_eq!(err.kind(), ErrorKind::Computation);
        assert_eq!(
            err.to_string(),
            "einstein tensor failed for (0,1): division by zero; (2,3): division by zero"
        );
    }

    #[test]
    fn test_computation_context_in_message() {
        let err = GrError::computation("christoffel", "Γ^1_00")(SymbolicError::DivisionByZero);
        let msg = err.to_string();
        assert!(msg.contains("christoffel"), "{msg}");
        assert!(msg.contains("Γ^1_00"), "{msg}");
    }
}
