use thiserror::Error;

/// Failure of [`crate::solve`]. `E` is the error type of the system's
/// right-hand side.
#[derive(Debug, Error)]
pub enum SolveError<E: std::error::Error + 'static> {
    #[error("invalid solver input: {0}")]
    InvalidInput(String),

    #[error("step size {h:e} fell below the minimum at t = {t}")]
    StepSizeUnderflow { t: f64, h: f64 },

    #[error("exceeded {steps} steps at t = {t} before reaching the end of the span")]
    MaxStepsExceeded { steps: usize, t: f64 },

    #[error("state became non-finite at t = {t}")]
    NonFiniteState { t: f64 },

    #[error("right-hand side failed at t = {t}: {source}")]
    Rhs {
        t: f64,
        #[source]
        source: E,
    },
}
