use serde::{Deserialize, Serialize};

use crate::tableau::{DOPRI5, RK4, RKF45, Tableau};

/// Integration method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Dormand-Prince 5(4) with first-same-as-last reuse.
    #[default]
    Rk45,
    /// Fehlberg 4(5).
    Rkf45,
    /// Classical Runge-Kutta with a fixed step.
    Rk4,
}

impl Method {
    pub(crate) fn tableau(self) -> &'static Tableau {
        match self {
            Method::Rk45 => &DOPRI5,
            Method::Rkf45 => &RKF45,
            Method::Rk4 => &RK4,
        }
    }
}

/// Solver configuration. Every field has a default, so partial documents
/// deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub method: Method,
    /// Relative tolerance of the local error test.
    pub rtol: f64,
    /// Absolute tolerance of the local error test.
    pub atol: f64,
    /// Initial step magnitude. Chosen automatically when absent. For
    /// [`Method::Rk4`] this is the fixed step, defaulting to 1/100 of the span.
    pub first_step: Option<f64>,
    pub min_step: f64,
    /// Largest step magnitude; unbounded when absent.
    pub max_step: Option<f64>,
    /// Step attempts (accepted and rejected) before giving up.
    pub max_steps: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            method: Method::Rk45,
            rtol: 1e-3,
            atol: 1e-6,
            first_step: None,
            min_step: 1e-12,
            max_step: None,
            max_steps: 100_000,
        }
    }
}

impl SolverOptions {
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    pub(crate) fn max_step(&self) -> f64 {
        self.max_step.unwrap_or(f64::INFINITY)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !(self.rtol >= 0.0 && self.atol >= 0.0) || self.rtol + self.atol <= 0.0 {
            return Err(format!(
                "tolerances must be non-negative and not both zero (rtol = {}, atol = {})",
                self.rtol, self.atol
            ));
        }
        if let Some(h) = self.first_step {
            if !(h.is_finite() && h > 0.0) {
                return Err(format!("first_step must be positive, got {h}"));
            }
        }
        if !(self.min_step >= 0.0) {
            return Err(format!("min_step must be non-negative, got {}", self.min_step));
        }
        if let Some(h) = self.max_step {
            if !(h > 0.0) || h < self.min_step {
                return Err(format!("max_step must be positive and at least min_step, got {h}"));
            }
        }
        if self.max_steps == 0 {
            return Err("max_steps must be at least 1".into());
        }
        Ok(())
    }
}
