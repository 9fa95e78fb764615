//! Explicit Runge-Kutta integration of first-order ODE systems.
//!
//! Systems implement [`OdeSystem`] over `nalgebra::DVector<f64>` states and
//! may fail in their right-hand side. [`solve`] drives an embedded pair with
//! adaptive step control (Dormand-Prince 5(4) by default, or Fehlberg 4(5)),
//! or classical RK4 with a fixed step, and samples the solution exactly at
//! the requested output times.
//!
//! # Example
//!
//! ```
//! use nalgebra::DVector;
//! use phyz_ode::{OdeSystem, SolverOptions, solve};
//!
//! /// Harmonic oscillator: x'' = -x.
//! struct Oscillator;
//!
//! impl OdeSystem for Oscillator {
//!     type Error = std::convert::Infallible;
//!
//!     fn dim(&self) -> usize {
//!         2
//!     }
//!
//!     fn rhs(&self, _t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) -> Result<(), Self::Error> {
//!         dydt[0] = y[1];
//!         dydt[1] = -y[0];
//!         Ok(())
//!     }
//! }
//!
//! let y0 = DVector::from_vec(vec![1.0, 0.0]);
//! let opts = SolverOptions::default().with_tolerances(1e-9, 1e-12);
//! let sol = solve(&Oscillator, (0.0, std::f64::consts::PI), &y0, Some(&[std::f64::consts::PI]), &opts).unwrap();
//! assert!((sol.y[0][0] + 1.0).abs() < 1e-6);
//! ```

pub mod error;
pub mod options;
pub mod solver;
pub mod system;
mod tableau;

pub use error::SolveError;
pub use options::{Method, SolverOptions};
pub use solver::{Solution, Stats, solve};
pub use system::OdeSystem;
