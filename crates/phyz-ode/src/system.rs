use nalgebra::DVector;

/// System of first-order ODEs: dy/dt = f(t, y).
///
/// The right-hand side may fail, for instance when the state leaves the
/// domain where the model is defined. Such failures abort the solve and are
/// returned as [`crate::SolveError::Rhs`].
pub trait OdeSystem {
    type Error: std::error::Error + 'static;

    /// Dimension of the state vector.
    fn dim(&self) -> usize;

    /// Evaluate f(t, y) into `dydt`.
    fn rhs(&self, t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) -> Result<(), Self::Error>;
}
