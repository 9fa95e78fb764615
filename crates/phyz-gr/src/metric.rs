//! The metric tensor, its determinant and its inverse.

use phyz_symbolic::{Expr, ZeroTest};

use crate::coords::CoordinateSystem;
use crate::definition::{ParameterValues, TensorDefinition};
use crate::error::{GrError, Result};
use crate::tensor::{Components2, DIM, zeros2};

/// A symmetric 4×4 metric over a fixed coordinate system.
///
/// Components are kept exactly as parsed; nothing is simplified until a
/// downstream stage needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    coordinates: CoordinateSystem,
    components: Components2,
}

impl Metric {
    pub fn new(coordinates: CoordinateSystem, components: Components2) -> Self {
        let metric = Self {
            coordinates,
            components,
        };
        if let Some((i, j)) = metric.first_asymmetry() {
            tracing::warn!(
                i,
                j,
                "metric component ({i},{j}) differs from ({j},{i}); results assume a symmetric metric"
            );
        }
        metric
    }

    pub fn from_definition(def: &TensorDefinition) -> Result<Self> {
        let coordinates = def.coordinate_system()?;
        let components = def.parse_components("metric")?;
        Ok(Self::new(coordinates, components))
    }

    pub fn coordinates(&self) -> &CoordinateSystem {
        &self.coordinates
    }

    pub fn components(&self) -> &Components2 {
        &self.components
    }

    pub fn component(&self, mu: usize, nu: usize) -> &Expr {
        &self.components[mu][nu]
    }

    fn first_asymmetry(&self) -> Option<(usize, usize)> {
        for i in 0..DIM {
            for j in (i + 1)..DIM {
                let (a, b) = (&self.components[i][j], &self.components[j][i]);
                if a == b {
                    continue;
                }
                if !matches!((a - b).zero_test(), Ok(ZeroTest::Zero)) {
                    return Some((i, j));
                }
            }
        }
        None
    }

    /// Determinant by cofactor expansion along the first row, simplified.
    pub fn determinant(&self) -> Result<Expr> {
        let all = [0, 1, 2, 3];
        minor(&self.components, &all, &all)
            .simplify()
            .map_err(GrError::computation("determinant", "g"))
    }

    /// Inverse metric through the adjugate.
    ///
    /// Fails with [`GrError::Singularity`] when the determinant is exactly
    /// zero and with [`GrError::IndeterminateDeterminant`] when that cannot be
    /// decided.
    pub fn inverse(&self) -> Result<Components2> {
        let _span = tracing::debug_span!("inverse_metric").entered();
        let det = self.determinant()?;
        match det.zero_test().map_err(GrError::computation("determinant", "g"))? {
            ZeroTest::Zero => {
                return Err(GrError::Singularity {
                    determinant: det.to_string(),
                });
            }
            ZeroTest::Undecided => {
                return Err(GrError::IndeterminateDeterminant {
                    determinant: det.to_string(),
                });
            }
            ZeroTest::NonZero => {}
        }

        let mut inv = zeros2();
        for i in 0..DIM {
            for j in i..DIM {
                // (g^-1)_ij = C_ji / det, with C the cofactor matrix.
                let rows = complement(j);
                let cols = complement(i);
                let cofactor = minor(&self.components, &rows, &cols);
                if cofactor.is_zero() {
                    continue;
                }
                let signed = if (i + j) % 2 == 0 { cofactor } else { -cofactor };
                let entry = (signed / det.clone())
                    .simplify()
                    .map_err(GrError::computation("inverse metric", format!("g^{i}{j}")))?;
                inv[i][j] = entry.clone();
                inv[j][i] = entry;
            }
        }
        tracing::debug!(
            stage = "inverse_metric",
            nonzero = crate::tensor::count_nonzero(crate::tensor::iter2(&inv)),
            "computed inverse metric"
        );
        Ok(inv)
    }

    /// Substitute numeric parameter values into every component.
    ///
    /// Parameters may not shadow coordinates.
    pub fn substitute_values(&self, params: &ParameterValues) -> Result<Metric> {
        if let Some(name) = params.keys().find(|p| self.coordinates.contains(p)) {
            return Err(GrError::Validation(format!(
                "parameter '{name}' names a coordinate"
            )));
        }
        let mut components = zeros2();
        for i in 0..DIM {
            for j in 0..DIM {
                components[i][j] = self.components[i][j]
                    .substitute_values(params)
                    .map_err(|e| GrError::Validation(e.to_string()))?;
            }
        }
        Ok(Metric {
            coordinates: self.coordinates.clone(),
            components,
        })
    }
}

/// Indices 0..4 with `skip` removed.
fn complement(skip: usize) -> [usize; DIM - 1] {
    let mut out = [0; DIM - 1];
    let mut k = 0;
    for i in 0..DIM {
        if i != skip {
            out[k] = i;
            k += 1;
        }
    }
    out
}

/// Determinant of the submatrix selected by `rows` and `cols`, expanded
/// recursively along its first row. Literal zeros are skipped.
fn minor(m: &Components2, rows: &[usize], cols: &[usize]) -> Expr {
    match rows {
        [] => Expr::one(),
        [r] => m[*r][cols[0]].clone(),
        [r, rest @ ..] => {
            let mut terms = Vec::new();
            for (k, &c) in cols.iter().enumerate() {
                let entry = &m[*r][c];
                if entry.is_zero() {
                    continue;
                }
                let sub_cols: Vec<usize> = cols.iter().copied().filter(|&x| x != c).collect();
                let sub = minor(m, rest, &sub_cols);
                if sub.is_zero() {
                    continue;
                }
                let term = Expr::product([entry.clone(), sub]);
                terms.push(if k % 2 == 0 { term } else { -term });
            }
            Expr::sum(terms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn metric(diag: [&str; 4]) -> Metric {
        Metric::from_definition(&TensorDefinition::diagonal(diag)).unwrap()
    }

    fn simp(text: &str) -> Expr {
        text.parse::<Expr>().unwrap().simplify().unwrap()
    }

    #[test]
    fn test_minkowski_inverse_is_itself() {
        let g = metric(["-1", "1", "1", "1"]);
        assert_eq!(g.determinant().unwrap(), Expr::int(-1));
        let inv = g.inverse().unwrap();
        assert_eq!(&inv, g.components());
    }

    #[test]
    fn test_spherical_determinant() {
        let g = metric(["-1", "1", "r**2", "r**2*sin(theta)**2"]);
        assert_eq!(g.determinant().unwrap(), simp("-r**4*sin(theta)**2"));
        let inv = g.inverse().unwrap();
        assert_eq!(inv[3][3], simp("1/(r**2*sin(theta)**2)"));
    }

    #[test]
    fn test_off_diagonal_inverse() {
        let def = TensorDefinition::new(
            ["t", "x", "y", "z"],
            [
                ["-1", "a", "0", "0"],
                ["a", "1", "0", "0"],
                ["0", "0", "1", "0"],
                ["0", "0", "0", "1"],
            ],
        );
        let g = Metric::from_definition(&def).unwrap();
        let inv = g.inverse().unwrap();
        for i in 0..DIM {
            for j in 0..DIM {
                let sum = Expr::sum((0..DIM).map(|k| &g.components()[i][k] * &inv[k][j]));
                let expected = if i == j { Expr::one() } else { Expr::zero() };
                assert_eq!(sum.simplify().unwrap(), expected, "({i},{j})");
            }
        }
    }

    #[test]
    fn test_singular_metric() {
        let err = metric(["-1", "1", "0", "1"]).inverse().unwrap_err();
        assert!(matches!(err, GrError::Singularity { .. }), "{err}");
        let def = TensorDefinition::new(
            ["t", "x", "y", "z"],
            [
                ["r", "r", "0", "0"],
                ["r", "r", "0", "0"],
                ["0", "0", "1", "0"],
                ["0", "0", "0", "1"],
            ],
        );
        let err = Metric::from_definition(&def).unwrap().inverse().unwrap_err();
        assert!(matches!(err, GrError::Singularity { .. }), "{err}");
    }

    #[test]
    fn test_undecidable_determinant() {
        let err = metric(["-1", "1", "r**2", "exp(log(r)) - r"]).inverse().unwrap_err();
        assert!(matches!(err, GrError::IndeterminateDeterminant { .. }), "{err}");
        assert_eq!(err.kind(), ErrorKind::Computation);
    }

    #[test]
    fn test_substitution_rejects_coordinates() {
        let g = metric(["-(1 - 2*M/r)", "1/(1 - 2*M/r)", "r**2", "r**2*sin(theta)**2"]);
        let params = ParameterValues::from([("M".to_owned(), 1.0)]);
        let sub = g.substitute_values(&params).unwrap();
        assert_eq!(sub.component(0, 0).simplify().unwrap(), simp("2/r - 1"));
        let params = ParameterValues::from([("r".to_owned(), 1.0)]);
        assert!(matches!(
            g.substitute_values(&params),
            Err(GrError::Validation(_))
        ));
    }
}
