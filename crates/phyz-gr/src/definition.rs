//! Serde boundary types for tensor inputs.

use std::collections::BTreeMap;

use phyz_symbolic::{Expr, parse};
use serde::{Deserialize, Serialize};

use crate::coords::{CoordinateSystem, default_coordinates};
use crate::error::{GrError, Result};
use crate::tensor::{Components2, DIM};

/// Numeric values for free parameters such as `M`.
pub type ParameterValues = BTreeMap<String, f64>;

/// A rank-2 tensor as supplied by a caller: coordinate names plus a 4×4 grid
/// of expression strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorDefinition {
    #[serde(default = "default_coordinates", alias = "coords")]
    pub coordinates: Vec<String>,
    pub components: Vec<Vec<String>>,
}

impl TensorDefinition {
    pub fn new<S: Into<String>>(coordinates: [S; DIM], components: [[&str; DIM]; DIM]) -> Self {
        Self {
            coordinates: coordinates.into_iter().map(Into::<String>::into).collect(),
            components: components
                .iter()
                .map(|row| row.iter().map(|c| (*c).to_owned()).collect())
                .collect(),
        }
    }

    /// Diagonal metric over the default `(t, r, theta, phi)` coordinates.
    pub fn diagonal(diagonal: [&str; DIM]) -> Self {
        let components = (0..DIM)
            .map(|i| {
                (0..DIM)
                    .map(|j| if i == j { diagonal[i].to_owned() } else { "0".to_owned() })
                    .collect()
            })
            .collect();
        Self {
            coordinates: default_coordinates(),
            components,
        }
    }

    pub fn coordinate_system(&self) -> Result<CoordinateSystem> {
        CoordinateSystem::new(&self.coordinates)
    }

    pub(crate) fn parse_components(&self, what: &str) -> Result<Components2> {
        parse_grid(&self.components, what)
    }
}

/// Parse a 4×4 grid of expression strings. The shape is checked before any
/// entry is parsed.
pub(crate) fn parse_grid(grid: &[Vec<String>], what: &str) -> Result<Components2> {
    if grid.len() != DIM || grid.iter().any(|row| row.len() != DIM) {
        let shape: Vec<usize> = grid.iter().map(Vec::len).collect();
        return Err(GrError::Validation(format!(
            "{what} must be a {DIM}x{DIM} grid, got rows of lengths {shape:?}"
        )));
    }
    let mut out: Components2 = crate::tensor::zeros2();
    for (i, row) in grid.iter().enumerate() {
        for (j, text) in row.iter().enumerate() {
            out[i][j] = parse_entry(text, &format!("{what} component ({i},{j})"))?;
        }
    }
    Ok(out)
}

pub(crate) fn parse_entry(text: &str, what: &str) -> Result<Expr> {
    parse(text).map_err(|e| GrError::Validation(format!("{what} '{text}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_is_checked() {
        let def = TensorDefinition {
            coordinates: default_coordinates(),
            components: vec![vec!["1".into(); 4]; 3],
        };
        let err = def.parse_components("metric").unwrap_err();
        assert!(matches!(err, GrError::Validation(_)));
    }

    #[test]
    fn test_parse_error_names_the_entry() {
        let mut def = TensorDefinition::diagonal(["-1", "1", "1", "1"]);
        def.components[2][1] = "(r + 2".into();
        let msg = def.parse_components("metric").unwrap_err().to_string();
        assert!(msg.contains("(2,1)"), "{msg}");
    }

    #[test]
    fn test_coords_alias_and_default() {
        let def: TensorDefinition = serde_json::from_str(
            r#"{"coords": ["t","x","y","z"], "components": [["-1","0","0","0"],["0","1","0","0"],["0","0","1","0"],["0","0","0","1"]]}"#,
        )
        .unwrap();
        assert_eq!(def.coordinates[1], "x");
        let def: TensorDefinition =
            serde_json::from_str(r#"{"components": [["1","0","0","0"],["0","1","0","0"],["0","0","1","0"],["0","0","0","1"]]}"#)
                .unwrap();
        assert_eq!(def.coordinates, default_coordinates());
    }
}
