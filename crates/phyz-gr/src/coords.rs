use std::fmt;

use phyz_symbolic::{PI_SYMBOL, parse};
use serde::{Deserialize, Serialize};

use crate::error::{GrError, Result};
use crate::tensor::DIM;

/// Ordered coordinate names. Position `i` is tensor index `i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CoordinateSystem {
    names: [String; DIM],
}

impl CoordinateSystem {
    /// Validate a list of exactly four distinct symbol names.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.len() != DIM {
            return Err(GrError::Validation(format!(
                "coordinate list must contain {DIM} names, got {}",
                names.len()
            )));
        }
        for (i, name) in names.iter().enumerate() {
            let name = name.as_ref();
            let is_symbol = parse(name).ok().is_some_and(|e| e.as_symbol() == Some(name));
            if !is_symbol || name == PI_SYMBOL {
                return Err(GrError::Validation(format!(
                    "coordinate {i} ('{name}') is not a valid symbol name"
                )));
            }
            if names[..i].iter().any(|n| n.as_ref() == name) {
                return Err(GrError::Validation(format!(
                    "coordinate '{name}' appears more than once"
                )));
            }
        }
        Ok(Self {
            names: std::array::from_fn(|i| names[i].as_ref().to_owned()),
        })
    }

    pub fn names(&self) -> &[String; DIM] {
        &self.names
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn as_slots(&self) -> [&str; DIM] {
        std::array::from_fn(|i| self.names[i].as_str())
    }
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self {
            names: default_coordinate_names().map(str::to_owned),
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.names.join(", "))
    }
}

impl TryFrom<Vec<String>> for CoordinateSystem {
    type Error = GrError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::new(&names)
    }
}

impl From<CoordinateSystem> for Vec<String> {
    fn from(coords: CoordinateSystem) -> Self {
        coords.names.into()
    }
}

pub(crate) fn default_coordinate_names() -> [&'static str; DIM] {
    ["t", "r", "theta", "phi"]
}

pub(crate) fn default_coordinates() -> Vec<String> {
    default_coordinate_names().map(str::to_owned).into()
}
