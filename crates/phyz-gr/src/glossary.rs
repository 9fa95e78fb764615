//! Read-only glossary of relativity terms.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GrError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionItem {
    pub term: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Definitions keyed by lower-case identifiers. Built once and shared
/// read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Glossary {
    entries: BTreeMap<String, DefinitionItem>,
}

impl Glossary {
    pub fn new(entries: impl IntoIterator<Item = (String, DefinitionItem)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
        }
    }

    /// Parse a JSON object mapping keys to definition items.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, DefinitionItem> = serde_json::from_str(text)
            .map_err(|e| GrError::Validation(format!("invalid glossary: {e}")))?;
        Ok(Self::new(raw))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GrError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn builtin() -> Self {
        let item = |key: &str, term: &str, definition: &str, latex: Option<&str>| {
            (
                key.to_owned(),
                DefinitionItem {
                    term: term.to_owned(),
                    definition: definition.to_owned(),
                    latex: latex.map(str::to_owned),
                    category: Some("general relativity".to_owned()),
                },
            )
        };
        Self::new([
            item("metric", "Metric tensor", "Symmetric rank-2 tensor encoding spacetime distances.", Some("g_{\\mu\\nu}")),
            item(
                "christoffel",
                "Christoffel symbols",
                "Connection coefficients describing how coordinate basis vectors change; inputs to curvature and geodesic equations.",
                Some("\\Gamma^{\\lambda}_{\\mu\\nu}"),
            ),
            item("riemann", "Riemann tensor", "Rank-4 tensor fully encoding spacetime curvature.", Some("R^{\\rho}_{\\sigma\\mu\\nu}")),
            item("ricci", "Ricci tensor and scalar", "Partial and full traces of the Riemann tensor.", Some("R_{\\mu\\nu}")),
            item(
                "einstein",
                "Einstein tensor",
                "Curvature combination appearing in the Einstein Field Equations.",
                Some("G_{\\mu\\nu} = R_{\\mu\\nu} - \\frac{1}{2} g_{\\mu\\nu} R"),
            ),
            item(
                "stress_energy",
                "Stress-energy tensor",
                "Encodes the matter and energy content sourcing curvature.",
                Some("T_{\\mu\\nu}"),
            ),
            item("efe", "Einstein Field Equations", "G = κT, the governing equation of general relativity.", Some("G_{\\mu\\nu} = \\kappa T_{\\mu\\nu}")),
            item("geodesic", "Geodesic", "The path of a free-falling particle; solution of the geodesic ODE system.", None),
            item(
                "affine_parameter",
                "Affine parameter",
                "The independent variable parametrizing a geodesic (proper time for timelike paths).",
                Some("\\tau"),
            ),
            item("four_velocity", "Four-velocity", "Rank-1 tangent vector to a worldline.", Some("u^{\\mu}")),
            item(
                "flamm",
                "Flamm's paraboloid",
                "An embedding of a spherically symmetric spatial slice into flat 3-D space for visualization.",
                Some("z(r) = \\int \\sqrt{g_{rr} - 1}\\, dr"),
            ),
            item(
                "event_horizon",
                "Event horizon",
                "Coordinate radius (r = 2M for Schwarzschild) where standard coordinates become singular.",
                Some("r = 2M"),
            ),
        ])
    }

    pub fn get(&self, key: &str) -> Option<&DefinitionItem> {
        self.entries.get(&key.to_lowercase())
    }

    pub fn entries(&self) -> &BTreeMap<String, DefinitionItem> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_builtin_lookup_is_case_insensitive() {
        let g = Glossary::builtin();
        assert_eq!(g.get("Riemann").unwrap().term, "Riemann tensor");
        assert_eq!(g.get("EFE").unwrap().term, "Einstein Field Equations");
        assert!(g.get("wormhole").is_none());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definitions.json");
        std::fs::write(
            &path,
            r#"{"Kerr": {"term": "Kerr metric", "definition": "Rotating black hole solution."}}"#,
        )
        .unwrap();
        let g = Glossary::from_path(&path).unwrap();
        assert_eq!(g.len(), 1);
        let kerr = g.get("kerr").unwrap();
        assert!(kerr.latex.is_none());
        assert!(Glossary::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = Glossary::from_path(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(matches!(&err, GrError::Io { path: p, .. } if *p == path), "{err}");
    }
}
