//! # CLI configuration
//!
//! Read from `phyz-gr.toml` in the working directory, or from the file given
//! with `--config`. Every field has a default, so the file is optional and
//! may be partial.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use phyz_ode::SolverOptions;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "phyz-gr.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding one `<name>.json` per saved scenario.
    pub scenario_dir: PathBuf,
    /// Glossary file replacing the built-in definitions.
    pub definitions_path: Option<PathBuf>,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Solver settings for geodesic requests that carry none.
    pub solver: SolverOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenario_dir: PathBuf::from("data/scenarios"),
            definitions_path: None,
            log_level: "info".to_owned(),
            solver: SolverOptions::default(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing configuration TOML")
    }

    /// An explicit path must exist. Without one, `phyz-gr.toml` is used when
    /// present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading configuration: {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phyz_ode::Method;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            log_level = "debug"

            [solver]
            method = "rkf45"
            rtol = 1e-9
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.scenario_dir, PathBuf::from("data/scenarios"));
        assert_eq!(config.solver.method, Method::Rkf45);
        assert_eq!(config.solver.rtol, 1e-9);
        assert_eq!(config.solver.atol, 1e-6);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("scenario_directory = \"x\"").is_err());
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
        let path = dir.path().join("phyz-gr.toml");
        std::fs::write(&path, "scenario_dir = \"scenarios\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.scenario_dir, PathBuf::from("scenarios"));
    }
}
