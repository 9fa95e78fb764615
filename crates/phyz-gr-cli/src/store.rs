//! # Scenario store
//!
//! One pretty-printed `<name>.json` file per scenario in a directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use phyz_gr::{Scenario, validate_scenario_name};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid scenario name: {0}")]
    InvalidName(String),

    #[error("scenario '{0}' already exists")]
    Conflict(String),

    #[error("scenario '{0}' not found")]
    NotFound(String),

    #[error("scenario store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("scenario file {path} is not valid: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ScenarioStore {
    dir: PathBuf,
}

impl ScenarioStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_scenario_name(name).map_err(|e| StoreError::InvalidName(e.to_string()))?;
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Write a new scenario. Existing names are never overwritten.
    pub fn save(&self, name: &str, scenario: &Scenario) -> Result<PathBuf, StoreError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(scenario).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::Conflict(name.to_owned()));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        io::Write::write_all(&mut file, json.as_bytes()).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(name, path = %path.display(), "saved scenario");
        Ok(path)
    }

    /// Sorted scenario names. A missing directory holds no scenarios.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load(&self, name: &str) -> Result<Scenario, StoreError> {
        let path = self.path_for(name)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_owned()));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&text).map_err(|source| StoreError::Json { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phyz_gr::{StressEnergyDefinition, TensorDefinition};

    fn scenario() -> Scenario {
        Scenario {
            metric_input: TensorDefinition::diagonal(["-1", "1", "r**2", "r**2*sin(theta)**2"]),
            stress_energy_input: StressEnergyDefinition::dust(),
        }
    }

    #[test]
    fn save_list_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScenarioStore::new(dir.path().join("scenarios"));
        assert!(store.list().unwrap().is_empty());

        store.save("flat", &scenario()).unwrap();
        store.save("another", &scenario()).unwrap();
        assert_eq!(store.list().unwrap(), ["another", "flat"]);
        assert_eq!(store.load("flat").unwrap(), scenario());
    }

    #[test]
    fn conflicts_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScenarioStore::new(dir.path());
        store.save("flat", &scenario()).unwrap();
        assert!(matches!(store.save("flat", &scenario()), Err(StoreError::Conflict(_))));
        assert!(matches!(store.load("curved"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.load("../flat"), Err(StoreError::InvalidName(_))));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        let store = ScenarioStore::new(dir.path());
        assert!(matches!(store.load("broken"), Err(StoreError::Json { .. })));
    }
}
