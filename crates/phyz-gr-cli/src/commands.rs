//! # Subcommand handlers
//!
//! Each handler reads its JSON input, calls into `phyz-gr` and returns the
//! result as a JSON value. Printing is left to `main`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Subcommand;
use phyz_gr::{
    EfeRequest, EmbeddingRequest, GeodesicRequest, Glossary, Scenario, StressEnergyDefinition,
    TensorDefinition, compute_geometry, compute_stress_energy, integrate_geodesic,
    solve_embedding, verify_efe,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::store::ScenarioStore;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inverse metric, Christoffel symbols, Riemann, Ricci and Einstein tensors.
    Geometry {
        /// Metric definition (JSON).
        metric: PathBuf,
    },
    /// Build a stress-energy tensor.
    StressEnergy {
        /// Stress-energy definition (JSON, tagged by "kind").
        definition: PathBuf,
        /// Metric definition, required for a perfect fluid.
        #[arg(long)]
        metric: Option<PathBuf>,
    },
    /// Check the Einstein field equations G = κT.
    Efe {
        request: PathBuf,
    },
    /// Integrate a geodesic.
    Geodesic {
        request: PathBuf,
    },
    /// Flamm's paraboloid embedding diagram.
    Embedding {
        request: PathBuf,
    },
    /// Saved scenarios.
    #[command(subcommand)]
    Scenario(ScenarioCommand),
    /// Look up glossary terms. Lists every term without a key.
    Define {
        key: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ScenarioCommand {
    /// Save a scenario bundle under a new name.
    Save { name: String, scenario: PathBuf },
    /// List saved scenario names.
    List,
    /// Print a saved scenario.
    Load { name: String },
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

pub fn run(command: &Command, config: &Config) -> Result<Value> {
    match command {
        Command::Geometry { metric } => {
            let def: TensorDefinition = read_json(metric)?;
            to_value(compute_geometry(&def)?)
        }
        Command::StressEnergy { definition, metric } => {
            let def: StressEnergyDefinition = read_json(definition)?;
            let metric: Option<TensorDefinition> = metric.as_deref().map(read_json).transpose()?;
            to_value(compute_stress_energy(&def, metric.as_ref())?)
        }
        Command::Efe { request } => {
            let request: EfeRequest = read_json(request)?;
            to_value(verify_efe(&request)?)
        }
        Command::Geodesic { request } => {
            let raw: Value = read_json(request)?;
            let request = geodesic_request(raw, config)?;
            to_value(integrate_geodesic(&request)?)
        }
        Command::Embedding { request } => {
            let request: EmbeddingRequest = read_json(request)?;
            to_value(solve_embedding(&request)?)
        }
        Command::Scenario(cmd) => run_scenario(cmd, config),
        Command::Define { key } => {
            let glossary = load_glossary(config)?;
            match key {
                Some(key) => {
                    let item = glossary
                        .get(key)
                        .ok_or_else(|| anyhow!("Definition for '{key}' not found."))?;
                    to_value(item)
                }
                None => to_value(glossary.entries()),
            }
        }
    }
}

/// Apply the configured solver settings when the request has none.
pub fn geodesic_request(mut raw: Value, config: &Config) -> Result<GeodesicRequest> {
    if let Value::Object(map) = &mut raw {
        if !map.contains_key("solver") {
            map.insert("solver".to_owned(), serde_json::to_value(&config.solver)?);
        }
    }
    serde_json::from_value(raw).context("parsing geodesic request")
}

fn run_scenario(cmd: &ScenarioCommand, config: &Config) -> Result<Value> {
    let store = ScenarioStore::new(&config.scenario_dir);
    match cmd {
        ScenarioCommand::Save { name, scenario } => {
            let scenario: Scenario = read_json(scenario)?;
            let path = store.save(name, &scenario)?;
            Ok(serde_json::json!({
                "message": format!("Scenario '{name}' saved successfully."),
                "path": path.display().to_string(),
            }))
        }
        ScenarioCommand::List => to_value(store.list()?),
        ScenarioCommand::Load { name } => to_value(store.load(name)?),
    }
}

pub fn load_glossary(config: &Config) -> Result<Glossary> {
    match &config.definitions_path {
        Some(path) => Ok(Glossary::from_path(path)?),
        None => Ok(Glossary::builtin()),
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).context("serializing result")
}
