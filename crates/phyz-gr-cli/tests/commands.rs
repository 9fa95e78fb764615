use std::path::{Path, PathBuf};

use phyz_gr_cli::commands::{Command, ScenarioCommand, run};
use phyz_gr_cli::config::Config;
use phyz_gr_cli::exit_code;
use serde_json::json;

fn write(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path
}

fn schwarzschild() -> serde_json::Value {
    json!({
        "coordinates": ["t", "r", "theta", "phi"],
        "components": [
            ["-(1 - 2*M/r)", "0", "0", "0"],
            ["0", "1/(1 - 2*M/r)", "0", "0"],
            ["0", "0", "r**2", "0"],
            ["0", "0", "0", "r**2*sin(theta)**2"]
        ]
    })
}

#[test]
fn geometry_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let metric = write(dir.path(), "metric.json", schwarzschild());
    let out = run(&Command::Geometry { metric }, &Config::default()).unwrap();
    assert_eq!(out["ricci_scalar"], "0");
    assert_eq!(out["metric"].as_object().unwrap().len(), 16);
    assert!(out["christoffel"]["2_12"].is_string());
}

#[test]
fn efe_and_embedding_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let efe = write(
        dir.path(),
        "efe.json",
        json!({"metric": schwarzschild(), "stress_energy": {"kind": "vacuum"}}),
    );
    let out = run(&Command::Efe { request: efe }, &Config::default()).unwrap();
    assert_eq!(out["verified"], true);
    assert_eq!(out["message"], "EFEs satisfied.");

    let embedding = write(
        dir.path(),
        "embedding.json",
        json!({"metric": schwarzschild(), "parameters": {"M": 1.0}, "num_points_r": 10, "num_points_phi": 4}),
    );
    let out = run(&Command::Embedding { request: embedding }, &Config::default()).unwrap();
    assert_eq!(out["r_values"].as_array().unwrap().len(), 10);
    assert_eq!(out["x_surface"].as_array().unwrap().len(), 4);
}

#[test]
fn scenario_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        scenario_dir: dir.path().join("scenarios"),
        ..Config::default()
    };
    let bundle = json!({
        "metric_input": schwarzschild(),
        "stress_energy_input": {"kind": "vacuum"}
    });
    let file = write(dir.path(), "bundle.json", bundle);

    let save = Command::Scenario(ScenarioCommand::Save {
        name: "schwarzschild".into(),
        scenario: file.clone(),
    });
    let out = run(&save, &config).unwrap();
    assert_eq!(out["message"], "Scenario 'schwarzschild' saved successfully.");
    assert!(run(&save, &config).unwrap_err().to_string().contains("already exists"));

    let list = run(&Command::Scenario(ScenarioCommand::List), &config).unwrap();
    assert_eq!(list, json!(["schwarzschild"]));

    let loaded = run(
        &Command::Scenario(ScenarioCommand::Load {
            name: "schwarzschild".into(),
        }),
        &config,
    )
    .unwrap();
    assert_eq!(loaded["stress_energy_input"]["kind"], "vacuum");
    assert_eq!(loaded["metric_input"]["components"][2][2], "r**2");
}

#[test]
fn failures_map_to_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let singular = write(
        dir.path(),
        "singular.json",
        json!({"components": [["-1","0","0","0"],["0","0","0","0"],["0","0","1","0"],["0","0","0","1"]]}),
    );
    let err = run(&Command::Geometry { metric: singular }, &Config::default()).unwrap_err();
    assert_eq!(exit_code(&err), 3);

    let bad_shape = write(dir.path(), "bad.json", json!({"components": [["1"]]}));
    let err = run(&Command::Geometry { metric: bad_shape }, &Config::default()).unwrap_err();
    assert_eq!(exit_code(&err), 2);

    let err = run(
        &Command::Geometry {
            metric: dir.path().join("missing.json"),
        },
        &Config::default(),
    )
    .unwrap_err();
    assert_eq!(exit_code(&err), 1);
}
