use phyz_gr::{
    EfeRequest, Geometry, GrError, Metric, StressEnergyDefinition, TensorDefinition, verify_efe,
};

fn schwarzschild() -> TensorDefinition {
    TensorDefinition::diagonal(["-(1 - 2*M/r)", "1/(1 - 2*M/r)", "r**2", "r**2*sin(theta)**2"])
}

fn reissner_nordstrom() -> TensorDefinition {
    TensorDefinition::diagonal([
        "-(1 - 2*M/r + Q**2/r**2)",
        "1/(1 - 2*M/r + Q**2/r**2)",
        "r**2",
        "r**2*sin(theta)**2",
    ])
}

#[test]
fn schwarzschild_vacuum_is_verified_for_any_coupling() {
    for kappa in ["1", "8*pi", "8*pi*G"] {
        let mut request = EfeRequest::new(schwarzschild(), StressEnergyDefinition::vacuum());
        request.coupling_constant = kappa.to_owned();
        let report = verify_efe(&request).unwrap();
        assert!(report.verified, "kappa = {kappa}");
        assert!(report.mismatch.is_none());
    }
}

#[test]
fn dust_on_schwarzschild_fails_at_tt() {
    let mut request = EfeRequest::new(schwarzschild(), StressEnergyDefinition::dust());
    request.coupling_constant = "8*pi".into();
    let report = verify_efe(&request).unwrap();
    assert!(!report.verified);
    let mismatch = report.mismatch.unwrap();
    assert_eq!((mismatch.mu, mismatch.nu), (0, 0));
    assert!(mismatch.residual.contains("rho"), "{}", mismatch.residual);
    assert!(report.message.starts_with("EFEs NOT satisfied. Mismatch found in component (0,0): "));
}

#[test]
fn explicit_einstein_components_are_verified() {
    // Feed G back in as T with κ = 1.
    let def = reissner_nordstrom();
    let geometry = Geometry::compute(&Metric::from_definition(&def).unwrap()).unwrap();
    let components = geometry
        .einstein
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();
    let source = StressEnergyDefinition::Components {
        coordinates: def.coordinates.clone(),
        components,
    };
    let report = verify_efe(&EfeRequest::new(def.clone(), source.clone())).unwrap();
    assert!(report.verified, "{}", report.message);

    let mut doubled = EfeRequest::new(def, source);
    doubled.coupling_constant = "2".into();
    let report = verify_efe(&doubled).unwrap();
    assert!(!report.verified);
    assert_eq!(report.mismatch.unwrap().mu, 0);
}

#[test]
fn perfect_fluid_reuses_metric() {
    let report = verify_efe(&EfeRequest::new(
        schwarzschild(),
        StressEnergyDefinition::perfect_fluid(),
    ))
    .unwrap();
    assert!(!report.verified);
}

#[test]
fn mismatched_coordinates_are_rejected() {
    let request = EfeRequest::new(
        schwarzschild(),
        StressEnergyDefinition::Dust {
            coordinates: ["t", "r", "th", "ph"].map(str::to_owned).into(),
            density: "rho".into(),
            four_velocity: ["-1", "0", "0", "0"].map(str::to_owned).into(),
        },
    );
    let err = verify_efe(&request).unwrap_err();
    assert!(matches!(err, GrError::Validation(_)), "{err}");
}

#[test]
fn request_from_json() {
    let request: EfeRequest = serde_json::from_str(
        r#"{
            "metric": {
                "coordinates": ["t", "r", "theta", "phi"],
                "components": [
                    ["-(1 - 2*M/r)", "0", "0", "0"],
                    ["0", "1/(1 - 2*M/r)", "0", "0"],
                    ["0", "0", "r**2", "0"],
                    ["0", "0", "0", "r**2*sin(theta)**2"]
                ]
            },
            "stress_energy": {"kind": "vacuum"},
            "coupling_constant": "8*pi"
        }"#,
    )
    .unwrap();
    assert!(verify_efe(&request).unwrap().verified);
}

#[test]
fn repeated_verification_gives_identical_reports() {
    let mut request = EfeRequest::new(reissner_nordstrom(), StressEnergyDefinition::dust());
    request.coupling_constant = "8*pi".into();
    let first = verify_efe(&request).unwrap();
    let second = verify_efe(&request).unwrap();
    assert_eq!(first, second);
    assert!(!first.verified);
}
