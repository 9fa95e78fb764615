//! Curvature of the Schwarzschild and Reissner-Nordström spacetimes.

use phyz_gr::{DIM, ErrorKind, Expr, Geometry, GrError, Metric, TensorDefinition, compute_geometry};
use phyz_symbolic::SymbolicError;

const SCHWARZSCHILD: [&str; 4] = ["-(1 - 2*M/r)", "1/(1 - 2*M/r)", "r**2", "r**2*sin(theta)**2"];
const REISSNER_NORDSTROM: [&str; 4] = [
    "-(1 - 2*M/r + Q**2/r**2)",
    "1/(1 - 2*M/r + Q**2/r**2)",
    "r**2",
    "r**2*sin(theta)**2",
];

fn geometry(diag: [&str; 4]) -> Geometry {
    let metric = Metric::from_definition(&TensorDefinition::diagonal(diag)).unwrap();
    Geometry::compute(&metric).unwrap()
}

fn assert_equivalent(actual: &Expr, expected: &str, what: &str) {
    let expected: Expr = expected.parse().unwrap();
    let diff = (actual - &expected).simplify().unwrap();
    assert!(diff.is_zero(), "{what}: got {actual}, expected {expected}");
}

#[test]
fn christoffel_symbols_match_known_values() {
    let g = geometry(SCHWARZSCHILD);
    let gamma = &g.christoffel;
    // Indices: 0 = t, 1 = r, 2 = theta, 3 = phi.
    assert_equivalent(&gamma[1][0][0], "M*(1 - 2*M/r)/r**2", "Γ^r_tt");
    assert_equivalent(&gamma[0][0][1], "M/(r**2*(1 - 2*M/r))", "Γ^t_tr");
    assert_equivalent(&gamma[0][1][0], "M/(r**2*(1 - 2*M/r))", "Γ^t_rt");
    assert_equivalent(&gamma[1][1][1], "-M/(r**2*(1 - 2*M/r))", "Γ^r_rr");
    assert_equivalent(&gamma[1][2][2], "-(r - 2*M)", "Γ^r_θθ");
    assert_equivalent(&gamma[2][1][2], "1/r", "Γ^θ_rθ");
    assert_equivalent(&gamma[2][2][1], "1/r", "Γ^θ_θr");
    assert_equivalent(&gamma[3][1][3], "1/r", "Γ^φ_rφ");
    assert_equivalent(&gamma[3][3][1], "1/r", "Γ^φ_φr");
    assert_equivalent(&gamma[3][2][3], "cos(theta)/sin(theta)", "Γ^φ_θφ");
    assert_equivalent(&gamma[3][3][2], "cos(theta)/sin(theta)", "Γ^φ_φθ");
    assert!(gamma[0][0][0].is_zero());
    assert!(gamma[1][0][1].is_zero());
    assert!(gamma[2][0][0].is_zero());
}

#[test]
fn christoffel_lower_indices_are_symmetric() {
    for diag in [SCHWARZSCHILD, REISSNER_NORDSTROM] {
        let g = geometry(diag);
        for lam in 0..DIM {
            for mu in 0..DIM {
                for nu in 0..DIM {
                    assert_eq!(g.christoffel[lam][mu][nu], g.christoffel[lam][nu][mu]);
                }
            }
        }
    }
}

#[test]
fn riemann_is_antisymmetric_in_last_pair() {
    let g = geometry(REISSNER_NORDSTROM);
    let mut nonzero = 0;
    for rho in 0..DIM {
        for sigma in 0..DIM {
            for mu in 0..DIM {
                for nu in 0..DIM {
                    let sum = (&g.riemann[rho][sigma][mu][nu] + &g.riemann[rho][sigma][nu][mu])
                        .simplify()
                        .unwrap();
                    assert!(sum.is_zero(), "R^{rho}_{sigma}{mu}{nu}");
                    if !g.riemann[rho][sigma][mu][nu].is_zero() {
                        nonzero += 1;
                    }
                }
            }
        }
    }
    assert!(nonzero > 0);
}

#[test]
fn schwarzschild_is_ricci_flat() {
    let g = geometry(SCHWARZSCHILD);
    assert!(g.ricci_tensor.iter().flatten().all(Expr::is_zero));
    assert!(g.ricci_scalar.is_zero());
    assert!(g.einstein.iter().flatten().all(Expr::is_zero));
    // Curvature itself does not vanish.
    assert_equivalent(&g.riemann[0][1][0][1], "2*M/(r**2*(r - 2*M))", "R^t_rtr");
}

#[test]
fn einstein_is_trace_reversed_ricci() {
    let g = geometry(REISSNER_NORDSTROM);
    let metric = g.metric.components();
    for mu in 0..DIM {
        for nu in 0..DIM {
            let expected = &g.ricci_tensor[mu][nu]
                - &(Expr::rational(1, 2) * (&metric[mu][nu] * &g.ricci_scalar));
            let diff = (&g.einstein[mu][nu] - &expected).simplify().unwrap();
            assert!(diff.is_zero(), "G_{mu}{nu}");
        }
    }
    // Charged black hole: G_tt does not vanish but R does.
    assert!(!g.einstein[0][0].is_zero());
    assert!(g.ricci_scalar.is_zero());
}

#[test]
fn metric_times_inverse_is_identity() {
    for diag in [SCHWARZSCHILD, REISSNER_NORDSTROM] {
        let g = geometry(diag);
        let metric = g.metric.components();
        for i in 0..DIM {
            for j in 0..DIM {
                let product = Expr::sum((0..DIM).map(|k| &metric[i][k] * &g.inverse[k][j]));
                let expected = if i == j { Expr::one() } else { Expr::zero() };
                assert_eq!(product.simplify().unwrap(), expected, "({i},{j})");
            }
        }
    }
}

#[test]
fn singular_metric_is_reported() {
    let err = compute_geometry(&TensorDefinition::diagonal(["-(1 - 2*M/r)", "0", "r**2", "r**2"]))
        .unwrap_err();
    assert!(matches!(err, GrError::Singularity { .. }), "{err}");
}

#[test]
fn report_uses_sparse_keys() {
    let report = compute_geometry(&TensorDefinition::diagonal(SCHWARZSCHILD)).unwrap();
    assert_eq!(report.metric.len(), 16);
    assert!(report.christoffel.contains_key("1_00"));
    assert!(report.christoffel.contains_key("3_23"));
    assert!(!report.christoffel.contains_key("0_00"));
    assert!(report.riemann.keys().all(|k| k.len() == 5));
    assert_eq!(report.ricci_scalar, "0");
}

#[test]
fn repeated_geometry_reports_are_identical() {
    let def = TensorDefinition::diagonal(REISSNER_NORDSTROM);
    let first = compute_geometry(&def).unwrap();
    let second = compute_geometry(&def).unwrap();
    assert_eq!(first, second);
}

#[test]
fn literal_division_by_zero_is_a_computation_error() {
    let def = TensorDefinition::diagonal(["-1", "1 + 0/0", "r**2", "r**2*sin(theta)**2"]);
    let err = compute_geometry(&def).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Computation, "{err}");
    assert!(matches!(
        err,
        GrError::Computation {
            source: SymbolicError::DivisionByZero,
            ..
        }
    ));
}
