//! Symbolic general relativity for phyz.
//!
//! Derives the curvature of a spacetime from a metric given as a grid of
//! expression strings, and works with the result:
//!
//! - metric → inverse → Christoffel symbols → Riemann → Ricci → Einstein
//!   ([`Geometry::compute`], [`compute_geometry`])
//! - stress-energy tensors for explicit components, vacuum, dust and perfect
//!   fluids ([`StressEnergyDefinition`])
//! - checks of the Einstein field equations G = κT ([`verify_efe`])
//! - numerical geodesics ([`integrate_geodesic`])
//! - Flamm's paraboloid embedding diagrams ([`solve_embedding`])
//!
//! Every entry point is a pure function of its input. Progress is reported
//! through `tracing`; no subscriber is installed here.
//!
//! # Example
//!
//! ```
//! use phyz_gr::{EfeRequest, StressEnergyDefinition, TensorDefinition, verify_efe};
//!
//! let schwarzschild = TensorDefinition::diagonal([
//!     "-(1 - 2*M/r)",
//!     "1/(1 - 2*M/r)",
//!     "r**2",
//!     "r**2*sin(theta)**2",
//! ]);
//! let report = verify_efe(&EfeRequest::new(schwarzschild, StressEnergyDefinition::vacuum())).unwrap();
//! assert!(report.verified);
//! ```

pub mod christoffel;
pub mod coords;
pub mod definition;
pub mod efe;
pub mod einstein;
pub mod embedding;
pub mod error;
pub mod format;
pub mod geodesic;
pub mod glossary;
pub mod metric;
pub mod pipeline;
pub mod ricci;
pub mod riemann;
pub mod scenario;
pub mod stress_energy;
pub mod tensor;

pub use christoffel::christoffel_symbols;
pub use coords::CoordinateSystem;
pub use definition::{ParameterValues, TensorDefinition};
pub use efe::{EfeReport, EfeRequest, Mismatch, verify_efe};
pub use einstein::einstein_tensor;
pub use embedding::{
    EmbeddingReport, EmbeddingRequest, EmbeddingStatus, FlammEmbedding, flamm_embedding,
    solve_embedding,
};
pub use error::{ComponentFailure, ErrorKind, GrError, Result};
pub use geodesic::{ChristoffelField, GeodesicReport, GeodesicRequest, integrate_geodesic};
pub use glossary::{DefinitionItem, Glossary};
pub use metric::Metric;
pub use pipeline::{
    Geometry, GeometryReport, StressEnergyReport, compute_geometry, compute_stress_energy,
};
pub use ricci::{ricci_scalar, ricci_tensor};
pub use riemann::riemann_tensor;
pub use scenario::{Scenario, validate_scenario_name};
pub use stress_energy::{StressEnergy, StressEnergyDefinition};
pub use tensor::{Components2, Components3, Components4, DIM};

pub use phyz_ode::{Method, SolverOptions};
pub use phyz_symbolic::Expr;
