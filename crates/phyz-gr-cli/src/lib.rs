//! # phyz-gr-cli
//!
//! Command-line front end for `phyz-gr`. Inputs are JSON files, results are
//! printed as pretty JSON on stdout and logs go to stderr.
//!
//! ## Subcommands
//!
//! - `geometry`: curvature tensors of a metric
//! - `stress-energy`: stress-energy tensors
//! - `efe`: Einstein field equation checks
//! - `geodesic`: numerical geodesics
//! - `embedding`: Flamm's paraboloid
//! - `scenario`: save, list and load scenario bundles
//! - `define`: glossary lookup

pub mod commands;
pub mod config;
pub mod store;

use phyz_gr::{ErrorKind, GrError};

/// Process exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<GrError>().map(GrError::kind) {
        Some(ErrorKind::Validation) => 2,
        Some(ErrorKind::Singularity) => 3,
        Some(ErrorKind::Computation) => 4,
        Some(ErrorKind::RuntimeComputation) => 5,
        Some(ErrorKind::Io) | None => 1,
    }
}
