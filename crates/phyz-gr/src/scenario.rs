use serde::{Deserialize, Serialize};

use crate::definition::TensorDefinition;
use crate::error::{GrError, Result};
use crate::stress_energy::StressEnergyDefinition;

/// A named bundle of inputs that can be saved and reloaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub metric_input: TensorDefinition,
    pub stress_energy_input: StressEnergyDefinition,
}

/// Scenario names become file stems, so path separators and dots are
/// rejected.
pub fn validate_scenario_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(GrError::Validation("scenario name must not be empty".into()));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '/' | '\\' | '.')) {
        return Err(GrError::Validation(format!(
            "scenario name '{name}' contains invalid character '{c}'"
        )));
    }
    Ok(())
}
