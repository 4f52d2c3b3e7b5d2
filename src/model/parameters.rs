//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
//!
//! These parameters are the formulation configuration: they are consumed once when a problem is
//! formulated and select which constraint generators are used.
use crate::input::{input_err_msg, read_toml};
use crate::units::{Carbon, Dimensionless, Hours};
use super::ConfigurationError;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

define_unit_param_default!(default_time_step_duration, Hours, 1.0);

fn default_network_enabled() -> bool {
    true
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ModelParameters {
    /// Number of time steps in the horizon
    pub time_steps: u32,
    /// Length of each time step in hours
    #[serde(default = "default_time_step_duration")]
    pub time_step_duration: Hours,
    /// Interest rate used to annualise investment costs
    #[serde(default)]
    pub interest_rate: Dimensionless,
    /// Sign convention for flows on network links
    #[serde(default)]
    pub flow_direction: FlowDirection,
    /// Whether the network layout is given or optimised
    #[serde(default)]
    pub topology: NetworkTopology,
    /// The quantity to minimise
    #[serde(default)]
    pub objective: ObjectiveTarget,
    /// How the state of charge of storages at the start of the horizon is determined.
    ///
    /// This must always be given explicitly.
    pub storage_initial_state: StorageInitialState,
    /// Whether network links are included in the formulation
    #[serde(default = "default_network_enabled")]
    pub network_enabled: bool,
    /// Optional upper limit on total carbon emissions
    pub max_carbon: Option<Carbon>,
}

/// Sign convention for network flows
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy, Default)]
pub enum FlowDirection {
    /// A single free flow variable per link; positive flow runs from `from` to `to`
    #[string = "signed"]
    Signed,
    /// Non-negative flow from `from` to `to` only, subject to losses
    #[default]
    #[string = "directed"]
    Directed,
}

/// Whether the network layout is a decision
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy, Default)]
pub enum NetworkTopology {
    /// All links are built
    #[default]
    #[string = "fixed"]
    Fixed,
    /// Each link has an installation decision
    #[string = "optimised"]
    Optimised,
}

/// The quantity minimised by the objective
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy, Default)]
pub enum ObjectiveTarget {
    /// Total annualised cost
    #[default]
    #[string = "cost"]
    Cost,
    /// Total carbon emissions. Costs are still reported.
    #[string = "carbon"]
    Carbon,
}

/// Policy for the state of charge of storages before the first time step
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum StorageInitialState {
    /// The initial state equals the state at the end of the horizon
    Cyclic,
    /// The initial state is a fixed fraction of capacity
    Fixed {
        /// Fraction of capacity stored at the start
        fraction: Dimensionless,
    },
}

/// The entity named in errors about model parameters
const MODEL_ENTITY: &str = "model";

type CheckResult = Result<(), ConfigurationError>;

/// Fail with an error for the given parameter unless `valid` holds
fn require(valid: bool, field: &str, message: &str) -> CheckResult {
    if valid {
        Ok(())
    } else {
        Err(ConfigurationError::new(MODEL_ENTITY, field, message))
    }
}

/// Check that the `time_steps` parameter is valid
fn check_time_steps(time_steps: u32) -> CheckResult {
    require(time_steps > 0, "time_steps", "cannot be zero")
}

/// Check that the `time_step_duration` parameter is valid
fn check_time_step_duration(duration: Hours) -> CheckResult {
    require(
        duration.is_finite() && duration > Hours(0.0),
        "time_step_duration",
        "must be a finite number greater than zero",
    )
}

/// Check that the `interest_rate` parameter is valid
fn check_interest_rate(rate: Dimensionless) -> CheckResult {
    require(
        rate.is_finite() && rate >= Dimensionless(0.0),
        "interest_rate",
        "must be a finite number greater than or equal to zero",
    )
}

/// Check that the `storage_initial_state` parameter is valid
fn check_storage_initial_state(state: StorageInitialState) -> CheckResult {
    match state {
        StorageInitialState::Fixed { fraction } => require(
            (0.0..=1.0).contains(&fraction.value()),
            "storage_initial_state",
            "fraction must be between 0 and 1",
        ),
        StorageInitialState::Cyclic => Ok(()),
    }
}

/// Check that the `max_carbon` parameter is valid
fn check_max_carbon(max_carbon: Option<Carbon>) -> CheckResult {
    max_carbon.map_or(Ok(()), |max_carbon| {
        require(
            max_carbon.is_finite() && max_carbon >= Carbon(0.0),
            "max_carbon",
            "must be a finite number greater than or equal to zero",
        )
    })
}

impl ModelParameters {
    /// Create parameters for the given horizon, with defaults for everything else
    pub fn new(time_steps: u32, storage_initial_state: StorageInitialState) -> Self {
        Self {
            time_steps,
            time_step_duration: default_time_step_duration(),
            interest_rate: Dimensionless(0.0),
            flow_direction: FlowDirection::default(),
            topology: NetworkTopology::default(),
            objective: ObjectiveTarget::default(),
            storage_initial_state,
            network_enabled: default_network_enabled(),
            max_carbon: None,
        }
    }

    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Check that every parameter is valid.
    ///
    /// This runs when the file is read and again when a problem is formulated, so parameters
    /// built in code are checked too.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_time_steps(self.time_steps)?;
        check_time_step_duration(self.time_step_duration)?;
        check_interest_rate(self.interest_rate)?;
        check_storage_initial_state(self.storage_initial_state)?;
        check_max_carbon(self.max_carbon)?;

        Ok(())
    }
}
