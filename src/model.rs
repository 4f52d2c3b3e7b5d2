//! The model: everything needed to formulate an energy hub problem.
use crate::converter::ConverterMap;
use crate::hub::HubMap;
use crate::network::LinkMap;
use crate::storage::StorageMap;
use crate::stream::StreamMap;
use std::error::Error;
use std::fmt;

pub mod parameters;
pub use parameters::{
    FlowDirection, ModelParameters, NetworkTopology, ObjectiveTarget, StorageInitialState,
};

/// Model definition
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Formulation parameters from `model.toml`
    pub parameters: ModelParameters,
    /// Energy carriers
    pub streams: StreamMap,
    /// Sites at which streams are balanced
    pub hubs: HubMap,
    /// Conversion technologies
    pub converters: ConverterMap,
    /// Storage technologies
    pub storages: StorageMap,
    /// Links between hubs
    pub links: LinkMap,
}

impl Model {
    /// Number of time steps in the horizon
    pub fn time_steps(&self) -> usize {
        self.parameters.time_steps as usize
    }

    /// Whether network links are part of the formulation
    pub fn network_enabled(&self) -> bool {
        self.parameters.network_enabled && !self.links.is_empty()
    }
}

/// Indicates that the model data cannot be formulated.
///
/// Names the offending entity and field so that the input can be corrected.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationError {
    /// The entity at fault (e.g. `converter boiler`)
    pub entity: String,
    /// The field at fault
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl ConfigurationError {
    /// Create a new [`ConfigurationError`]
    pub fn new(entity: impl fmt::Display, field: &str, message: impl Into<String>) -> Self {
        Self {
            entity: entity.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid configuration for {} (field `{}`): {}",
            self.entity, self.field, self.message
        )
    }
}

impl Error for ConfigurationError {}
