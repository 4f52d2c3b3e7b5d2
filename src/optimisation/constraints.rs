//! Code for adding constraints to the optimisation problem.
//!
//! Each family of constraints is produced by a [`ConstraintGenerator`]. Which generators are used
//! is decided once, from the model parameters, in [`select_generators`].
use super::FormulationContext;
use super::problem::ProblemBuilder;
use crate::model::{ModelParameters, NetworkTopology};
use anyhow::Result;

pub mod balance;
pub mod carbon;
pub mod converter;
pub mod network;
pub mod source;
pub mod storage;

/// Adds one or more families of constraints to a problem
pub trait ConstraintGenerator {
    /// A short description of what the generator adds, for logging
    fn name(&self) -> &'static str;

    /// Add constraints to the problem
    fn generate(&self, ctx: &FormulationContext, builder: &mut ProblemBuilder) -> Result<()>;
}

/// Choose the constraint generators for the given parameters
pub fn select_generators(parameters: &ModelParameters) -> Vec<Box<dyn ConstraintGenerator>> {
    let mut generators: Vec<Box<dyn ConstraintGenerator>> = vec![
        Box::new(balance::EnergyBalance),
        Box::new(converter::ConverterLimits),
        Box::new(source::SourceAvailability),
        Box::new(storage::StorageDynamics::new(
            parameters.storage_initial_state,
        )),
    ];

    if parameters.network_enabled && parameters.topology == NetworkTopology::Optimised {
        generators.push(Box::new(network::OptimisedTopology));
    }

    if let Some(max_carbon) = parameters.max_carbon {
        generators.push(Box::new(carbon::CarbonLimit::new(max_carbon)));
    }

    generators
}
