//! Formulation of the energy hub problem as a mixed-integer linear program.
//!
//! Formulation proceeds in a fixed order:
//!
//! 1. The model is validated and its index sets derived ([`sets`])
//! 2. Decision variables are declared in the variable registry ([`DecisionVariables`])
//! 3. Each constraint generator selected by the formulation configuration adds its constraints
//!    ([`constraints`])
//! 4. The cost and carbon expressions are built and the objective chosen ([`objective`])
//!
//! Given the same model, the resulting [`Problem`] is identical every time.
use crate::converter::ConverterID;
use crate::hub::HubID;
use crate::model::{Model, ModelParameters, ObjectiveTarget, StorageInitialState};
use crate::network::LinkID;
use crate::storage::StorageID;
use crate::stream::StreamID;
use crate::units::{Carbon, Dimensionless};
use anyhow::Result;
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info};

pub mod constraints;
pub mod investment;
pub mod objective;
pub mod problem;
pub mod results;
pub mod sets;
pub mod solver;
pub mod variables;

use constraints::network::{FlowConvention, Topology};
use constraints::{ConstraintGenerator, select_generators};
use investment::InvestmentDecision;
use objective::CostTerms;
use problem::{Problem, ProblemBuilder};
use results::{Results, extract_results};
use sets::{IndexSets, build_index_sets};
use solver::Solver;
use variables::{Domain, Variable, VariableKey};

/// Variables for a single converter
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterVariables {
    /// Total input consumed at each time step
    pub dispatch: Vec<Variable>,
    /// Capacity and installation
    pub investment: InvestmentDecision,
    /// Whether the converter is switched on at each time step (only with a minimum part load)
    pub on: Option<Vec<Variable>>,
}

/// Variables for a single storage
#[derive(Debug, Clone, PartialEq)]
pub struct StorageVariables {
    /// Energy charged at each time step
    pub charge: Vec<Variable>,
    /// Energy discharged at each time step
    pub discharge: Vec<Variable>,
    /// State of charge before the first time step and after each time step
    pub state: Vec<Variable>,
    /// Capacity and installation
    pub investment: InvestmentDecision,
}

/// Variables for a single network link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkVariables {
    /// Flow of each stream at each time step
    pub flows: IndexMap<StreamID, Vec<Variable>>,
    /// Capacity and whether the link is built
    pub investment: InvestmentDecision,
}

/// A map for easy lookup of the decision variables in the problem.
///
/// The entries are ordered (see [`IndexMap`]).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecisionVariables {
    /// Variables for each converter
    pub converters: IndexMap<ConverterID, ConverterVariables>,
    /// Variables for each storage
    pub storages: IndexMap<StorageID, StorageVariables>,
    /// Imports for each (hub, stream) pair where imports are possible
    pub imports: IndexMap<(HubID, StreamID), Vec<Variable>>,
    /// Exports for each (hub, stream) pair where exports are possible
    pub exports: IndexMap<(HubID, StreamID), Vec<Variable>>,
    /// Variables for each included link
    pub links: IndexMap<LinkID, LinkVariables>,
}

impl DecisionVariables {
    /// Declare every decision variable in the problem
    fn declare(
        model: &Model,
        sets: &IndexSets,
        config: &FormulationConfig,
        builder: &mut ProblemBuilder,
    ) -> Result<Self> {
        let mut vars = Self::default();
        let time_steps = sets.time_steps.clone();

        for converter in model.converters.values() {
            let id = &converter.id;
            let dispatch = time_steps
                .clone()
                .map(|time_step| {
                    let key = VariableKey::Dispatch {
                        converter: id.clone(),
                        time_step,
                    };
                    builder.declare(key, Domain::NonNegative, 0.0, f64::INFINITY)
                })
                .collect::<Result<Vec<_>, _>>()?;
            let installed_key = converter
                .requires_installation
                .then(|| VariableKey::ConverterInstalled(id.clone()));
            let investment = InvestmentDecision::declare(
                builder,
                VariableKey::ConverterCapacity(id.clone()),
                installed_key,
                &converter.capacity,
            )?;
            let on = if converter.has_part_load() {
                let on = time_steps
                    .clone()
                    .map(|time_step| {
                        builder.declare_binary(VariableKey::ConverterOn {
                            converter: id.clone(),
                            time_step,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Some(on)
            } else {
                None
            };

            vars.converters.insert(
                id.clone(),
                ConverterVariables {
                    dispatch,
                    investment,
                    on,
                },
            );
        }

        for (hub_id, stream_id) in &sets.imports {
            let hub = &model.hubs[hub_id];
            let imports = time_steps
                .clone()
                .map(|time_step| {
                    let limit = hub
                        .import_limit(stream_id, time_step)
                        .map_or(f64::INFINITY, |limit| limit.value());
                    let key = VariableKey::Import {
                        hub: hub_id.clone(),
                        stream: stream_id.clone(),
                        time_step,
                    };
                    builder.declare(key, Domain::NonNegative, 0.0, limit)
                })
                .collect::<Result<Vec<_>, _>>()?;
            vars.imports
                .insert((hub_id.clone(), stream_id.clone()), imports);
        }

        for (hub_id, stream_id) in &sets.exports {
            let exports = time_steps
                .clone()
                .map(|time_step| {
                    let key = VariableKey::Export {
                        hub: hub_id.clone(),
                        stream: stream_id.clone(),
                        time_step,
                    };
                    builder.declare(key, Domain::NonNegative, 0.0, f64::INFINITY)
                })
                .collect::<Result<Vec<_>, _>>()?;
            vars.exports
                .insert((hub_id.clone(), stream_id.clone()), exports);
        }

        for storage in model.storages.values() {
            let id = &storage.id;
            let mut per_step = |make_key: fn(StorageID, usize) -> VariableKey| {
                time_steps
                    .clone()
                    .map(|time_step| {
                        let key = make_key(id.clone(), time_step);
                        builder.declare(key, Domain::NonNegative, 0.0, f64::INFINITY)
                    })
                    .collect::<Result<Vec<_>, _>>()
            };
            let charge = per_step(|storage, time_step| VariableKey::StorageCharge {
                storage,
                time_step,
            })?;
            let discharge = per_step(|storage, time_step| VariableKey::StorageDischarge {
                storage,
                time_step,
            })?;
            let state = (0..=time_steps.len())
                .map(|index| {
                    let key = VariableKey::StorageState {
                        storage: id.clone(),
                        index,
                    };
                    builder.declare(key, Domain::NonNegative, 0.0, f64::INFINITY)
                })
                .collect::<Result<Vec<_>, _>>()?;
            let installed_key = storage
                .requires_installation
                .then(|| VariableKey::StorageInstalled(id.clone()));
            let investment = InvestmentDecision::declare(
                builder,
                VariableKey::StorageCapacity(id.clone()),
                installed_key,
                &storage.capacity,
            )?;

            vars.storages.insert(
                id.clone(),
                StorageVariables {
                    charge,
                    discharge,
                    state,
                    investment,
                },
            );
        }

        let duration = config.duration;
        for link_id in &sets.links {
            let link = &model.links[link_id];
            let max_flow = duration * link.capacity.value();
            let investment = InvestmentDecision::fixed(
                builder,
                config.topology.installation_key(link_id),
                link.capacity.value(),
            )?;
            let (lower, upper) = config
                .convention
                .flow_bounds(config.topology.flow_limit(max_flow));
            let mut flows = IndexMap::new();
            for stream_id in &link.streams {
                let series = time_steps
                    .clone()
                    .map(|time_step| {
                        let key = VariableKey::LinkFlow {
                            link: link_id.clone(),
                            stream: stream_id.clone(),
                            time_step,
                        };
                        builder.declare(key, config.convention.domain(), lower, upper)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                flows.insert(stream_id.clone(), series);
            }

            vars.links
                .insert(link_id.clone(), LinkVariables { flows, investment });
        }

        Ok(vars)
    }
}

/// The formulation configuration, derived once from the model parameters.
///
/// The global toggles are resolved here into the strategies and constraint generators used for
/// the rest of the formulation.
pub struct FormulationConfig {
    /// Length of a time step in hours
    pub duration: f64,
    /// Interest rate for annualising investment
    pub interest_rate: Dimensionless,
    /// The quantity minimised
    pub objective: ObjectiveTarget,
    /// Initial state of charge policy for storages
    pub initial_state: StorageInitialState,
    /// Optional upper limit on total carbon
    pub max_carbon: Option<Carbon>,
    /// The sign convention for network flows
    pub convention: Box<dyn FlowConvention>,
    /// Whether links are given or optimised
    pub topology: Box<dyn Topology>,
    /// Constraint generators, applied in order
    pub generators: Vec<Box<dyn ConstraintGenerator>>,
}

impl FormulationConfig {
    /// Resolve the model parameters into a formulation configuration
    pub fn from_parameters(parameters: &ModelParameters) -> Self {
        let (convention, topology) = constraints::network::select_network_strategies(parameters);
        Self {
            duration: parameters.time_step_duration.value(),
            interest_rate: parameters.interest_rate,
            objective: parameters.objective,
            initial_state: parameters.storage_initial_state,
            max_carbon: parameters.max_carbon,
            convention,
            topology,
            generators: select_generators(parameters),
        }
    }
}

/// Everything a constraint or objective generator needs to read
pub struct FormulationContext<'a> {
    /// The model being formulated
    pub model: &'a Model,
    /// Index sets derived from the model
    pub sets: &'a IndexSets,
    /// The declared decision variables
    pub variables: &'a DecisionVariables,
    /// The formulation configuration
    pub config: &'a FormulationConfig,
}

/// A formulated problem together with what is needed to interpret its solution
#[derive(Debug)]
pub struct FormulatedModel<'a> {
    /// The model which was formulated
    pub model: &'a Model,
    /// Index sets derived from the model
    pub sets: IndexSets,
    /// The decision variables, by entity
    pub variables: DecisionVariables,
    /// Cost and carbon expressions
    pub costs: CostTerms,
    /// The assembled problem
    pub problem: Problem,
}

impl FormulatedModel<'_> {
    /// Solve the problem with the given solver and extract the results.
    ///
    /// # Returns
    ///
    /// The results or an error. If the solver did not find an optimal solution, the error is a
    /// [`results::SolveError`].
    pub fn solve<S: Solver + ?Sized>(&self, solver: &S) -> Result<Results> {
        let output = solver.solve(&self.problem)?;
        info!("Solver finished with status: {}", output.status);
        extract_results(self, &output)
    }
}

/// Formulate the energy hub problem for a model.
///
/// # Arguments
///
/// * `model` - The validated model data
///
/// # Returns
///
/// The formulated problem or an error if the model data is inconsistent (see
/// [`crate::model::ConfigurationError`]).
pub fn formulate(model: &Model) -> Result<FormulatedModel<'_>> {
    let sets = build_index_sets(model)?;
    let config = FormulationConfig::from_parameters(&model.parameters);
    let mut builder = ProblemBuilder::new();
    let variables = DecisionVariables::declare(model, &sets, &config, &mut builder)?;

    let ctx = FormulationContext {
        model,
        sets: &sets,
        variables: &variables,
        config: &config,
    };
    for generator in &config.generators {
        let before = builder.num_constraints();
        generator.generate(&ctx, &mut builder)?;
        debug!(
            "Added {} constraints for {}",
            builder.num_constraints() - before,
            generator.name()
        );
    }

    let costs = CostTerms::build(&ctx);
    let problem = builder.build(costs.objective(config.objective));
    info!(
        "Formulated problem with {} variables and {} constraints ({})",
        problem.variables().len(),
        problem.constraints().len(),
        problem.active_families().iter().join(", ")
    );

    Ok(FormulatedModel {
        model,
        sets,
        variables,
        costs,
        problem,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{
        assert_configuration_error, boiler_model, network_model, part_load_model,
    };
    use crate::model::{FlowDirection, NetworkTopology};
    use problem::ConstraintFamily;
    use rstest::rstest;

    #[rstest]
    fn test_formulate_boiler(boiler_model: Model) {
        let formulated = formulate(&boiler_model).unwrap();
        let problem = &formulated.problem;

        // 3 dispatch, 1 capacity and 3 import variables
        assert_eq!(problem.variables().len(), 7);
        let counts = problem.family_counts();
        assert_eq!(counts[&ConstraintFamily::EnergyBalance], 6);
        assert_eq!(counts[&ConstraintFamily::ConverterCapacity], 3);
        assert!(!counts.contains_key(&ConstraintFamily::PartLoad));
    }

    #[rstest]
    fn test_formulate_is_deterministic(network_model: Model) {
        let first = formulate(&network_model).unwrap();
        let second = formulate(&network_model).unwrap();
        assert_eq!(first.problem, second.problem);
        assert_eq!(first.variables, second.variables);
    }

    #[rstest]
    fn test_zero_demand_stream_has_balance(boiler_model: Model) {
        let formulated = formulate(&boiler_model).unwrap();
        let gas_balances = formulated
            .problem
            .iter_family(ConstraintFamily::EnergyBalance)
            .filter(|c| c.label.starts_with("hub1,gas"))
            .count();
        assert_eq!(gas_balances, 3);
    }

    #[rstest]
    fn test_part_load_binaries(part_load_model: Model) {
        let formulated = formulate(&part_load_model).unwrap();
        let vars = &formulated.variables.converters[0];
        assert_eq!(vars.on.as_ref().unwrap().len(), 3);
        assert_eq!(
            formulated
                .problem
                .iter_family(ConstraintFamily::PartLoad)
                .count(),
            6
        );
    }

    #[rstest]
    #[case(FlowDirection::Directed, NetworkTopology::Fixed, Domain::NonNegative, false)]
    #[case(FlowDirection::Signed, NetworkTopology::Fixed, Domain::Free, false)]
    #[case(FlowDirection::Directed, NetworkTopology::Optimised, Domain::NonNegative, true)]
    #[case(FlowDirection::Signed, NetworkTopology::Optimised, Domain::Free, true)]
    fn test_network_toggles(
        mut network_model: Model,
        #[case] direction: FlowDirection,
        #[case] topology: NetworkTopology,
        #[case] domain: Domain,
        #[case] has_binary: bool,
    ) {
        network_model.parameters.flow_direction = direction;
        network_model.parameters.topology = topology;
        let formulated = formulate(&network_model).unwrap();
        let link = &formulated.variables.links[0];
        let flow = link.flows[0][0];

        let definition = formulated.problem.variables().definition(flow);
        assert_eq!(definition.domain, domain);
        assert_eq!(link.investment.installed().is_some(), has_binary);
        let network_rows = formulated
            .problem
            .iter_family(ConstraintFamily::NetworkFlow)
            .count();
        let expected_rows = match (has_binary, direction) {
            (false, _) => 0,
            (true, FlowDirection::Directed) => 3,
            (true, FlowDirection::Signed) => 6,
        };
        assert_eq!(network_rows, expected_rows);
    }

    #[rstest]
    fn test_network_disabled_has_no_link_variables(mut network_model: Model) {
        network_model.parameters.network_enabled = false;
        let formulated = formulate(&network_model).unwrap();
        assert!(formulated.variables.links.is_empty());
    }

    #[rstest]
    fn test_configuration_error_before_solve(mut boiler_model: Model) {
        boiler_model.converters[0].hub = "nowhere".into();
        assert_configuration_error!(formulate(&boiler_model), "converter boiler", "hub");
    }

    #[rstest]
    fn test_negative_duration_is_configuration_error(mut network_model: Model) {
        network_model.parameters.time_step_duration = crate::units::Hours(-1.0);
        assert_configuration_error!(formulate(&network_model), "model", "time_step_duration");
    }

    #[rstest]
    fn test_independent_formulations_in_parallel(boiler_model: Model, network_model: Model) {
        let (first, second) = std::thread::scope(|s| {
            let a = s.spawn(|| formulate(&boiler_model).map(|f| f.problem));
            let b = s.spawn(|| formulate(&network_model).map(|f| f.problem));
            (a.join().unwrap().unwrap(), b.join().unwrap().unwrap())
        });
        assert_eq!(first, formulate(&boiler_model).unwrap().problem);
        assert_eq!(second, formulate(&network_model).unwrap().problem);
    }
}
