//! Mapping solved variable values back onto the model.
use super::investment::InvestmentDecision;
use super::problem::{ConstraintFamily, LinearExpr};
use super::FormulatedModel;
use super::solver::{SolveStatus, SolverOutput};
use super::variables::Variable;
use crate::converter::ConverterID;
use crate::hub::HubID;
use crate::network::LinkID;
use crate::storage::StorageID;
use crate::stream::StreamID;
use crate::units::{Capacity, Carbon, Energy, Money};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use std::error::Error;
use std::fmt;

/// Binary variables above this value are taken to be one
const BINARY_THRESHOLD: f64 = 0.5;

/// Indicates that the solver did not find an optimal solution
#[derive(Debug, Clone, PartialEq)]
pub struct SolveError {
    /// The status reported by the solver
    pub status: SolveStatus,
    /// The constraint families present in the problem
    pub active_families: Vec<ConstraintFamily>,
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No optimal solution found: problem is {} (active constraints: {})",
            self.status,
            self.active_families.iter().join(", ")
        )
    }
}

impl Error for SolveError {}

/// Scalar cost and carbon totals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostSummary {
    /// Annualised investment cost
    pub investment: Money,
    /// Cost of imports
    pub operating: Money,
    /// Maintenance cost
    pub maintenance: Money,
    /// Income from exports
    pub export_income: Money,
    /// Investment + operating + maintenance − export income
    pub total: Money,
    /// Carbon emitted by imports
    pub carbon: Carbon,
}

/// Results for a converter
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterResult {
    /// Effective capacity
    pub capacity: Capacity,
    /// Whether the converter is installed (always true without an installation decision)
    pub installed: bool,
    /// Total input at each time step
    pub dispatch: Vec<Energy>,
    /// Flow of each stream at each time step (inputs are negative)
    pub flows: IndexMap<StreamID, Vec<Energy>>,
}

/// Results for a storage
#[derive(Debug, Clone, PartialEq)]
pub struct StorageResult {
    /// Effective capacity
    pub capacity: Capacity,
    /// Whether the storage is installed (always true without an installation decision)
    pub installed: bool,
    /// Energy charged at each time step
    pub charge: Vec<Energy>,
    /// Energy discharged at each time step
    pub discharge: Vec<Energy>,
    /// State of charge before the first time step, then after each time step
    pub state_of_charge: Vec<Energy>,
}

/// Results for a network link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkResult {
    /// Capacity of the link
    pub capacity: Capacity,
    /// Whether the link is built
    pub installed: bool,
    /// Flow of each stream at each time step, positive from `from` to `to`
    pub flows: IndexMap<StreamID, Vec<Energy>>,
}

/// The solution of an energy hub problem, in terms of the model
#[derive(Debug, Clone, PartialEq)]
pub struct Results {
    /// Value of the objective function
    pub objective_value: f64,
    /// Cost and carbon totals
    pub costs: CostSummary,
    /// Results for each converter
    pub converters: IndexMap<ConverterID, ConverterResult>,
    /// Results for each storage
    pub storages: IndexMap<StorageID, StorageResult>,
    /// Imports for each (hub, stream) pair at each time step
    pub imports: IndexMap<(HubID, StreamID), Vec<Energy>>,
    /// Exports for each (hub, stream) pair at each time step
    pub exports: IndexMap<(HubID, StreamID), Vec<Energy>>,
    /// Results for each included link
    pub links: IndexMap<LinkID, LinkResult>,
    /// The raw value of every variable, indexed by column
    pub values: Vec<f64>,
}

/// Reads values out of a solver assignment
struct Assignment<'a>(&'a [f64]);

impl Assignment<'_> {
    fn value(&self, var: Variable) -> f64 {
        self.0[var.index()]
    }

    fn energy_series(&self, vars: &[Variable]) -> Vec<Energy> {
        vars.iter().map(|&var| Energy(self.value(var))).collect()
    }

    fn evaluate(&self, expr: &LinearExpr) -> f64 {
        expr.evaluate(self.0)
    }

    fn capacity(&self, investment: &InvestmentDecision) -> Capacity {
        Capacity(self.evaluate(&investment.capacity_expr()))
    }

    fn is_installed(&self, investment: &InvestmentDecision) -> bool {
        investment
            .installed()
            .is_none_or(|var| self.value(var) > BINARY_THRESHOLD)
    }
}

/// Extract results from a solver's output.
///
/// # Returns
///
/// The results or, if the solution is not optimal, a [`SolveError`].
pub fn extract_results(formulated: &FormulatedModel, output: &SolverOutput) -> Result<Results> {
    let problem = &formulated.problem;
    if output.status != SolveStatus::Optimal {
        return Err(SolveError {
            status: output.status.clone(),
            active_families: problem.active_families().into_iter().collect(),
        }
        .into());
    }
    ensure!(
        output.values.len() == problem.variables().len(),
        "Solver returned {} values for {} variables",
        output.values.len(),
        problem.variables().len()
    );

    let assignment = Assignment(&output.values);
    let model = formulated.model;
    let vars = &formulated.variables;
    let costs = &formulated.costs;

    let converters = vars
        .converters
        .iter()
        .map(|(id, converter_vars)| {
            let converter = &model.converters[id];
            let dispatch = assignment.energy_series(&converter_vars.dispatch);
            let flows = converter
                .inputs
                .keys()
                .chain(converter.outputs.keys())
                .map(|stream_id| {
                    let coeff = converter.net_coefficient(stream_id);
                    let series = dispatch.iter().map(|&x| Energy(coeff * x.value())).collect();
                    (stream_id.clone(), series)
                })
                .collect();
            let result = ConverterResult {
                capacity: assignment.capacity(&converter_vars.investment),
                installed: assignment.is_installed(&converter_vars.investment),
                dispatch,
                flows,
            };
            (id.clone(), result)
        })
        .collect();

    let storages = vars
        .storages
        .iter()
        .map(|(id, storage_vars)| {
            let result = StorageResult {
                capacity: assignment.capacity(&storage_vars.investment),
                installed: assignment.is_installed(&storage_vars.investment),
                charge: assignment.energy_series(&storage_vars.charge),
                discharge: assignment.energy_series(&storage_vars.discharge),
                state_of_charge: assignment.energy_series(&storage_vars.state),
            };
            (id.clone(), result)
        })
        .collect();

    let exchange = |map: &IndexMap<(HubID, StreamID), Vec<Variable>>| -> IndexMap<_, _> {
        map.iter()
            .map(|(key, series)| (key.clone(), assignment.energy_series(series)))
            .collect()
    };

    let links = vars
        .links
        .iter()
        .map(|(id, link_vars)| {
            let flows = link_vars
                .flows
                .iter()
                .map(|(stream_id, series)| (stream_id.clone(), assignment.energy_series(series)))
                .collect();
            let result = LinkResult {
                capacity: assignment.capacity(&link_vars.investment),
                installed: assignment.is_installed(&link_vars.investment),
                flows,
            };
            (id.clone(), result)
        })
        .collect();

    Ok(Results {
        objective_value: assignment.evaluate(&problem.objective().expr),
        costs: CostSummary {
            investment: Money(assignment.evaluate(&costs.investment)),
            operating: Money(assignment.evaluate(&costs.operating)),
            maintenance: Money(assignment.evaluate(&costs.maintenance)),
            export_income: Money(assignment.evaluate(&costs.export_income)),
            total: Money(assignment.evaluate(&costs.total_cost())),
            carbon: Carbon(assignment.evaluate(&costs.carbon)),
        },
        converters,
        storages,
        imports: exchange(&vars.imports),
        exports: exchange(&vars.exports),
        links,
        values: output.values.clone(),
    })
}
