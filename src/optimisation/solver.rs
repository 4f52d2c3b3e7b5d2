//! The boundary between the formulated problem and a MILP solver.
use super::problem::{Problem, Relation};
use super::variables::Domain;
use crate::settings::SolverSettings;
use anyhow::Result;
use highs::{HighsModelStatus, RowProblem, Sense};
use log::warn;
use std::fmt;

/// The outcome of a solve
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    /// An optimal solution was found
    Optimal,
    /// No assignment satisfies the constraints
    Infeasible,
    /// The objective can be made arbitrarily small
    Unbounded,
    /// The time limit was reached before optimality was proven
    TimedOut,
    /// The solver failed for another reason
    Failed(String),
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::Infeasible => write!(f, "infeasible"),
            Self::Unbounded => write!(f, "unbounded"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// What a solver reports back
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    /// The outcome
    pub status: SolveStatus,
    /// A value for every variable, indexed by column (empty unless optimal)
    pub values: Vec<f64>,
}

impl SolverOutput {
    /// An output with no solution values
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
        }
    }
}

/// A MILP solver
pub trait Solver {
    /// Solve the problem.
    ///
    /// A problem without an optimal solution is not an error at this level: it is reported via
    /// [`SolverOutput::status`]. Errors are reserved for failures to run the solver at all.
    fn solve(&self, problem: &Problem) -> Result<SolverOutput>;
}

/// Solves problems with the HiGHS solver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighsSolver {
    /// Time limit in seconds
    pub time_limit: Option<f64>,
    /// Relative MIP gap at which to stop
    pub mip_rel_gap: Option<f64>,
    /// Whether to print the solver log to the console
    pub log_output: bool,
}

impl HighsSolver {
    /// Create a solver from the program settings
    pub fn from_settings(settings: &SolverSettings) -> Self {
        Self {
            time_limit: settings.time_limit,
            mip_rel_gap: settings.mip_rel_gap,
            log_output: settings.solver_output,
        }
    }

    fn run(&self, problem: &Problem, presolve: bool) -> SolverOutput {
        let mut model = to_row_problem(problem).optimise(Sense::Minimise);
        model.set_option("output_flag", self.log_output);
        model.set_option("log_to_console", self.log_output);
        if let Some(time_limit) = self.time_limit {
            model.set_option("time_limit", time_limit);
        }
        if let Some(gap) = self.mip_rel_gap {
            model.set_option("mip_rel_gap", gap);
        }
        if !presolve {
            model.set_option("presolve", "off");
        }

        let solved = match model.try_solve() {
            Ok(solved) => solved,
            Err(status) => {
                return SolverOutput::without_solution(SolveStatus::Failed(format!("{status:?}")));
            }
        };
        let status = match solved.status() {
            HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => SolveStatus::Optimal,
            HighsModelStatus::Infeasible => SolveStatus::Infeasible,
            HighsModelStatus::Unbounded => SolveStatus::Unbounded,
            HighsModelStatus::ReachedTimeLimit => SolveStatus::TimedOut,
            HighsModelStatus::UnboundedOrInfeasible if presolve => {
                warn!("HiGHS could not tell if the problem is infeasible or unbounded; retrying without presolve");
                return self.run(problem, false);
            }
            status => SolveStatus::Failed(format!("{status:?}")),
        };
        if status != SolveStatus::Optimal {
            return SolverOutput::without_solution(status);
        }

        SolverOutput {
            status,
            values: solved.get_solution().columns().to_vec(),
        }
    }
}

impl Solver for HighsSolver {
    fn solve(&self, problem: &Problem) -> Result<SolverOutput> {
        Ok(self.run(problem, true))
    }
}

/// Convert a problem into the form accepted by HiGHS.
///
/// Columns are added in variable order, so column `i` is the variable with index `i`.
fn to_row_problem(problem: &Problem) -> RowProblem {
    let mut highs_problem = RowProblem::default();
    let objective = &problem.objective().expr;
    let columns: Vec<_> = problem
        .variables()
        .iter()
        .map(|(var, definition)| {
            let cost = objective.coefficient(var);
            let bounds = definition.lower..=definition.upper;
            match definition.domain {
                Domain::Binary => highs_problem.add_integer_column(cost, bounds),
                Domain::NonNegative | Domain::Free => highs_problem.add_column(cost, bounds),
            }
        })
        .collect();

    for constraint in problem.constraints() {
        let factors = constraint
            .expr
            .iter_terms()
            .filter(|(_, coeff)| *coeff != 0.0)
            .map(|(var, coeff)| (columns[var.index()], coeff));
        let rhs = constraint.rhs;
        match constraint.relation {
            Relation::LessEqual => highs_problem.add_row(..=rhs, factors),
            Relation::GreaterEqual => highs_problem.add_row(rhs.., factors),
            Relation::Equal => highs_problem.add_row(rhs..=rhs, factors),
        }
    }

    highs_problem
}
