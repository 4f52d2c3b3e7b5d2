//! The solver-agnostic representation of a mixed-integer linear program.
use super::variables::{
    ConflictingDeclarationError, Domain, Variable, VariableKey, VariableRegistry,
};
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// A linear expression: a sum of weighted variables plus a constant.
///
/// Terms for the same variable are merged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearExpr {
    terms: IndexMap<Variable, f64>,
    constant: f64,
}

impl LinearExpr {
    /// An empty expression (equal to zero)
    pub fn new() -> Self {
        Self::default()
    }

    /// An expression with no variables
    pub fn constant(value: f64) -> Self {
        Self {
            terms: IndexMap::new(),
            constant: value,
        }
    }

    /// An expression consisting of a single weighted variable
    pub fn term(var: Variable, coeff: f64) -> Self {
        let mut expr = Self::new();
        expr.add_term(var, coeff);
        expr
    }

    /// Add `coeff * var` to the expression
    pub fn add_term(&mut self, var: Variable, coeff: f64) {
        *self.terms.entry(var).or_insert(0.0) += coeff;
    }

    /// Add a constant to the expression
    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Add `scale * other` to the expression
    pub fn add_scaled(&mut self, other: &LinearExpr, scale: f64) {
        for (var, coeff) in other.iter_terms() {
            self.add_term(var, scale * coeff);
        }
        self.constant += scale * other.constant;
    }

    /// Builder-style version of [`LinearExpr::add_term`]
    pub fn with_term(mut self, var: Variable, coeff: f64) -> Self {
        self.add_term(var, coeff);
        self
    }

    /// Builder-style version of [`LinearExpr::add_scaled`]
    pub fn with_scaled(mut self, other: &LinearExpr, scale: f64) -> Self {
        self.add_scaled(other, scale);
        self
    }

    /// Iterate over the (variable, coefficient) terms
    pub fn iter_terms(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.terms.iter().map(|(var, coeff)| (*var, *coeff))
    }

    /// The constant part of the expression
    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    /// The coefficient of `var` (zero if absent)
    pub fn coefficient(&self, var: Variable) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    /// Whether the expression has no variable terms
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate the expression given values for every variable, indexed by column
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|(var, coeff)| coeff * values[var.index()])
                .sum::<f64>()
    }
}

/// The relational operator of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `expr <= rhs`
    LessEqual,
    /// `expr >= rhs`
    GreaterEqual,
    /// `expr == rhs`
    Equal,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
        };
        write!(f, "{op}")
    }
}

/// The family a constraint belongs to, used for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
pub enum ConstraintFamily {
    /// Conservation of every stream at every hub and time step
    #[strum(to_string = "energy balance")]
    EnergyBalance,
    /// State of charge carried between time steps
    #[strum(to_string = "storage continuity")]
    StorageContinuity,
    /// State of charge and charge/discharge limits
    #[strum(to_string = "storage bounds")]
    StorageBounds,
    /// Converter output limited by capacity
    #[strum(to_string = "converter capacity")]
    ConverterCapacity,
    /// No capacity without installation
    #[strum(to_string = "investment link")]
    InvestmentLink,
    /// Minimum load while switched on
    #[strum(to_string = "part load")]
    PartLoad,
    /// Input collected in proportion to capacity
    #[strum(to_string = "source yield")]
    SourceYield,
    /// Total capacity of roof-mounted converters at a hub
    #[strum(to_string = "roof area")]
    RoofArea,
    /// Link flows limited by installation
    #[strum(to_string = "network flow")]
    NetworkFlow,
    /// Upper limit on emissions
    #[strum(to_string = "carbon limit")]
    CarbonLimit,
}

/// A linear constraint `expr (relation) rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// The family the constraint belongs to
    pub family: ConstraintFamily,
    /// A human-readable identity for the constraint
    pub label: String,
    /// The left-hand side
    pub expr: LinearExpr,
    /// The relational operator
    pub relation: Relation,
    /// The right-hand side
    pub rhs: f64,
}

impl Constraint {
    /// The value of `lhs - rhs` for the given assignment
    pub fn residual(&self, values: &[f64]) -> f64 {
        self.expr.evaluate(values) - self.rhs
    }

    /// Whether the assignment satisfies the constraint to within `tolerance`
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let residual = self.residual(values);
        match self.relation {
            Relation::LessEqual => residual <= tolerance,
            Relation::GreaterEqual => residual >= -tolerance,
            Relation::Equal => residual.abs() <= tolerance,
        }
    }
}

/// Direction of optimisation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// Minimise the objective
    Minimise,
}

/// The objective function
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// The direction of optimisation
    pub sense: Sense,
    /// The expression to optimise
    pub expr: LinearExpr,
}

/// An assembled optimisation problem.
///
/// Problems are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    variables: VariableRegistry,
    constraints: Vec<Constraint>,
    objective: Objective,
}

impl Problem {
    /// The variables in the problem
    pub fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    /// The constraints in the problem, in the order they were generated
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The objective function
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// The constraint families with at least one constraint, in order of first appearance
    pub fn active_families(&self) -> IndexSet<ConstraintFamily> {
        self.constraints.iter().map(|c| c.family).collect()
    }

    /// Iterate over the constraints of one family
    pub fn iter_family(&self, family: ConstraintFamily) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(move |c| c.family == family)
    }

    /// Number of constraints per family
    pub fn family_counts(&self) -> IndexMap<ConstraintFamily, usize> {
        let mut counts = IndexMap::new();
        for constraint in &self.constraints {
            *counts.entry(constraint.family).or_insert(0) += 1;
        }

        counts
    }
}

/// Incrementally assembles a [`Problem`]
#[derive(Debug, Default)]
pub struct ProblemBuilder {
    variables: VariableRegistry,
    constraints: Vec<Constraint>,
}

impl ProblemBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable (see [`VariableRegistry::declare`])
    pub fn declare(
        &mut self,
        key: VariableKey,
        domain: Domain,
        lower: f64,
        upper: f64,
    ) -> Result<Variable, ConflictingDeclarationError> {
        self.variables.declare(key, domain, lower, upper)
    }

    /// Declare a binary variable
    pub fn declare_binary(
        &mut self,
        key: VariableKey,
    ) -> Result<Variable, ConflictingDeclarationError> {
        self.variables.declare_binary(key)
    }

    /// The variables declared so far
    pub fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    /// Add a constraint.
    ///
    /// Any constant in `expr` is moved to the right-hand side.
    pub fn add_constraint(
        &mut self,
        family: ConstraintFamily,
        label: String,
        mut expr: LinearExpr,
        relation: Relation,
        rhs: f64,
    ) {
        let rhs = rhs - expr.constant;
        expr.constant = 0.0;
        self.constraints.push(Constraint {
            family,
            label,
            expr,
            relation,
            rhs,
        });
    }

    /// Number of constraints added so far
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Finish building with the given objective
    pub fn build(self, objective: LinearExpr) -> Problem {
        Problem {
            variables: self.variables,
            constraints: self.constraints,
            objective: Objective {
                sense: Sense::Minimise,
                expr: objective,
            },
        }
    }
}
