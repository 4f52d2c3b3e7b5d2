//! Investment decisions: the coupling of a capacity with an optional installation binary.
use super::problem::{ConstraintFamily, LinearExpr, ProblemBuilder, Relation};
use super::variables::{Domain, Variable, VariableKey};
use crate::capacity::CapacitySpec;
use anyhow::{Result, bail, ensure};

/// The capacity part of an investment decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapacityTerm {
    /// Capacity is a known value
    Fixed(f64),
    /// Capacity is a decision variable
    Variable(Variable),
}

/// The capacity of a technology together with whether it is installed.
///
/// When installation is a binary decision `Y`, the capacity is zero unless `Y` is one:
///
/// * for a fixed capacity `C`, the effective capacity is the expression `C * Y`;
/// * for a variable capacity with upper limit `M`, the constraint `Capacity - M * Y <= 0` is added
///   when the decision is declared.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentDecision {
    capacity: CapacityTerm,
    installed: Option<Variable>,
    max_capacity: Option<f64>,
}

impl InvestmentDecision {
    /// Declare the variables for an investment decision and enforce its linking constraint.
    ///
    /// # Arguments
    ///
    /// * `builder` - The problem being assembled
    /// * `capacity_key` - Key for the capacity variable, if capacity is optimised
    /// * `installed_key` - Key for the installation binary, if installation is a decision
    /// * `spec` - How capacity is determined
    pub fn declare(
        builder: &mut ProblemBuilder,
        capacity_key: VariableKey,
        installed_key: Option<VariableKey>,
        spec: &CapacitySpec,
    ) -> Result<Self> {
        let max = match spec {
            CapacitySpec::Fixed(capacity) => {
                return Self::fixed(builder, installed_key, capacity.value());
            }
            CapacitySpec::Optimised { max } => max.map(|max| max.value()),
        };

        let label = capacity_key.to_string();
        let capacity = builder.declare(
            capacity_key,
            Domain::NonNegative,
            0.0,
            max.unwrap_or(f64::INFINITY),
        )?;
        let installed = match installed_key {
            Some(key) => {
                let Some(max) = max else {
                    bail!("{label} requires a maximum capacity to be installed");
                };
                let installed = builder.declare_binary(key)?;
                builder.add_constraint(
                    ConstraintFamily::InvestmentLink,
                    label,
                    LinearExpr::term(capacity, 1.0).with_term(installed, -max),
                    Relation::LessEqual,
                    0.0,
                );
                Some(installed)
            }
            None => None,
        };

        Ok(Self {
            capacity: CapacityTerm::Variable(capacity),
            installed,
            max_capacity: max,
        })
    }

    /// Declare an investment decision for a known capacity
    pub fn fixed(
        builder: &mut ProblemBuilder,
        installed_key: Option<VariableKey>,
        capacity: f64,
    ) -> Result<Self> {
        ensure!(
            capacity.is_finite() && capacity >= 0.0,
            "Fixed capacity must be finite and non-negative"
        );
        let installed = installed_key
            .map(|key| builder.declare_binary(key))
            .transpose()?;

        Ok(Self {
            capacity: CapacityTerm::Fixed(capacity),
            installed,
            max_capacity: Some(capacity),
        })
    }

    /// The capacity part of the decision
    pub fn capacity(&self) -> CapacityTerm {
        self.capacity
    }

    /// The installation binary, if installation is a decision
    pub fn installed(&self) -> Option<Variable> {
        self.installed
    }

    /// The largest capacity that can be installed, if bounded
    pub fn max_capacity(&self) -> Option<f64> {
        self.max_capacity
    }

    /// The effective capacity as a linear expression
    pub fn capacity_expr(&self) -> LinearExpr {
        match (self.capacity, self.installed) {
            (CapacityTerm::Fixed(value), None) => LinearExpr::constant(value),
            (CapacityTerm::Fixed(value), Some(installed)) => LinearExpr::term(installed, value),
            (CapacityTerm::Variable(var), _) => LinearExpr::term(var, 1.0),
        }
    }

    /// Whether the technology is installed as an expression (one if there is no decision)
    pub fn installed_expr(&self) -> LinearExpr {
        match self.installed {
            Some(installed) => LinearExpr::term(installed, 1.0),
            None => LinearExpr::constant(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Capacity;

    fn keys() -> (VariableKey, VariableKey) {
        (
            VariableKey::ConverterCapacity("chp".into()),
            VariableKey::ConverterInstalled("chp".into()),
        )
    }

    #[test]
    fn test_optimised_with_installation() {
        let mut builder = ProblemBuilder::new();
        let (capacity_key, installed_key) = keys();
        let spec = CapacitySpec::Optimised {
            max: Some(Capacity(50.0)),
        };
        let decision =
            InvestmentDecision::declare(&mut builder, capacity_key, Some(installed_key), &spec)
                .unwrap();
        let problem = builder.build(LinearExpr::new());

        let CapacityTerm::Variable(capacity) = decision.capacity() else {
            panic!("Capacity should be a variable");
        };
        let installed = decision.installed().unwrap();
        assert_eq!(problem.variables().definition(capacity).upper, 50.0);

        let link: Vec<_> = problem.iter_family(ConstraintFamily::InvestmentLink).collect();
        assert_eq!(link.len(), 1);
        assert_eq!(link[0].expr.coefficient(capacity), 1.0);
        assert_eq!(link[0].expr.coefficient(installed), -50.0);

        // No capacity without installation
        assert!(!link[0].is_satisfied(&[10.0, 0.0], 1e-9));
        assert!(link[0].is_satisfied(&[10.0, 1.0], 1e-9));
        assert!(link[0].is_satisfied(&[0.0, 0.0], 1e-9));
    }

    #[test]
    fn test_optimised_without_max_requires_no_installation() {
        let mut builder = ProblemBuilder::new();
        let (capacity_key, installed_key) = keys();
        let spec = CapacitySpec::Optimised { max: None };
        assert!(
            InvestmentDecision::declare(&mut builder, capacity_key, Some(installed_key), &spec)
                .is_err()
        );
    }

    #[test]
    fn test_optimised_unbounded() {
        let mut builder = ProblemBuilder::new();
        let (capacity_key, _) = keys();
        let spec = CapacitySpec::Optimised { max: None };
        let decision = InvestmentDecision::declare(&mut builder, capacity_key, None, &spec).unwrap();

        assert_eq!(decision.max_capacity(), None);
        assert!(decision.installed().is_none());
        assert_eq!(builder.num_constraints(), 0);
        assert_eq!(decision.installed_expr(), LinearExpr::constant(1.0));
    }

    #[test]
    fn test_fixed_capacity() {
        let mut builder = ProblemBuilder::new();
        let (capacity_key, installed_key) = keys();
        let spec = CapacitySpec::Fixed(Capacity(15.0));

        let decision =
            InvestmentDecision::declare(&mut builder, capacity_key.clone(), None, &spec).unwrap();
        assert_eq!(decision.capacity_expr(), LinearExpr::constant(15.0));
        assert!(builder.variables().is_empty());

        let gated =
            InvestmentDecision::declare(&mut builder, capacity_key, Some(installed_key), &spec)
                .unwrap();
        let installed = gated.installed().unwrap();
        assert_eq!(gated.capacity_expr(), LinearExpr::term(installed, 15.0));
        assert_eq!(builder.num_constraints(), 0);
    }
}
