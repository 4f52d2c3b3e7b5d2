//! Storage continuity and limits.
use super::ConstraintGenerator;
use crate::model::StorageInitialState;
use crate::optimisation::problem::{ConstraintFamily, LinearExpr, ProblemBuilder, Relation};
use crate::optimisation::{FormulationContext, StorageVariables};
use crate::storage::Storage;
use anyhow::Result;

/// State-of-charge dynamics and limits for storages.
///
/// The state of charge `E` is indexed over `0..=T`: `E[0]` is the state before the first time
/// step and `E[t + 1]` the state after time step `t`. For every time step:
///
/// ```text
///   E[t + 1] = (1 − loss) E[t] + charge_eff Qin[t] − Qout[t] / discharge_eff
/// ```
///
/// `E[0]` is tied to `E[T]` (cyclic) or to a fixed fraction of capacity.
pub struct StorageDynamics {
    initial_state: StorageInitialState,
}

impl StorageDynamics {
    /// Create a generator using the given initial state policy
    pub fn new(initial_state: StorageInitialState) -> Self {
        Self { initial_state }
    }

    fn add_continuity(
        &self,
        storage: &Storage,
        vars: &StorageVariables,
        capacity: &LinearExpr,
        builder: &mut ProblemBuilder,
    ) {
        let id = &storage.id;
        let retention = 1.0 - storage.standing_loss.value();
        let charge_efficiency = storage.charge_efficiency.value();
        let discharge_efficiency = storage.discharge_efficiency.value();

        for (time_step, (&charge, &discharge)) in
            vars.charge.iter().zip(&vars.discharge).enumerate()
        {
            let expr = LinearExpr::term(vars.state[time_step + 1], 1.0)
                .with_term(vars.state[time_step], -retention)
                .with_term(charge, -charge_efficiency)
                .with_term(discharge, 1.0 / discharge_efficiency);
            builder.add_constraint(
                ConstraintFamily::StorageContinuity,
                format!("{id},{}", time_step + 1),
                expr,
                Relation::Equal,
                0.0,
            );
        }

        let first = LinearExpr::term(vars.state[0], 1.0);
        let expr = match self.initial_state {
            StorageInitialState::Cyclic => {
                let last = *vars.state.last().expect("State of charge series is empty");
                first.with_term(last, -1.0)
            }
            StorageInitialState::Fixed { fraction } => {
                first.with_scaled(capacity, -fraction.value())
            }
        };
        builder.add_constraint(
            ConstraintFamily::StorageContinuity,
            format!("{id},initial"),
            expr,
            Relation::Equal,
            0.0,
        );
    }
}

/// Add limits on state of charge and on charge/discharge rates
fn add_bounds(
    storage: &Storage,
    vars: &StorageVariables,
    capacity: &LinearExpr,
    builder: &mut ProblemBuilder,
) {
    let id = &storage.id;
    let min_state = storage.min_state_of_charge.value();

    for (index, &state) in vars.state.iter().enumerate() {
        let label = format!("{id},{index}");
        builder.add_constraint(
            ConstraintFamily::StorageBounds,
            label.clone(),
            LinearExpr::term(state, 1.0).with_scaled(capacity, -1.0),
            Relation::LessEqual,
            0.0,
        );
        if min_state > 0.0 {
            builder.add_constraint(
                ConstraintFamily::StorageBounds,
                label,
                LinearExpr::term(state, 1.0).with_scaled(capacity, -min_state),
                Relation::GreaterEqual,
                0.0,
            );
        }
    }

    let rates = [
        (&vars.charge, storage.max_charge_rate.value()),
        (&vars.discharge, storage.max_discharge_rate.value()),
    ];
    for (series, rate) in rates {
        for (time_step, &var) in series.iter().enumerate() {
            builder.add_constraint(
                ConstraintFamily::StorageBounds,
                format!("{id},{}", time_step + 1),
                LinearExpr::term(var, 1.0).with_scaled(capacity, -rate),
                Relation::LessEqual,
                0.0,
            );
        }
    }
}

impl ConstraintGenerator for StorageDynamics {
    fn name(&self) -> &'static str {
        "storage dynamics"
    }

    fn generate(&self, ctx: &FormulationContext, builder: &mut ProblemBuilder) -> Result<()> {
        for (id, vars) in &ctx.variables.storages {
            let storage = &ctx.model.storages[id];
            let capacity = vars.investment.capacity_expr();
            self.add_continuity(storage, vars, &capacity, builder);
            add_bounds(storage, vars, &capacity, builder);
        }

        Ok(())
    }
}
