//! Energy balance constraints.
use super::ConstraintGenerator;
use crate::hub::HubID;
use crate::optimisation::FormulationContext;
use crate::optimisation::problem::{ConstraintFamily, LinearExpr, ProblemBuilder, Relation};
use crate::stream::StreamID;
use anyhow::Result;

/// Conservation of every stream at every hub and time step.
///
/// For each (hub, stream, time step):
///
/// ```text
///   Σ converter output − Σ converter input + import − export
///   − storage charge + storage discharge
///   − Σ link outflow + Σ delivered fraction × link inflow
///   = demand
/// ```
///
/// Every hub/stream pair is balanced, including those with no demand.
pub struct EnergyBalance;

impl ConstraintGenerator for EnergyBalance {
    fn name(&self) -> &'static str {
        "energy balance"
    }

    fn generate(&self, ctx: &FormulationContext, builder: &mut ProblemBuilder) -> Result<()> {
        for (hub_id, stream_id) in &ctx.sets.balances {
            let hub = &ctx.model.hubs[hub_id];
            for time_step in ctx.sets.time_steps.clone() {
                let expr = balance_expr(ctx, hub_id, stream_id, time_step);
                builder.add_constraint(
                    ConstraintFamily::EnergyBalance,
                    format!("{hub_id},{stream_id},{}", time_step + 1),
                    expr,
                    Relation::Equal,
                    hub.demand(stream_id, time_step).value(),
                );
            }
        }

        Ok(())
    }
}

/// The net supply of a stream at a hub and time step
fn balance_expr(
    ctx: &FormulationContext,
    hub_id: &HubID,
    stream_id: &StreamID,
    time_step: usize,
) -> LinearExpr {
    let model = ctx.model;
    let vars = ctx.variables;
    let mut expr = LinearExpr::new();

    // Converters
    for (converter_id, converter_vars) in &vars.converters {
        let converter = &model.converters[converter_id];
        if &converter.hub != hub_id {
            continue;
        }

        let coeff = converter.net_coefficient(stream_id);
        if coeff != 0.0 {
            expr.add_term(converter_vars.dispatch[time_step], coeff);
        }
    }

    // Imports and exports
    let key = (hub_id.clone(), stream_id.clone());
    if let Some(imports) = vars.imports.get(&key) {
        expr.add_term(imports[time_step], 1.0);
    }
    if let Some(exports) = vars.exports.get(&key) {
        expr.add_term(exports[time_step], -1.0);
    }

    // Storage
    for (storage_id, storage_vars) in &vars.storages {
        let storage = &model.storages[storage_id];
        if &storage.hub == hub_id && &storage.stream == stream_id {
            expr.add_term(storage_vars.charge[time_step], -1.0);
            expr.add_term(storage_vars.discharge[time_step], 1.0);
        }
    }

    // Network
    for (link_id, link_vars) in &vars.links {
        let link = &model.links[link_id];
        let Some(flows) = link_vars.flows.get(stream_id) else {
            continue;
        };

        if &link.from == hub_id {
            expr.add_term(flows[time_step], -1.0);
        }
        if &link.to == hub_id {
            let delivered = ctx.config.convention.delivered_fraction(link);
            expr.add_term(flows[time_step], delivered);
        }
    }

    expr
}
