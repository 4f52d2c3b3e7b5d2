//! Constraints for converters whose input depends on their size.
use super::ConstraintGenerator;
use crate::hub::Hub;
use crate::optimisation::FormulationContext;
use crate::optimisation::problem::{ConstraintFamily, LinearExpr, ProblemBuilder, Relation};
use anyhow::{Context, Result};

/// Ties capacity-linked inputs to installed capacity and limits roof-mounted capacity.
///
/// A converter with a source yield takes a share `s` of its dispatch `x` from a stream which is
/// collected at `y[t]` per unit of capacity (e.g. irradiation on a solar panel):
///
/// ```text
///   s x[t] − y[t] Capacity = 0
/// ```
///
/// At a hub with a roof area `A`, the roof-mounted converters share it:
///
/// ```text
///   Σ Capacity <= A
/// ```
pub struct SourceAvailability;

impl ConstraintGenerator for SourceAvailability {
    fn name(&self) -> &'static str {
        "source availability"
    }

    fn generate(&self, ctx: &FormulationContext, builder: &mut ProblemBuilder) -> Result<()> {
        for (id, vars) in &ctx.variables.converters {
            let converter = &ctx.model.converters[id];
            let Some(stream) = &converter.source_yield else {
                continue;
            };
            let share = converter
                .inputs
                .get(stream)
                .with_context(|| format!("Converter {id} does not take {stream} as an input"))?
                .value();
            let hub = &ctx.model.hubs[&converter.hub];
            let capacity = vars.investment.capacity_expr();

            for (time_step, &dispatch) in vars.dispatch.iter().enumerate() {
                let yield_ = hub.yield_per_capacity(stream, time_step).with_context(|| {
                    format!("Hub {} has no yield for stream {stream}", hub.id)
                })?;
                builder.add_constraint(
                    ConstraintFamily::SourceYield,
                    format!("{id},{}", time_step + 1),
                    LinearExpr::term(dispatch, share).with_scaled(&capacity, -yield_.value()),
                    Relation::Equal,
                    0.0,
                );
            }
        }

        for hub in ctx.model.hubs.values() {
            let Some(roof_area) = hub.roof_area else {
                continue;
            };
            if let Some(expr) = roof_capacity_expr(ctx, hub) {
                builder.add_constraint(
                    ConstraintFamily::RoofArea,
                    hub.id.to_string(),
                    expr,
                    Relation::LessEqual,
                    roof_area.value(),
                );
            }
        }

        Ok(())
    }
}

/// Total capacity of the roof-mounted converters at a hub, if there are any
fn roof_capacity_expr(ctx: &FormulationContext, hub: &Hub) -> Option<LinearExpr> {
    let mut expr = LinearExpr::new();
    let mut mounted = false;
    for (id, vars) in &ctx.variables.converters {
        let converter = &ctx.model.converters[id];
        if converter.uses_roof && converter.hub == hub.id {
            expr.add_scaled(&vars.investment.capacity_expr(), 1.0);
            mounted = true;
        }
    }

    mounted.then_some(expr)
}
