//! Capacity and part-load constraints for converters.
use super::ConstraintGenerator;
use crate::converter::Converter;
use crate::optimisation::investment::CapacityTerm;
use crate::optimisation::problem::{ConstraintFamily, LinearExpr, ProblemBuilder, Relation};
use crate::optimisation::variables::Variable;
use crate::optimisation::{ConverterVariables, FormulationContext};
use anyhow::{Context, Result};

/// Limits converter output by capacity and enforces minimum part load.
///
/// Capacity is rated against the primary output, so for efficiency `e`, dispatch `x` and time
/// step duration `d`:
///
/// ```text
///   e x[t] − d Capacity <= 0
/// ```
///
/// With a minimum part load `p` and on/off binary `Y[t]`, output is either zero or between
/// `p d Capacity` and `d Capacity`. When capacity is a variable bounded by `M`, the product of
/// capacity and `Y[t]` is linearised:
///
/// ```text
///   e x[t] − d M Y[t] <= 0
///   e x[t] − p d Capacity − p d M Y[t] >= −p d M
/// ```
pub struct ConverterLimits;

impl ConstraintGenerator for ConverterLimits {
    fn name(&self) -> &'static str {
        "converter limits"
    }

    fn generate(&self, ctx: &FormulationContext, builder: &mut ProblemBuilder) -> Result<()> {
        let duration = ctx.config.duration;
        for (id, vars) in &ctx.variables.converters {
            let converter = &ctx.model.converters[id];
            let (_, efficiency) = converter
                .primary_output()
                .with_context(|| format!("Converter {id} has no outputs"))?;
            let efficiency = efficiency.value();

            let capacity = vars.investment.capacity_expr();
            for (time_step, &dispatch) in vars.dispatch.iter().enumerate() {
                let expr = LinearExpr::term(dispatch, efficiency).with_scaled(&capacity, -duration);
                builder.add_constraint(
                    ConstraintFamily::ConverterCapacity,
                    format!("{id},{}", time_step + 1),
                    expr,
                    Relation::LessEqual,
                    0.0,
                );
            }

            if let Some(on) = &vars.on {
                add_part_load_constraints(converter, vars, on, efficiency, duration, builder)?;
            }
        }

        Ok(())
    }
}

/// Add the on/off constraints for a converter with a minimum part load
fn add_part_load_constraints(
    converter: &Converter,
    vars: &ConverterVariables,
    on: &[Variable],
    efficiency: f64,
    duration: f64,
    builder: &mut ProblemBuilder,
) -> Result<()> {
    let id = &converter.id;
    let part_load = converter.min_part_load.value();
    let max = vars
        .investment
        .max_capacity()
        .with_context(|| format!("Converter {id} has a part load but no maximum capacity"))?;

    for (time_step, (&dispatch, &on)) in vars.dispatch.iter().zip(on).enumerate() {
        let label = format!("{id},{}", time_step + 1);
        let output = LinearExpr::term(dispatch, efficiency);

        builder.add_constraint(
            ConstraintFamily::PartLoad,
            label.clone(),
            output.clone().with_term(on, -duration * max),
            Relation::LessEqual,
            0.0,
        );

        match vars.investment.capacity() {
            CapacityTerm::Fixed(capacity) => builder.add_constraint(
                ConstraintFamily::PartLoad,
                label,
                output.with_term(on, -part_load * duration * capacity),
                Relation::GreaterEqual,
                0.0,
            ),
            CapacityTerm::Variable(capacity) => builder.add_constraint(
                ConstraintFamily::PartLoad,
                label,
                output
                    .with_term(capacity, -part_load * duration)
                    .with_term(on, -part_load * duration * max),
                Relation::GreaterEqual,
                -part_load * duration * max,
            ),
        }
    }

    Ok(())
}
