//! Limit on total carbon emissions.
use super::ConstraintGenerator;
use crate::optimisation::FormulationContext;
use crate::optimisation::objective::carbon_expr;
use crate::optimisation::problem::{ConstraintFamily, ProblemBuilder, Relation};
use crate::units::Carbon;
use anyhow::Result;

/// Caps the carbon emitted over the horizon
pub struct CarbonLimit {
    max_carbon: Carbon,
}

impl CarbonLimit {
    /// Create a generator for the given cap
    pub fn new(max_carbon: Carbon) -> Self {
        Self { max_carbon }
    }
}

impl ConstraintGenerator for CarbonLimit {
    fn name(&self) -> &'static str {
        "carbon limit"
    }

    fn generate(&self, ctx: &FormulationContext, builder: &mut ProblemBuilder) -> Result<()> {
        builder.add_constraint(
            ConstraintFamily::CarbonLimit,
            "total".into(),
            carbon_expr(ctx),
            Relation::LessEqual,
            self.max_carbon.value(),
        );

        Ok(())
    }
}
