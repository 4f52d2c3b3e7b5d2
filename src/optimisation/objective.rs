//! Cost and carbon accounting, and the choice of objective.
use super::FormulationContext;
use super::problem::LinearExpr;
use crate::finance::capital_recovery_factor;
use crate::model::ObjectiveTarget;
use crate::units::Dimensionless;

/// The cost and carbon terms of a formulated problem, as linear expressions.
///
/// These are built whatever the objective, so that every term can be reported after solving.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CostTerms {
    /// Annualised capital cost of converters, storages and links
    pub investment: LinearExpr,
    /// Cost of imported streams
    pub operating: LinearExpr,
    /// Capacity-based and usage-based maintenance
    pub maintenance: LinearExpr,
    /// Income from exported streams
    pub export_income: LinearExpr,
    /// Carbon emitted by imported streams
    pub carbon: LinearExpr,
}

impl CostTerms {
    /// Build the cost and carbon expressions for a formulation
    pub fn build(ctx: &FormulationContext) -> Self {
        Self {
            investment: investment_expr(ctx),
            operating: operating_expr(ctx),
            maintenance: maintenance_expr(ctx),
            export_income: export_income_expr(ctx),
            carbon: carbon_expr(ctx),
        }
    }

    /// Investment + operating + maintenance − export income
    pub fn total_cost(&self) -> LinearExpr {
        LinearExpr::new()
            .with_scaled(&self.investment, 1.0)
            .with_scaled(&self.operating, 1.0)
            .with_scaled(&self.maintenance, 1.0)
            .with_scaled(&self.export_income, -1.0)
    }

    /// The expression to minimise for the given target
    pub fn objective(&self, target: ObjectiveTarget) -> LinearExpr {
        match target {
            ObjectiveTarget::Cost => self.total_cost(),
            ObjectiveTarget::Carbon => self.carbon.clone(),
        }
    }
}

fn annuity(ctx: &FormulationContext, lifetime: u32) -> f64 {
    capital_recovery_factor(lifetime, ctx.config.interest_rate).value()
}

fn investment_expr(ctx: &FormulationContext) -> LinearExpr {
    let mut expr = LinearExpr::new();
    let model = ctx.model;

    for (id, vars) in &ctx.variables.converters {
        let converter = &model.converters[id];
        let crf = annuity(ctx, converter.lifetime);
        expr.add_scaled(
            &vars.investment.capacity_expr(),
            crf * converter.capital_cost.value(),
        );
        if let Some(installed) = vars.investment.installed() {
            expr.add_term(installed, crf * converter.fixed_capital_cost.value());
        }
    }

    for (id, vars) in &ctx.variables.storages {
        let storage = &model.storages[id];
        let crf = annuity(ctx, storage.lifetime);
        expr.add_scaled(
            &vars.investment.capacity_expr(),
            crf * storage.capital_cost.value(),
        );
    }

    for (id, vars) in &ctx.variables.links {
        let link = &model.links[id];
        let cost = link.cost_per_length * link.length;
        expr.add_scaled(
            &vars.investment.installed_expr(),
            annuity(ctx, link.lifetime) * cost.value(),
        );
    }

    expr
}

fn operating_expr(ctx: &FormulationContext) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for ((_, stream_id), imports) in &ctx.variables.imports {
        let Some(price) = ctx.model.streams[stream_id].import_price else {
            continue;
        };
        for &import in imports {
            expr.add_term(import, price.value());
        }
    }

    expr
}

fn maintenance_expr(ctx: &FormulationContext) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for (id, vars) in &ctx.variables.converters {
        let converter = &ctx.model.converters[id];
        expr.add_scaled(
            &vars.investment.capacity_expr(),
            converter.maintenance_cost.value(),
        );

        let primary_efficiency = converter
            .primary_output()
            .map_or(Dimensionless(0.0), |(_, eff)| eff);
        let usage_cost = converter.usage_maintenance_cost.value() * primary_efficiency.value();
        if usage_cost != 0.0 {
            for &dispatch in &vars.dispatch {
                expr.add_term(dispatch, usage_cost);
            }
        }
    }

    expr
}

fn export_income_expr(ctx: &FormulationContext) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for ((_, stream_id), exports) in &ctx.variables.exports {
        let Some(tariff) = ctx.model.streams[stream_id].export_price else {
            continue;
        };
        for &export in exports {
            expr.add_term(export, tariff.value());
        }
    }

    expr
}

/// Total carbon emitted by imports over the horizon
pub fn carbon_expr(ctx: &FormulationContext) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for ((_, stream_id), imports) in &ctx.variables.imports {
        let factor = ctx.model.streams[stream_id].carbon_factor.value();
        if factor == 0.0 {
            continue;
        }
        for &import in imports {
            expr.add_term(import, factor);
        }
    }

    expr
}

#[cfg(test)]
mod tests {
    use crate::capacity::CapacitySpec;
    use crate::fixture::{boiler_model, network_model};
    use crate::model::{Model, NetworkTopology, ObjectiveTarget};
    use crate::optimisation::formulate;
    use crate::optimisation::investment::CapacityTerm;
    use crate::units::{
        Capacity, CarbonPerEnergy, Dimensionless, Length, MoneyPerCapacity, MoneyPerEnergy,
        MoneyPerLength,
    };
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_operating_cost_terms(boiler_model: Model) {
        let formulated = formulate(&boiler_model).unwrap();
        let imports = &formulated.variables.imports[0];
        let objective = &formulated.problem.objective().expr;

        for &import in imports {
            assert_eq!(formulated.costs.operating.coefficient(import), 1.0);
            assert_eq!(objective.coefficient(import), 1.0);
        }
        assert!(formulated.costs.export_income.is_constant());
        assert!(formulated.costs.carbon.is_constant());
    }

    #[rstest]
    fn test_investment_is_annualised(mut boiler_model: Model) {
        boiler_model.parameters.interest_rate = Dimensionless(0.05);
        let boiler = &mut boiler_model.converters[0];
        boiler.capital_cost = MoneyPerCapacity(1000.0);
        boiler.maintenance_cost = MoneyPerCapacity(10.0);
        boiler.usage_maintenance_cost = MoneyPerEnergy(2.0);
        boiler.lifetime = 10;
        let formulated = formulate(&boiler_model).unwrap();
        let vars = &formulated.variables.converters[0];
        let CapacityTerm::Variable(capacity) = vars.investment.capacity() else {
            panic!("Capacity should be optimised");
        };

        assert_approx_eq!(
            f64,
            formulated.costs.investment.coefficient(capacity),
            129.504_574_965_456_7,
            epsilon = 1e-9
        );
        assert_eq!(formulated.costs.maintenance.coefficient(capacity), 10.0);
        assert_approx_eq!(
            f64,
            formulated.costs.maintenance.coefficient(vars.dispatch[0]),
            1.8,
            epsilon = 1e-12
        );
    }

    #[rstest]
    fn test_link_cost(mut network_model: Model) {
        let link = &mut network_model.links[0];
        link.length = Length(2.0);
        link.cost_per_length = MoneyPerLength(10.0);
        link.lifetime = 10;

        // Built links contribute a constant
        let fixed = formulate(&network_model).unwrap();
        assert_approx_eq!(
            f64,
            fixed.costs.investment.constant_value(),
            2.0,
            epsilon = 1e-12
        );

        network_model.parameters.topology = NetworkTopology::Optimised;
        let optimised = formulate(&network_model).unwrap();
        let installed = optimised.variables.links[0].investment.installed().unwrap();
        assert_approx_eq!(
            f64,
            optimised.costs.investment.coefficient(installed),
            2.0,
            epsilon = 1e-12
        );
        assert_eq!(optimised.costs.investment.constant_value(), 0.0);
    }

    #[rstest]
    fn test_carbon_objective(mut boiler_model: Model) {
        boiler_model.streams[0].carbon_factor = CarbonPerEnergy(0.2);
        boiler_model.converters[0].capacity = CapacitySpec::Fixed(Capacity(20.0));
        boiler_model.parameters.objective = ObjectiveTarget::Carbon;
        let formulated = formulate(&boiler_model).unwrap();

        assert_eq!(formulated.problem.objective().expr, formulated.costs.carbon);
        let import = formulated.variables.imports[0][0];
        assert_eq!(formulated.costs.carbon.coefficient(import), 0.2);
        // Cost terms are still built
        assert_eq!(formulated.costs.operating.coefficient(import), 1.0);
    }
}
