//! Network flow conventions and topologies.
//!
//! How link flows are represented is decided by two independent strategies, chosen once from the
//! model parameters:
//!
//! * a [`FlowConvention`], which sets the domain of flow variables and how much of a flow arrives;
//! * a [`Topology`], which decides whether links are always built or have an installation binary.
use super::ConstraintGenerator;
use crate::model::{FlowDirection, ModelParameters, NetworkTopology};
use crate::network::{LinkID, NetworkLink};
use crate::optimisation::FormulationContext;
use crate::optimisation::problem::{ConstraintFamily, LinearExpr, ProblemBuilder, Relation};
use crate::optimisation::variables::{Domain, VariableKey};
use anyhow::{Context, Result};
use std::fmt;

/// The sign convention for flows on network links
pub trait FlowConvention: fmt::Debug {
    /// The domain of flow variables
    fn domain(&self) -> Domain;

    /// Bounds on a flow variable, given the largest flow in either direction
    fn flow_bounds(&self, limit: f64) -> (f64, f64);

    /// Fraction of the flow leaving `from` which arrives at `to`
    fn delivered_fraction(&self, link: &NetworkLink) -> f64;

    /// Whether flow can run from `to` to `from`
    fn allows_reverse_flow(&self) -> bool;
}

/// One free variable per link and stream, positive from `from` to `to`. Links are lossless.
#[derive(Debug)]
pub struct SignedFlow;

impl FlowConvention for SignedFlow {
    fn domain(&self) -> Domain {
        Domain::Free
    }

    fn flow_bounds(&self, limit: f64) -> (f64, f64) {
        (-limit, limit)
    }

    fn delivered_fraction(&self, _link: &NetworkLink) -> f64 {
        1.0
    }

    fn allows_reverse_flow(&self) -> bool {
        true
    }
}

/// Non-negative flow from `from` to `to`, with losses proportional to length
#[derive(Debug)]
pub struct DirectedFlow;

impl FlowConvention for DirectedFlow {
    fn domain(&self) -> Domain {
        Domain::NonNegative
    }

    fn flow_bounds(&self, limit: f64) -> (f64, f64) {
        (0.0, limit)
    }

    fn delivered_fraction(&self, link: &NetworkLink) -> f64 {
        1.0 - link.loss_fraction().value()
    }

    fn allows_reverse_flow(&self) -> bool {
        false
    }
}

/// Whether links are given or chosen by the optimisation
pub trait Topology: fmt::Debug {
    /// Key for the installation binary of a link, if there is one
    fn installation_key(&self, link: &LinkID) -> Option<VariableKey>;

    /// The bound placed directly on flow variables, given the largest flow on a built link
    fn flow_limit(&self, max_flow: f64) -> f64;
}

/// Every link is built
#[derive(Debug)]
pub struct FixedTopology;

impl Topology for FixedTopology {
    fn installation_key(&self, _link: &LinkID) -> Option<VariableKey> {
        None
    }

    fn flow_limit(&self, max_flow: f64) -> f64 {
        max_flow
    }
}

/// Each link has an installation binary and carries flow only if built.
///
/// Flows are left unbounded on the variable itself and limited by constraints:
///
/// ```text
///   flow − d Capacity Y <= 0
///   flow + d Capacity Y >= 0   (signed flows only)
/// ```
#[derive(Debug)]
pub struct OptimisedTopology;

impl Topology for OptimisedTopology {
    fn installation_key(&self, link: &LinkID) -> Option<VariableKey> {
        Some(VariableKey::LinkInstalled(link.clone()))
    }

    fn flow_limit(&self, _max_flow: f64) -> f64 {
        f64::INFINITY
    }
}

impl ConstraintGenerator for OptimisedTopology {
    fn name(&self) -> &'static str {
        "network topology"
    }

    fn generate(&self, ctx: &FormulationContext, builder: &mut ProblemBuilder) -> Result<()> {
        let duration = ctx.config.duration;
        let reverse = ctx.config.convention.allows_reverse_flow();
        for (link_id, vars) in &ctx.variables.links {
            let link = &ctx.model.links[link_id];
            let installed = vars
                .investment
                .installed()
                .with_context(|| format!("Link {link_id} has no installation variable"))?;
            let max_flow = duration * link.capacity.value();

            for (stream_id, flows) in &vars.flows {
                for (time_step, &flow) in flows.iter().enumerate() {
                    let label = format!("{link_id},{stream_id},{}", time_step + 1);
                    let gated = LinearExpr::term(installed, max_flow);
                    builder.add_constraint(
                        ConstraintFamily::NetworkFlow,
                        label.clone(),
                        LinearExpr::term(flow, 1.0).with_scaled(&gated, -1.0),
                        Relation::LessEqual,
                        0.0,
                    );
                    if reverse {
                        builder.add_constraint(
                            ConstraintFamily::NetworkFlow,
                            label,
                            LinearExpr::term(flow, 1.0).with_scaled(&gated, 1.0),
                            Relation::GreaterEqual,
                            0.0,
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

/// Choose the flow convention and topology for the given parameters
pub fn select_network_strategies(
    parameters: &ModelParameters,
) -> (Box<dyn FlowConvention>, Box<dyn Topology>) {
    let convention: Box<dyn FlowConvention> = match parameters.flow_direction {
        FlowDirection::Signed => Box::new(SignedFlow),
        FlowDirection::Directed => Box::new(DirectedFlow),
    };
    let topology: Box<dyn Topology> = match parameters.topology {
        NetworkTopology::Fixed => Box::new(FixedTopology),
        NetworkTopology::Optimised => Box::new(OptimisedTopology),
    };

    (convention, topology)
}
