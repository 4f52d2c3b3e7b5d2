//! Derives the index families used to dimension variables and constraints.
//!
//! This is also where the model data is checked for consistency: any problem which would make
//! the formulation meaningless is reported as a [`ConfigurationError`] before anything is built.
use crate::capacity::CapacitySpec;
use crate::converter::Converter;
use crate::hub::{Hub, HubID};
use crate::model::{ConfigurationError, FlowDirection, Model};
use crate::network::{LinkID, NetworkLink};
use crate::storage::Storage;
use crate::stream::{Stream, StreamID};
use crate::units::Energy;
use indexmap::IndexMap;
use itertools::iproduct;
use log::warn;
use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;
use std::collections::HashSet;
use std::ops::Range;

/// Tolerance used when checking that input shares sum to one
const SHARE_TOLERANCE: f64 = 1e-6;

type CheckResult = Result<(), ConfigurationError>;

/// The index families of a formulation.
///
/// All sequences are in a deterministic order derived from the order of the model data.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSets {
    /// Zero-based time steps
    pub time_steps: Range<usize>,
    /// Every (hub, stream) pair, each of which has a balance at every time step
    pub balances: Vec<(HubID, StreamID)>,
    /// (hub, stream) pairs for which imports are possible
    pub imports: Vec<(HubID, StreamID)>,
    /// (hub, stream) pairs for which exports are possible
    pub exports: Vec<(HubID, StreamID)>,
    /// Links included in the formulation (empty if the network is disabled)
    pub links: Vec<LinkID>,
}

impl IndexSets {
    /// Number of time steps
    pub fn num_time_steps(&self) -> usize {
        self.time_steps.len()
    }
}

/// Validate the model and derive its index sets.
///
/// # Returns
///
/// The index sets or a [`ConfigurationError`] if the model data is inconsistent.
pub fn build_index_sets(model: &Model) -> Result<IndexSets, ConfigurationError> {
    model.parameters.validate()?;
    let num_time_steps = model.time_steps();

    for stream in model.streams.values() {
        check_stream(stream)?;
    }
    for hub in model.hubs.values() {
        check_hub(hub, model, num_time_steps)?;
    }
    for converter in model.converters.values() {
        check_converter(converter, model)?;
    }
    check_storages(model)?;

    let links: Vec<LinkID> = if model.network_enabled() {
        for link in model.links.values() {
            check_link(link, model)?;
        }
        warn_if_disconnected(model);
        model.links.keys().cloned().collect()
    } else {
        Vec::new()
    };

    let balances = iproduct!(model.hubs.keys(), model.streams.keys())
        .map(|(hub, stream)| (hub.clone(), stream.clone()))
        .collect();
    let imports = iproduct!(model.hubs.values(), model.streams.values())
        .filter(|(hub, stream)| {
            stream.is_purchasable() || hub.import_limits.contains_key(&stream.id)
        })
        .map(|(hub, stream)| (hub.id.clone(), stream.id.clone()))
        .collect();
    let exports = iproduct!(model.hubs.values(), model.streams.values())
        .filter(|(_, stream)| stream.is_exportable())
        .map(|(hub, stream)| (hub.id.clone(), stream.id.clone()))
        .collect();

    Ok(IndexSets {
        time_steps: 0..num_time_steps,
        balances,
        imports,
        exports,
        links,
    })
}

/// Check that a value is finite and non-negative
fn check_non_negative(entity: &str, field: &str, value: f64) -> CheckResult {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::new(
            entity,
            field,
            format!("must be a finite, non-negative number (got {value})"),
        ))
    }
}

/// Check that a value lies in `[0, 1]`
fn check_fraction(entity: &str, field: &str, value: f64) -> CheckResult {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::new(
            entity,
            field,
            format!("must be between 0 and 1 (got {value})"),
        ))
    }
}

/// Check that a value lies in `(0, 1]`
fn check_efficiency(entity: &str, field: &str, value: f64) -> CheckResult {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigurationError::new(
            entity,
            field,
            format!("must be greater than 0 and at most 1 (got {value})"),
        ))
    }
}

/// Check that a lifetime is given whenever there is an investment cost to annualise
fn check_lifetime(entity: &str, lifetime: u32, has_investment_cost: bool) -> CheckResult {
    if lifetime == 0 && has_investment_cost {
        Err(ConfigurationError::new(
            entity,
            "lifetime",
            "must be greater than zero",
        ))
    } else {
        Ok(())
    }
}

/// Check that a referenced stream exists
fn check_stream_exists(entity: &str, field: &str, stream: &StreamID, model: &Model) -> CheckResult {
    if model.streams.contains_key(stream) {
        Ok(())
    } else {
        Err(ConfigurationError::new(
            entity,
            field,
            format!("unknown stream {stream}"),
        ))
    }
}

/// Check that a referenced hub exists
fn check_hub_exists(entity: &str, field: &str, hub: &HubID, model: &Model) -> CheckResult {
    if model.hubs.contains_key(hub) {
        Ok(())
    } else {
        Err(ConfigurationError::new(
            entity,
            field,
            format!("unknown hub {hub}"),
        ))
    }
}

/// Check the size of a technology
fn check_capacity(entity: &str, capacity: &CapacitySpec, needs_max: Option<&str>) -> CheckResult {
    match capacity {
        CapacitySpec::Fixed(capacity) => check_non_negative(entity, "capacity", capacity.value()),
        CapacitySpec::Optimised { max: Some(max) } => {
            check_non_negative(entity, "max_capacity", max.value())
        }
        CapacitySpec::Optimised { max: None } => match needs_max {
            Some(reason) => Err(ConfigurationError::new(
                entity,
                "max_capacity",
                format!("must be given when {reason}"),
            )),
            None => Ok(()),
        },
    }
}

fn check_stream(stream: &Stream) -> CheckResult {
    let entity = format!("stream {}", stream.id);
    if let Some(price) = stream.import_price {
        check_non_negative(&entity, "import_price", price.value())?;
    }
    if let Some(price) = stream.export_price {
        check_non_negative(&entity, "export_price", price.value())?;
    }
    check_non_negative(&entity, "carbon_factor", stream.carbon_factor.value())
}

/// Check a time series for a stream at a hub
fn check_series(
    entity: &str,
    field: &str,
    stream: &StreamID,
    series: &[Energy],
    model: &Model,
    num_time_steps: usize,
) -> CheckResult {
    check_stream_exists(entity, field, stream, model)?;
    if series.len() != num_time_steps {
        return Err(ConfigurationError::new(
            entity,
            field,
            format!(
                "series for stream {stream} has {} entries but there are {num_time_steps} time \
                steps",
                series.len()
            ),
        ));
    }
    for value in series {
        check_non_negative(entity, field, value.value())?;
    }

    Ok(())
}

fn check_hub(hub: &Hub, model: &Model, num_time_steps: usize) -> CheckResult {
    let entity = format!("hub {}", hub.id);
    for (stream, series) in &hub.demands {
        check_series(&entity, "demand", stream, series, model, num_time_steps)?;
    }
    for (stream, series) in &hub.import_limits {
        check_series(&entity, "import_limit", stream, series, model, num_time_steps)?;
    }
    for (stream, series) in &hub.yields {
        check_series(&entity, "yield", stream, series, model, num_time_steps)?;
    }
    if let Some(roof_area) = hub.roof_area {
        check_non_negative(&entity, "roof_area", roof_area.value())?;
    }

    Ok(())
}

fn check_converter(converter: &Converter, model: &Model) -> CheckResult {
    let entity = format!("converter {}", converter.id);
    check_hub_exists(&entity, "hub", &converter.hub, model)?;

    if converter.inputs.is_empty() {
        return Err(ConfigurationError::new(
            &entity,
            "inputs",
            "must have at least one input",
        ));
    }
    if converter.outputs.is_empty() {
        return Err(ConfigurationError::new(
            &entity,
            "outputs",
            "must have at least one output",
        ));
    }
    for (stream, share) in &converter.inputs {
        check_stream_exists(&entity, "inputs", stream, model)?;
        check_efficiency(&entity, "inputs", share.value())?;
        if converter.outputs.contains_key(stream) {
            return Err(ConfigurationError::new(
                &entity,
                "outputs",
                format!("stream {stream} is both an input and an output"),
            ));
        }
    }
    let total_share: f64 = converter.inputs.values().map(|share| share.value()).sum();
    if (total_share - 1.0).abs() > SHARE_TOLERANCE {
        return Err(ConfigurationError::new(
            &entity,
            "inputs",
            format!("input shares must sum to one (got {total_share})"),
        ));
    }
    for (stream, efficiency) in &converter.outputs {
        check_stream_exists(&entity, "outputs", stream, model)?;
        if !(efficiency.is_finite() && efficiency.value() > 0.0) {
            return Err(ConfigurationError::new(
                &entity,
                "outputs",
                format!("efficiency for stream {stream} must be a finite, positive number"),
            ));
        }
    }

    check_fraction(&entity, "min_part_load", converter.min_part_load.value())?;
    check_non_negative(&entity, "capital_cost", converter.capital_cost.value())?;
    check_non_negative(
        &entity,
        "fixed_capital_cost",
        converter.fixed_capital_cost.value(),
    )?;
    check_non_negative(&entity, "maintenance_cost", converter.maintenance_cost.value())?;
    check_non_negative(
        &entity,
        "usage_maintenance_cost",
        converter.usage_maintenance_cost.value(),
    )?;
    check_lifetime(
        &entity,
        converter.lifetime,
        converter.capital_cost.value() > 0.0 || converter.fixed_capital_cost.value() > 0.0,
    )?;

    if let Some(stream) = &converter.source_yield {
        check_source_yield(&entity, converter, stream, model)?;
    }

    let needs_max = if converter.has_part_load() {
        Some("min_part_load is set")
    } else if converter.requires_installation {
        Some("requires_installation is set")
    } else {
        None
    };
    check_capacity(&entity, &converter.capacity, needs_max)?;

    if converter.fixed_capital_cost.value() > 0.0 && !converter.requires_installation {
        return Err(ConfigurationError::new(
            &entity,
            "fixed_capital_cost",
            "requires requires_installation to be set",
        ));
    }

    Ok(())
}

/// Check that a converter's capacity-linked input has a yield series at its hub
fn check_source_yield(
    entity: &str,
    converter: &Converter,
    stream: &StreamID,
    model: &Model,
) -> CheckResult {
    if !converter.inputs.contains_key(stream) {
        return Err(ConfigurationError::new(
            entity,
            "source_yield",
            format!("stream {stream} is not an input"),
        ));
    }
    if !model.hubs[&converter.hub].yields.contains_key(stream) {
        return Err(ConfigurationError::new(
            entity,
            "source_yield",
            format!("hub {} has no yield series for stream {stream}", converter.hub),
        ));
    }

    Ok(())
}

fn check_storage(storage: &Storage, model: &Model) -> CheckResult {
    let entity = format!("storage {}", storage.id);
    check_hub_exists(&entity, "hub", &storage.hub, model)?;
    check_stream_exists(&entity, "stream", &storage.stream, model)?;
    check_fraction(&entity, "standing_loss", storage.standing_loss.value())?;
    check_non_negative(&entity, "max_charge_rate", storage.max_charge_rate.value())?;
    check_non_negative(
        &entity,
        "max_discharge_rate",
        storage.max_discharge_rate.value(),
    )?;
    check_efficiency(
        &entity,
        "charge_efficiency",
        storage.charge_efficiency.value(),
    )?;
    check_efficiency(
        &entity,
        "discharge_efficiency",
        storage.discharge_efficiency.value(),
    )?;
    check_fraction(
        &entity,
        "min_state_of_charge",
        storage.min_state_of_charge.value(),
    )?;
    check_non_negative(&entity, "capital_cost", storage.capital_cost.value())?;
    check_lifetime(&entity, storage.lifetime, storage.capital_cost.value() > 0.0)?;
    let needs_max = storage
        .requires_installation
        .then_some("requires_installation is set");
    check_capacity(&entity, &storage.capacity, needs_max)
}

/// Check storages, including that there is at most one per (hub, stream)
fn check_storages(model: &Model) -> CheckResult {
    let mut seen = HashSet::new();
    for storage in model.storages.values() {
        check_storage(storage, model)?;
        if !seen.insert((&storage.hub, &storage.stream)) {
            return Err(ConfigurationError::new(
                format!("storage {}", storage.id),
                "stream",
                format!(
                    "hub {} already has a storage for stream {}",
                    storage.hub, storage.stream
                ),
            ));
        }
    }

    Ok(())
}

fn check_link(link: &NetworkLink, model: &Model) -> CheckResult {
    let entity = format!("link {}", link.id);
    check_hub_exists(&entity, "from_hub", &link.from, model)?;
    check_hub_exists(&entity, "to_hub", &link.to, model)?;
    if link.from == link.to {
        return Err(ConfigurationError::new(
            &entity,
            "to_hub",
            "a link must connect two different hubs",
        ));
    }
    if link.streams.is_empty() {
        return Err(ConfigurationError::new(
            &entity,
            "streams",
            "must carry at least one stream",
        ));
    }
    for stream in &link.streams {
        check_stream_exists(&entity, "streams", stream, model)?;
    }
    check_non_negative(&entity, "length", link.length.value())?;
    check_non_negative(&entity, "capacity", link.capacity.value())?;
    check_non_negative(&entity, "cost_per_length", link.cost_per_length.value())?;
    check_lifetime(&entity, link.lifetime, link.cost_per_length.value() > 0.0)?;
    check_non_negative(&entity, "loss_per_length", link.loss_per_length.value())?;
    check_fraction(&entity, "loss_per_length", link.loss_fraction().value())?;
    if model.parameters.flow_direction == FlowDirection::Signed && link.loss_fraction().value() > 0.0
    {
        return Err(ConfigurationError::new(
            &entity,
            "loss_per_length",
            "losses are not supported with signed flows",
        ));
    }

    Ok(())
}

/// Warn if the network splits the hubs into more than one group
fn warn_if_disconnected(model: &Model) {
    let mut graph = UnGraph::<&HubID, &LinkID>::new_undirected();
    let nodes: IndexMap<&HubID, _> = model
        .hubs
        .keys()
        .map(|id| (id, graph.add_node(id)))
        .collect();
    for link in model.links.values() {
        graph.add_edge(nodes[&link.from], nodes[&link.to], &link.id);
    }

    let components = connected_components(&graph);
    if components > 1 {
        warn!("The network links divide the hubs into {components} disconnected groups");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_configuration_error, boiler_model, network_model};
    use crate::units::{
        Capacity, Dimensionless, Hours, Length, Money, MoneyPerCapacity, MoneyPerLength, PerLength,
    };
    use rstest::rstest;

    fn pair(hub: &str, stream: &str) -> (HubID, StreamID) {
        (hub.into(), stream.into())
    }

    #[rstest]
    fn test_build_index_sets(boiler_model: Model) {
        let sets = build_index_sets(&boiler_model).unwrap();
        assert_eq!(sets.num_time_steps(), 3);
        assert_eq!(sets.balances, [pair("hub1", "gas"), pair("hub1", "heat")]);
        assert_eq!(sets.imports, [pair("hub1", "gas")]);
        assert!(sets.exports.is_empty());
        assert!(sets.links.is_empty());
    }

    #[rstest]
    fn test_build_index_sets_network(network_model: Model) {
        let sets = build_index_sets(&network_model).unwrap();
        assert_eq!(sets.links, [LinkID::new("pipe")]);
        assert_eq!(sets.balances.len(), 4);
    }

    #[rstest]
    fn test_network_disabled(mut network_model: Model) {
        network_model.parameters.network_enabled = false;
        let sets = build_index_sets(&network_model).unwrap();
        assert!(sets.links.is_empty());
    }

    #[rstest]
    fn test_build_is_deterministic(network_model: Model) {
        assert_eq!(
            build_index_sets(&network_model).unwrap(),
            build_index_sets(&network_model).unwrap()
        );
    }

    #[rstest]
    fn test_unknown_hub(mut boiler_model: Model) {
        boiler_model.converters[0].hub = "nowhere".into();
        assert_configuration_error!(
            build_index_sets(&boiler_model),
            "converter boiler",
            "hub"
        );
    }

    #[rstest]
    fn test_wrong_series_length(mut boiler_model: Model) {
        boiler_model.hubs[0]
            .demands
            .insert("heat".into(), vec![Energy(1.0)]);
        assert_configuration_error!(build_index_sets(&boiler_model), "hub hub1", "demand");
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_invalid_demand_value(mut boiler_model: Model, #[case] value: f64) {
        boiler_model.hubs[0]
            .demands
            .insert("heat".into(), vec![Energy(value); 3]);
        assert_configuration_error!(build_index_sets(&boiler_model), "hub hub1", "demand");
    }

    #[rstest]
    fn test_unknown_stream(mut boiler_model: Model) {
        boiler_model.converters[0]
            .outputs
            .insert("steam".into(), Dimensionless(0.1));
        assert_configuration_error!(
            build_index_sets(&boiler_model),
            "converter boiler",
            "outputs"
        );
    }

    #[rstest]
    fn test_input_shares_must_sum_to_one(mut boiler_model: Model) {
        boiler_model.converters[0].inputs[0] = Dimensionless(0.5);
        assert_configuration_error!(
            build_index_sets(&boiler_model),
            "converter boiler",
            "inputs"
        );
    }

    #[rstest]
    fn test_part_load_needs_max_capacity(mut boiler_model: Model) {
        let converter = &mut boiler_model.converters[0];
        converter.capacity = CapacitySpec::Optimised { max: None };
        converter.min_part_load = Dimensionless(0.3);
        assert_configuration_error!(
            build_index_sets(&boiler_model),
            "converter boiler",
            "max_capacity"
        );

        boiler_model.converters[0].capacity = CapacitySpec::Optimised {
            max: Some(Capacity(100.0)),
        };
        assert!(build_index_sets(&boiler_model).is_ok());
    }

    #[rstest]
    fn test_fixed_capital_cost_needs_installation(mut boiler_model: Model) {
        boiler_model.converters[0].fixed_capital_cost = Money(100.0);
        assert_configuration_error!(
            build_index_sets(&boiler_model),
            "converter boiler",
            "fixed_capital_cost"
        );
    }

    #[rstest]
    fn test_zero_capacity_is_valid(mut boiler_model: Model) {
        boiler_model.converters[0].capacity = CapacitySpec::Fixed(Capacity(0.0));
        assert!(build_index_sets(&boiler_model).is_ok());
    }

    #[rstest]
    fn test_duplicate_storage(mut network_model: Model) {
        let mut duplicate = network_model.storages[0].clone();
        duplicate.id = "tank2".into();
        network_model
            .storages
            .insert(duplicate.id.clone(), duplicate);
        assert_configuration_error!(
            build_index_sets(&network_model),
            "storage tank2",
            "stream"
        );
    }

    #[rstest]
    fn test_storage_efficiency(mut network_model: Model) {
        network_model.storages[0].charge_efficiency = Dimensionless(0.0);
        assert_configuration_error!(
            build_index_sets(&network_model),
            "storage tank",
            "charge_efficiency"
        );
    }

    #[rstest]
    fn test_signed_flow_with_losses(mut network_model: Model) {
        network_model.parameters.flow_direction = FlowDirection::Signed;
        network_model.links[0].loss_per_length = PerLength(0.01);
        network_model.links[0].length = Length(10.0);
        assert_configuration_error!(
            build_index_sets(&network_model),
            "link pipe",
            "loss_per_length"
        );
    }

    #[rstest]
    fn test_link_to_same_hub(mut network_model: Model) {
        network_model.links[0].to = network_model.links[0].from.clone();
        assert_configuration_error!(build_index_sets(&network_model), "link pipe", "to_hub");
    }

    #[rstest]
    fn test_invalid_link_ignored_when_network_disabled(mut network_model: Model) {
        network_model.links[0].to = "nowhere".into();
        network_model.parameters.network_enabled = false;
        assert!(build_index_sets(&network_model).is_ok());
    }

    #[rstest]
    fn test_zero_lifetime_with_capital_cost(mut boiler_model: Model) {
        boiler_model.converters[0].lifetime = 0;
        assert!(build_index_sets(&boiler_model).is_ok());

        boiler_model.converters[0].capital_cost = MoneyPerCapacity(1000.0);
        assert_configuration_error!(
            build_index_sets(&boiler_model),
            "converter boiler",
            "lifetime"
        );
    }

    #[rstest]
    fn test_zero_lifetime_with_fixed_capital_cost(mut boiler_model: Model) {
        let converter = &mut boiler_model.converters[0];
        converter.lifetime = 0;
        converter.fixed_capital_cost = Money(500.0);
        converter.requires_installation = true;
        converter.capacity = CapacitySpec::Optimised {
            max: Some(Capacity(100.0)),
        };
        assert_configuration_error!(
            build_index_sets(&boiler_model),
            "converter boiler",
            "lifetime"
        );
    }

    #[rstest]
    fn test_zero_lifetime_storage_and_link(mut network_model: Model) {
        network_model.storages[0].lifetime = 0;
        network_model.links[0].lifetime = 0;
        assert!(build_index_sets(&network_model).is_ok());

        network_model.links[0].cost_per_length = MoneyPerLength(400.0);
        assert_configuration_error!(build_index_sets(&network_model), "link pipe", "lifetime");

        network_model.storages[0].capital_cost = MoneyPerCapacity(50.0);
        assert_configuration_error!(
            build_index_sets(&network_model),
            "storage tank",
            "lifetime"
        );
    }

    #[rstest]
    #[case(-1.0)]
    #[case(0.0)]
    #[case(f64::NAN)]
    fn test_invalid_time_step_duration(mut network_model: Model, #[case] duration: f64) {
        network_model.parameters.time_step_duration = Hours(duration);
        assert_configuration_error!(
            build_index_sets(&network_model),
            "model",
            "time_step_duration"
        );
    }

    #[rstest]
    fn test_invalid_model_parameters(mut boiler_model: Model) {
        boiler_model.parameters.interest_rate = Dimensionless(-0.01);
        assert_configuration_error!(build_index_sets(&boiler_model), "model", "interest_rate");

        boiler_model.parameters.interest_rate = Dimensionless(0.05);
        boiler_model.parameters.time_steps = 0;
        assert_configuration_error!(build_index_sets(&boiler_model), "model", "time_steps");
    }

    #[rstest]
    fn test_source_yield_must_be_an_input(mut boiler_model: Model) {
        boiler_model.hubs[0]
            .yields
            .insert("gas".into(), vec![Energy(1.0); 3]);
        boiler_model.converters[0].source_yield = Some("heat".into());
        assert_configuration_error!(
            build_index_sets(&boiler_model),
            "converter boiler",
            "source_yield"
        );

        boiler_model.converters[0].source_yield = Some("gas".into());
        assert!(build_index_sets(&boiler_model).is_ok());
    }

    #[rstest]
    fn test_source_yield_needs_series(mut boiler_model: Model) {
        boiler_model.converters[0].source_yield = Some("gas".into());
        assert_configuration_error!(
            build_index_sets(&boiler_model),
            "converter boiler",
            "source_yield"
        );
    }

    #[rstest]
    fn test_invalid_roof_area(mut boiler_model: Model) {
        boiler_model.hubs[0].roof_area = Some(Capacity(-1.0));
        assert_configuration_error!(build_index_sets(&boiler_model), "hub hub1", "roof_area");
    }
}
