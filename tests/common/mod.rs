//! Helpers for building small models in integration tests.
#![allow(dead_code)]
use ehub::capacity::CapacitySpec;
use ehub::converter::Converter;
use ehub::hub::Hub;
use ehub::model::{Model, ModelParameters, StorageInitialState};
use ehub::network::NetworkLink;
use ehub::storage::Storage;
use ehub::stream::{Stream, StreamMap};
use ehub::units::{
    Capacity, CarbonPerEnergy, Dimensionless, Energy, Length, Money, MoneyPerCapacity,
    MoneyPerEnergy, MoneyPerLength, PerLength,
};
use indexmap::IndexMap;
use std::path::PathBuf;

/// Get the path to the demo model
pub fn demo_model_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("two_hubs")
}

/// A stream with an import price and carbon factor
pub fn purchasable(id: &str, price: f64, carbon_factor: f64) -> Stream {
    Stream {
        import_price: Some(MoneyPerEnergy(price)),
        carbon_factor: CarbonPerEnergy(carbon_factor),
        ..Stream::new(id)
    }
}

pub fn streams(streams: impl IntoIterator<Item = Stream>) -> StreamMap {
    streams.into_iter().map(|s| (s.id.clone(), s)).collect()
}

pub fn hub(id: &str, demands: &[(&str, &[f64])]) -> Hub {
    let mut hub = Hub::new(id);
    for (stream, series) in demands {
        hub.demands.insert(
            (*stream).into(),
            series.iter().copied().map(Energy).collect(),
        );
    }
    hub
}

/// A converter with a single input and output
pub fn converter(
    id: &str,
    hub: &str,
    input: &str,
    output: &str,
    efficiency: f64,
    capacity: CapacitySpec,
) -> Converter {
    Converter {
        id: id.into(),
        hub: hub.into(),
        inputs: [(input.into(), Dimensionless(1.0))].into_iter().collect(),
        outputs: [(output.into(), Dimensionless(efficiency))]
            .into_iter()
            .collect(),
        capacity,
        min_part_load: Dimensionless(0.0),
        capital_cost: MoneyPerCapacity(0.0),
        fixed_capital_cost: Money(0.0),
        maintenance_cost: MoneyPerCapacity(0.0),
        usage_maintenance_cost: MoneyPerEnergy(0.0),
        lifetime: 20,
        requires_installation: false,
        source_yield: None,
        uses_roof: false,
    }
}

/// An ideal storage with the given capacity, which can fill or empty in one time step
pub fn ideal_storage(id: &str, hub: &str, stream: &str, capacity: f64) -> Storage {
    Storage {
        id: id.into(),
        hub: hub.into(),
        stream: stream.into(),
        capacity: CapacitySpec::Fixed(Capacity(capacity)),
        standing_loss: Dimensionless(0.0),
        max_charge_rate: Dimensionless(1.0),
        max_discharge_rate: Dimensionless(1.0),
        charge_efficiency: Dimensionless(1.0),
        discharge_efficiency: Dimensionless(1.0),
        min_state_of_charge: Dimensionless(0.0),
        capital_cost: MoneyPerCapacity(0.0),
        lifetime: 20,
        requires_installation: false,
    }
}

pub fn link(id: &str, from: &str, to: &str, stream: &str, capacity: f64, loss: f64) -> NetworkLink {
    NetworkLink {
        id: id.into(),
        from: from.into(),
        to: to.into(),
        streams: vec![stream.into()],
        length: Length(1.0),
        capacity: Capacity(capacity),
        loss_per_length: PerLength(loss),
        cost_per_length: MoneyPerLength(0.0),
        lifetime: 40,
    }
}

/// Assemble a model from its parts
pub fn model(
    time_steps: u32,
    streams: StreamMap,
    hubs: Vec<Hub>,
    converters: Vec<Converter>,
    storages: Vec<Storage>,
    links: Vec<NetworkLink>,
) -> Model {
    Model {
        parameters: ModelParameters::new(time_steps, StorageInitialState::Cyclic),
        streams,
        hubs: hubs.into_iter().map(|h| (h.id.clone(), h)).collect(),
        converters: converters.into_iter().map(|c| (c.id.clone(), c)).collect(),
        storages: storages.into_iter().map(|s| (s.id.clone(), s)).collect(),
        links: links.into_iter().map(|l| (l.id.clone(), l)).collect::<IndexMap<_, _>>(),
    }
}
