//! Fixtures for tests
use crate::capacity::CapacitySpec;
use crate::converter::Converter;
use crate::hub::Hub;
use crate::model::{Model, ModelParameters, StorageInitialState};
use crate::network::NetworkLink;
use crate::storage::Storage;
use crate::stream::{Stream, StreamMap};
use crate::units::{
    Capacity, Dimensionless, Energy, Length, Money, MoneyPerCapacity, MoneyPerEnergy,
    MoneyPerLength, PerLength,
};
use indexmap::{IndexMap, indexmap};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Assert that a configuration error for the given entity and field occurs
macro_rules! assert_configuration_error {
    ($result:expr, $entity:expr, $field:expr) => {{
        let err = anyhow::Error::from($result.unwrap_err());
        let config_err = err
            .chain()
            .find_map(|e| e.downcast_ref::<crate::model::ConfigurationError>())
            .unwrap_or_else(|| panic!("Not a configuration error: {err:?}"));
        assert_eq!(config_err.entity, $entity);
        assert_eq!(config_err.field, $field);
    }};
}
pub(crate) use assert_configuration_error;

/// Create a map of streams in the given order
fn streams(streams: impl IntoIterator<Item = Stream>) -> StreamMap {
    streams.into_iter().map(|s| (s.id.clone(), s)).collect()
}

/// A stream which can be bought at the given price
fn purchasable(id: &str, price: f64) -> Stream {
    Stream {
        import_price: Some(MoneyPerEnergy(price)),
        ..Stream::new(id)
    }
}

fn converter(id: &str, hub: &str, inputs: &[(&str, f64)], outputs: &[(&str, f64)]) -> Converter {
    let to_map = |flows: &[(&str, f64)]| -> IndexMap<_, _> {
        flows
            .iter()
            .map(|(stream, value)| ((*stream).into(), Dimensionless(*value)))
            .collect()
    };

    Converter {
        id: id.into(),
        hub: hub.into(),
        inputs: to_map(inputs),
        outputs: to_map(outputs),
        capacity: CapacitySpec::Optimised { max: None },
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

fn hub_with_demand(id: &str, stream: &str, demand: &[f64]) -> Hub {
    let mut hub = Hub::new(id);
    hub.demands.insert(
        stream.into(),
        demand.iter().copied().map(Energy).collect(),
    );
    hub
}

#[fixture]
pub fn chp() -> Converter {
    converter("chp", "hub1", &[("gas", 1.0)], &[("elec", 0.35), ("heat", 0.5)])
}

/// A single hub meeting a heat demand of 10 per time step with a gas boiler
#[fixture]
pub fn boiler_model() -> Model {
    let hub = hub_with_demand("hub1", "heat", &[10.0, 10.0, 10.0]);
    let boiler = converter("boiler", "hub1", &[("gas", 1.0)], &[("heat", 0.9)]);

    Model {
        parameters: ModelParameters::new(3, StorageInitialState::Cyclic),
        streams: streams([purchasable("gas", 1.0), Stream::new("heat")]),
        hubs: indexmap! { hub.id.clone() => hub },
        converters: indexmap! { boiler.id.clone() => boiler },
        storages: IndexMap::new(),
        links: IndexMap::new(),
    }
}

/// Heat produced at `hub1` is piped to a demand and a storage at `hub2`
#[fixture]
pub fn network_model() -> Model {
    let hub1 = Hub::new("hub1");
    let hub2 = hub_with_demand("hub2", "heat", &[10.0, 10.0, 10.0]);
    let boiler = converter("boiler", "hub1", &[("gas", 1.0)], &[("heat", 0.9)]);
    let tank = Storage {
        id: "tank".into(),
        hub: "hub2".into(),
        stream: "heat".into(),
        capacity: CapacitySpec::Fixed(Capacity(20.0)),
        standing_loss: Dimensionless(0.01),
        max_charge_rate: Dimensionless(0.5),
        max_discharge_rate: Dimensionless(0.5),
        charge_efficiency: Dimensionless(0.9),
        discharge_efficiency: Dimensionless(0.9),
        min_state_of_charge: Dimensionless(0.1),
        capital_cost: MoneyPerCapacity(0.0),
        lifetime: 20,
        requires_installation: false,
    };
    let pipe = NetworkLink {
        id: "pipe".into(),
        from: "hub1".into(),
        to: "hub2".into(),
        streams: vec!["heat".into()],
        length: Length(1.0),
        capacity: Capacity(30.0),
        loss_per_length: PerLength(0.0),
        cost_per_length: MoneyPerLength(0.0),
        lifetime: 40,
    };

    Model {
        parameters: ModelParameters::new(3, StorageInitialState::Cyclic),
        streams: streams([purchasable("gas", 1.0), Stream::new("heat")]),
        hubs: indexmap! { hub1.id.clone() => hub1, hub2.id.clone() => hub2 },
        converters: indexmap! { boiler.id.clone() => boiler },
        storages: indexmap! { tank.id.clone() => tank },
        links: indexmap! { pipe.id.clone() => pipe },
    }
}

/// A single converter with a minimum part load of 40% and capacity of up to 100.
///
/// The first variables are the three dispatch variables, then capacity, then the on/off binaries.
#[fixture]
pub fn part_load_model() -> Model {
    let hub = hub_with_demand("hub1", "elec", &[10.0, 10.0, 10.0]);
    let mut chp = converter("chp", "hub1", &[("gas", 1.0)], &[("elec", 0.5)]);
    chp.capacity = CapacitySpec::Optimised {
        max: Some(Capacity(100.0)),
    };
    chp.min_part_load = Dimensionless(0.4);

    Model {
        parameters: ModelParameters::new(3, StorageInitialState::Cyclic),
        streams: streams([purchasable("gas", 1.0), Stream::new("elec")]),
        hubs: indexmap! { hub.id.clone() => hub },
        converters: indexmap! { chp.id.clone() => chp },
        storages: IndexMap::new(),
        links: IndexMap::new(),
    }
}

/// A roof-mounted solar panel at a hub which can also buy electricity from the grid.
///
/// Each unit of panel capacity collects 0, 2 and 4 units of irradiation in the three time steps.
/// The roof has room for 4 units of capacity.
#[fixture]
pub fn solar_model() -> Model {
    let mut hub = hub_with_demand("hub1", "elec", &[5.0, 5.0, 5.0]);
    hub.yields.insert(
        "solar".into(),
        vec![Energy(0.0), Energy(2.0), Energy(4.0)],
    );
    hub.roof_area = Some(Capacity(4.0));
    let mut pv = converter("pv", "hub1", &[("solar", 1.0)], &[("elec", 0.25)]);
    pv.capital_cost = MoneyPerCapacity(1.0);
    pv.lifetime = 10;
    pv.source_yield = Some("solar".into());
    pv.uses_roof = true;

    Model {
        parameters: ModelParameters::new(3, StorageInitialState::Cyclic),
        streams: streams([purchasable("solar", 0.0), purchasable("elec", 0.3)]),
        hubs: indexmap! { hub.id.clone() => hub },
        converters: indexmap! { pv.id.clone() => pv },
        storages: IndexMap::new(),
        links: IndexMap::new(),
    }
}
