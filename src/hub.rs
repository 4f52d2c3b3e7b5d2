//! Hubs are the sites at which streams are balanced.
use crate::id::{define_id_getter, define_id_type};
use crate::stream::StreamID;
use crate::units::{Capacity, Energy};
use indexmap::IndexMap;

define_id_type! {HubID}

/// A map of [`Hub`]s, keyed by hub ID
pub type HubMap = IndexMap<HubID, Hub>;

/// A time series of energy quantities, one entry per time step
pub type EnergySeries = Vec<Energy>;

/// A site hosting demands, converters and storages
#[derive(PartialEq, Debug, Clone)]
pub struct Hub {
    /// Unique identifier for the hub
    pub id: HubID,
    /// Demand for each stream at every time step
    pub demands: IndexMap<StreamID, EnergySeries>,
    /// Maximum amount of a stream available for import at every time step.
    ///
    /// This is used for supplies which are limited independently of what is installed.
    pub import_limits: IndexMap<StreamID, EnergySeries>,
    /// Amount of a stream collected per unit of converter capacity at every time step.
    ///
    /// Converters whose input scales with their size (e.g. solar panels under a given
    /// irradiation) take their input from these series.
    pub yields: IndexMap<StreamID, EnergySeries>,
    /// Upper limit on the total capacity of roof-mounted converters at the hub
    pub roof_area: Option<Capacity>,
}
define_id_getter! {Hub, HubID}

impl Hub {
    /// Create a hub with no time series and no roof limit
    pub fn new(id: &str) -> Self {
        Self {
            id: id.into(),
            demands: IndexMap::new(),
            import_limits: IndexMap::new(),
            yields: IndexMap::new(),
            roof_area: None,
        }
    }

    /// The demand for a stream at the given (zero-based) time step.
    ///
    /// Streams without a demand series have zero demand.
    pub fn demand(&self, stream_id: &StreamID, time_step: usize) -> Energy {
        self.demands
            .get(stream_id)
            .and_then(|series| series.get(time_step))
            .copied()
            .unwrap_or_default()
    }

    /// The import limit for a stream at the given time step, if there is one
    pub fn import_limit(&self, stream_id: &StreamID, time_step: usize) -> Option<Energy> {
        self.import_limits
            .get(stream_id)
            .and_then(|series| series.get(time_step))
            .copied()
    }

    /// The yield per unit of capacity for a stream at the given time step, if there is one
    pub fn yield_per_capacity(&self, stream_id: &StreamID, time_step: usize) -> Option<Energy> {
        self.yields
            .get(stream_id)
            .and_then(|series| series.get(time_step))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_defaults_to_zero() {
        let mut hub = Hub::new("hub1");
        hub.demands
            .insert("heat".into(), vec![Energy(10.0), Energy(5.0)]);

        assert_eq!(hub.demand(&"heat".into(), 1), Energy(5.0));
        assert_eq!(hub.demand(&"elec".into(), 1), Energy(0.0));
        assert_eq!(hub.import_limit(&"solar".into(), 0), None);
        assert_eq!(hub.yield_per_capacity(&"solar".into(), 0), None);
    }
}
