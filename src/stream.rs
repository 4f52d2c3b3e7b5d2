//! Streams are the energy carriers conserved at every hub (electricity, heat, gas, ...).
use crate::id::{define_id_getter, define_id_type};
use crate::units::{CarbonPerEnergy, MoneyPerEnergy};
use indexmap::IndexMap;
use serde::Deserialize;

define_id_type! {StreamID}

/// A map of [`Stream`]s, keyed by stream ID
pub type StreamMap = IndexMap<StreamID, Stream>;

/// An energy carrier
#[derive(PartialEq, Debug, Deserialize, Clone)]
pub struct Stream {
    /// Unique identifier for the stream (e.g. "heat")
    pub id: StreamID,
    /// Price paid per unit imported into a hub, if the stream can be bought
    pub import_price: Option<MoneyPerEnergy>,
    /// Feed-in tariff received per unit exported, if the stream can be sold
    pub export_price: Option<MoneyPerEnergy>,
    /// Carbon emitted per unit imported
    #[serde(default)]
    pub carbon_factor: CarbonPerEnergy,
}
define_id_getter! {Stream, StreamID}

impl Stream {
    /// Create a stream which can be neither bought nor sold
    pub fn new(id: &str) -> Self {
        Self {
            id: id.into(),
            import_price: None,
            export_price: None,
            carbon_factor: CarbonPerEnergy(0.0),
        }
    }

    /// Whether the stream can be bought from outside the hub
    pub fn is_purchasable(&self) -> bool {
        self.import_price.is_some()
    }

    /// Whether the stream can be sold to outside the hub
    pub fn is_exportable(&self) -> bool {
        self.export_price.is_some()
    }
}
