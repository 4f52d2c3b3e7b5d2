//! Links for transferring streams between hubs.
use crate::hub::HubID;
use crate::id::{define_id_getter, define_id_type};
use crate::stream::StreamID;
use crate::units::{Capacity, Dimensionless, Length, MoneyPerLength, PerLength};
use indexmap::IndexMap;

define_id_type! {LinkID}

/// A map of [`NetworkLink`]s, keyed by link ID
pub type LinkMap = IndexMap<LinkID, NetworkLink>;

/// A connection between two hubs
#[derive(PartialEq, Debug, Clone)]
pub struct NetworkLink {
    /// Unique identifier for the link
    pub id: LinkID,
    /// The hub at which positive flow leaves the link
    pub from: HubID,
    /// The hub at which positive flow arrives
    pub to: HubID,
    /// The streams the link carries
    pub streams: Vec<StreamID>,
    /// Length of the link
    pub length: Length,
    /// Maximum flow per hour for each stream
    pub capacity: Capacity,
    /// Fraction of flow lost per unit of length
    pub loss_per_length: PerLength,
    /// Investment cost per unit of length
    pub cost_per_length: MoneyPerLength,
    /// Economic lifetime in years
    pub lifetime: u32,
}
define_id_getter! {NetworkLink, LinkID}

impl NetworkLink {
    /// The fraction of flow entering the link which is lost before it arrives
    pub fn loss_fraction(&self) -> Dimensionless {
        self.loss_per_length * self.length
    }
}
