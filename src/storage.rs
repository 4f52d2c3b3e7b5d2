//! Storages hold a quantity of one stream at one hub across time steps.
use crate::capacity::CapacitySpec;
use crate::hub::HubID;
use crate::id::{define_id_getter, define_id_type};
use crate::stream::StreamID;
use crate::units::{Dimensionless, MoneyPerCapacity};
use indexmap::IndexMap;

define_id_type! {StorageID}

/// A map of [`Storage`]s, keyed by storage ID
pub type StorageMap = IndexMap<StorageID, Storage>;

/// A storage technology for a single (hub, stream) pair
#[derive(PartialEq, Debug, Clone)]
pub struct Storage {
    /// Unique identifier for the storage
    pub id: StorageID,
    /// The hub the storage is located at
    pub hub: HubID,
    /// The stream stored
    pub stream: StreamID,
    /// Energy capacity
    pub capacity: CapacitySpec,
    /// Fraction of the stored energy lost every time step
    pub standing_loss: Dimensionless,
    /// Maximum charge per time step as a fraction of capacity
    pub max_charge_rate: Dimensionless,
    /// Maximum discharge per time step as a fraction of capacity
    pub max_discharge_rate: Dimensionless,
    /// Fraction of energy charged which is stored
    pub charge_efficiency: Dimensionless,
    /// Fraction of energy withdrawn from storage which is delivered
    pub discharge_efficiency: Dimensionless,
    /// Minimum state of charge as a fraction of capacity
    pub min_state_of_charge: Dimensionless,
    /// Investment cost per unit of capacity
    pub capital_cost: MoneyPerCapacity,
    /// Economic lifetime in years
    pub lifetime: u32,
    /// Whether installing the storage is a binary decision
    pub requires_installation: bool,
}
define_id_getter! {Storage, StorageID}
