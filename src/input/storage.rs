//! Code for reading the storages file.
use super::{input_err_msg, read_csv_optional};
use crate::capacity::CapacitySpec;
use crate::hub::HubID;
use crate::id::collect_by_id;
use crate::storage::{Storage, StorageID, StorageMap};
use crate::stream::StreamID;
use crate::units::{Capacity, Dimensionless, MoneyPerCapacity};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const STORAGES_FILE_NAME: &str = "storages.csv";

#[derive(Deserialize)]
struct StorageRaw {
    id: StorageID,
    hub_id: HubID,
    stream_id: StreamID,
    capacity: Option<Capacity>,
    max_capacity: Option<Capacity>,
    standing_loss: Option<Dimensionless>,
    max_charge_rate: Option<Dimensionless>,
    max_discharge_rate: Option<Dimensionless>,
    charge_efficiency: Option<Dimensionless>,
    discharge_efficiency: Option<Dimensionless>,
    min_state_of_charge: Option<Dimensionless>,
    capital_cost: Option<MoneyPerCapacity>,
    lifetime: u32,
    requires_installation: Option<bool>,
}

impl StorageRaw {
    /// Convert into a [`Storage`]. Rates and efficiencies default to one and losses to zero.
    fn into_storage(self) -> Result<Storage> {
        ensure!(
            self.capacity.is_none() || self.max_capacity.is_none(),
            "Storage {} cannot have both capacity and max_capacity",
            self.id
        );
        let one = Dimensionless(1.0);

        Ok(Storage {
            id: self.id,
            hub: self.hub_id,
            stream: self.stream_id,
            capacity: CapacitySpec::from_fields(self.capacity, self.max_capacity),
            standing_loss: self.standing_loss.unwrap_or_default(),
            max_charge_rate: self.max_charge_rate.unwrap_or(one),
            max_discharge_rate: self.max_discharge_rate.unwrap_or(one),
            charge_efficiency: self.charge_efficiency.unwrap_or(one),
            discharge_efficiency: self.discharge_efficiency.unwrap_or(one),
            min_state_of_charge: self.min_state_of_charge.unwrap_or_default(),
            capital_cost: self.capital_cost.unwrap_or_default(),
            lifetime: self.lifetime,
            requires_installation: self.requires_installation.unwrap_or_default(),
        })
    }
}

/// Read storages from `storages.csv`, if present
pub fn read_storages(model_dir: &Path) -> Result<StorageMap> {
    let file_path = model_dir.join(STORAGES_FILE_NAME);
    read_csv_optional::<StorageRaw>(&file_path)?
        .into_iter()
        .map(StorageRaw::into_storage)
        .collect::<Result<Vec<_>>>()
        .and_then(collect_by_id)
        .with_context(|| input_err_msg(&file_path))
}
