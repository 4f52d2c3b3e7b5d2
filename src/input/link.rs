//! Code for reading the network links file.
use super::{input_err_msg, read_csv_optional};
use crate::hub::HubID;
use crate::id::collect_by_id;
use crate::network::{LinkID, LinkMap, NetworkLink};
use crate::units::{Capacity, Length, MoneyPerLength, PerLength};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const LINKS_FILE_NAME: &str = "links.csv";

/// Separates stream IDs in the `streams` column
const STREAM_SEPARATOR: char = ';';

#[derive(Deserialize)]
struct LinkRaw {
    id: LinkID,
    from_hub: HubID,
    to_hub: HubID,
    streams: String,
    length: Length,
    capacity: Capacity,
    loss_per_length: Option<PerLength>,
    cost_per_length: Option<MoneyPerLength>,
    lifetime: u32,
}

impl LinkRaw {
    fn into_link(self) -> Result<NetworkLink> {
        let streams: Vec<_> = self
            .streams
            .split(STREAM_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Into::into)
            .collect();
        ensure!(!streams.is_empty(), "Link {} carries no streams", self.id);

        Ok(NetworkLink {
            id: self.id,
            from: self.from_hub,
            to: self.to_hub,
            streams,
            length: self.length,
            capacity: self.capacity,
            loss_per_length: self.loss_per_length.unwrap_or_default(),
            cost_per_length: self.cost_per_length.unwrap_or_default(),
            lifetime: self.lifetime,
        })
    }
}

/// Read network links from `links.csv`, if present
pub fn read_links(model_dir: &Path) -> Result<LinkMap> {
    let file_path = model_dir.join(LINKS_FILE_NAME);
    read_csv_optional::<LinkRaw>(&file_path)?
        .into_iter()
        .map(LinkRaw::into_link)
        .collect::<Result<Vec<_>>>()
        .and_then(collect_by_id)
        .with_context(|| input_err_msg(&file_path))
}
