//! Code for reading hubs and their time series.
use super::{input_err_msg, read_csv, read_csv_optional};
use crate::hub::{Hub, HubID, HubMap};
use crate::id::{IDCollection, collect_by_id};
use crate::stream::StreamID;
use crate::units::{Capacity, Energy};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const HUBS_FILE_NAME: &str = "hubs.csv";
const TIME_SERIES_FILE_NAME: &str = "time_series.csv";

#[derive(Deserialize)]
struct HubRaw {
    id: HubID,
    #[serde(default)]
    roof_area: Option<Capacity>,
}

/// The quantity a time series describes
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Eq, Hash, Clone, Copy)]
enum SeriesKind {
    #[string = "demand"]
    Demand,
    #[string = "import_limit"]
    ImportLimit,
    #[string = "yield"]
    Yield,
}

#[derive(Deserialize)]
struct TimeSeriesRaw {
    hub_id: HubID,
    stream_id: StreamID,
    kind: SeriesKind,
    time_step: u32,
    value: f64,
}

/// Read hubs from `hubs.csv`, with their demands, import limits and yields from `time_series.csv`
pub fn read_hubs(model_dir: &Path) -> Result<HubMap> {
    let file_path = model_dir.join(HUBS_FILE_NAME);
    let hubs = read_csv::<HubRaw>(&file_path)?
        .into_iter()
        .map(|raw| Hub {
            roof_area: raw.roof_area,
            ..Hub::new(&raw.id.0)
        });
    let mut hubs = collect_by_id(hubs).with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(TIME_SERIES_FILE_NAME);
    let records = read_csv_optional(&file_path)?;
    add_time_series(&mut hubs, records).with_context(|| input_err_msg(&file_path))?;

    Ok(hubs)
}

/// Group time series records into per-hub series.
///
/// Time steps are one-based and must run from 1 without gaps or repeats.
fn add_time_series(hubs: &mut HubMap, records: Vec<TimeSeriesRaw>) -> Result<()> {
    let mut series: IndexMap<(HubID, StreamID, SeriesKind), Vec<(u32, f64)>> = IndexMap::new();
    for record in records {
        let hub_id = hubs.get_id(&record.hub_id)?;
        series
            .entry((hub_id, record.stream_id, record.kind))
            .or_default()
            .push((record.time_step, record.value));
    }

    for ((hub_id, stream_id, kind), mut values) in series {
        values.sort_by_key(|(time_step, _)| *time_step);
        for (expected, (time_step, _)) in (1..).zip(&values) {
            ensure!(
                *time_step == expected,
                "Time steps for hub {hub_id}, stream {stream_id} must run from 1 without gaps \
                or repeats (expected {expected}, found {time_step})"
            );
        }

        let values = values.into_iter().map(|(_, value)| Energy(value)).collect();
        let hub = &mut hubs[&hub_id];
        let target = match kind {
            SeriesKind::Demand => &mut hub.demands,
            SeriesKind::ImportLimit => &mut hub.import_limits,
            SeriesKind::Yield => &mut hub.yields,
        };
        target.insert(stream_id, values);
    }

    Ok(())
}
