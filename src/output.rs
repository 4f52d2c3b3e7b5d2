//! The module responsible for writing output data to disk.
use crate::converter::ConverterID;
use crate::hub::HubID;
use crate::network::LinkID;
use crate::optimisation::results::Results;
use crate::storage::StorageID;
use crate::stream::StreamID;
use crate::units::Energy;
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "ehub_results";

/// The output file name for cost and carbon totals
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// The output file name for installed capacities
const CAPACITIES_FILE_NAME: &str = "capacities.csv";

/// The output file name for converter flows
const CONVERTER_FLOWS_FILE_NAME: &str = "converter_flows.csv";

/// The output file name for storage operation
const STORAGE_FILE_NAME: &str = "storage.csv";

/// The output file name for imports and exports
const HUB_EXCHANGE_FILE_NAME: &str = "hub_exchange.csv";

/// The output file name for network flows
const NETWORK_FLOWS_FILE_NAME: &str = "network_flows.csv";

/// Get the output directory for the model in the specified directory
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory, if it does not already exist.
///
/// # Returns
///
/// Whether an existing, non-empty directory will be overwritten.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Empty folder
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir).context("Could not delete folder")?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

#[derive(Serialize, Debug, PartialEq)]
struct SummaryRow {
    metric: &'static str,
    value: f64,
}

#[derive(Serialize, Debug, PartialEq)]
struct CapacityRow<'a> {
    kind: &'static str,
    id: &'a str,
    capacity: f64,
    installed: bool,
}

#[derive(Serialize, Debug, PartialEq)]
struct ConverterFlowRow<'a> {
    converter_id: &'a ConverterID,
    stream_id: &'a StreamID,
    time_step: usize,
    flow: f64,
}

#[derive(Serialize, Debug, PartialEq)]
struct StorageRow<'a> {
    storage_id: &'a StorageID,
    time_step: usize,
    charge: f64,
    discharge: f64,
    state_of_charge: f64,
}

#[derive(Serialize, Debug, PartialEq)]
struct HubExchangeRow<'a> {
    hub_id: &'a HubID,
    stream_id: &'a StreamID,
    time_step: usize,
    import: f64,
    export: f64,
}

#[derive(Serialize, Debug, PartialEq)]
struct NetworkFlowRow<'a> {
    link_id: &'a LinkID,
    stream_id: &'a StreamID,
    time_step: usize,
    flow: f64,
}

/// Write every record to a new CSV file at the given path
fn write_rows<T, I>(file_path: &Path, rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::Writer::from_path(file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

fn summary_rows(results: &Results) -> Vec<SummaryRow> {
    let costs = &results.costs;
    vec![
        SummaryRow {
            metric: "objective",
            value: results.objective_value,
        },
        SummaryRow {
            metric: "investment_cost",
            value: costs.investment.value(),
        },
        SummaryRow {
            metric: "operating_cost",
            value: costs.operating.value(),
        },
        SummaryRow {
            metric: "maintenance_cost",
            value: costs.maintenance.value(),
        },
        SummaryRow {
            metric: "export_income",
            value: costs.export_income.value(),
        },
        SummaryRow {
            metric: "total_cost",
            value: costs.total.value(),
        },
        SummaryRow {
            metric: "carbon",
            value: costs.carbon.value(),
        },
    ]
}

fn capacity_rows(results: &Results) -> impl Iterator<Item = CapacityRow<'_>> {
    let converters = results.converters.iter().map(|(id, r)| CapacityRow {
        kind: "converter",
        id: &id.0,
        capacity: r.capacity.value(),
        installed: r.installed,
    });
    let storages = results.storages.iter().map(|(id, r)| CapacityRow {
        kind: "storage",
        id: &id.0,
        capacity: r.capacity.value(),
        installed: r.installed,
    });
    let links = results.links.iter().map(|(id, r)| CapacityRow {
        kind: "link",
        id: &id.0,
        capacity: r.capacity.value(),
        installed: r.installed,
    });

    converters.chain(storages).chain(links)
}

fn converter_flow_rows(results: &Results) -> impl Iterator<Item = ConverterFlowRow<'_>> {
    results.converters.iter().flat_map(|(converter_id, result)| {
        result.flows.iter().flat_map(move |(stream_id, series)| {
            series
                .iter()
                .enumerate()
                .map(move |(t, flow)| ConverterFlowRow {
                    converter_id,
                    stream_id,
                    time_step: t + 1,
                    flow: flow.value(),
                })
        })
    })
}

/// One row per time step. The state of charge is the value at the end of each step.
fn storage_rows(results: &Results) -> impl Iterator<Item = StorageRow<'_>> {
    results.storages.iter().flat_map(|(storage_id, result)| {
        result
            .charge
            .iter()
            .zip(&result.discharge)
            .zip(result.state_of_charge.iter().skip(1))
            .enumerate()
            .map(move |(t, ((charge, discharge), state))| StorageRow {
                storage_id,
                time_step: t + 1,
                charge: charge.value(),
                discharge: discharge.value(),
                state_of_charge: state.value(),
            })
    })
}

fn hub_exchange_rows(results: &Results) -> Vec<HubExchangeRow<'_>> {
    let mut rows = Vec::new();
    let keys = results
        .imports
        .keys()
        .chain(results.exports.keys().filter(|k| !results.imports.contains_key(*k)));
    for key in keys {
        let (hub_id, stream_id) = key;
        let imports = results.imports.get(key);
        let exports = results.exports.get(key);
        let len = imports.or(exports).map_or(0, Vec::len);
        for t in 0..len {
            let value_at = |series: Option<&Vec<Energy>>| series.map_or(0.0, |s| s[t].value());
            rows.push(HubExchangeRow {
                hub_id,
                stream_id,
                time_step: t + 1,
                import: value_at(imports),
                export: value_at(exports),
            });
        }
    }

    rows
}

fn network_flow_rows(results: &Results) -> impl Iterator<Item = NetworkFlowRow<'_>> {
    results.links.iter().flat_map(|(link_id, result)| {
        result.flows.iter().flat_map(move |(stream_id, series)| {
            series
                .iter()
                .enumerate()
                .map(move |(t, flow)| NetworkFlowRow {
                    link_id,
                    stream_id,
                    time_step: t + 1,
                    flow: flow.value(),
                })
        })
    })
}

/// Write the results of a solved model to CSV files in `output_dir`
pub fn write_results(output_dir: &Path, results: &Results) -> Result<()> {
    write_rows(&output_dir.join(SUMMARY_FILE_NAME), summary_rows(results))?;
    write_rows(&output_dir.join(CAPACITIES_FILE_NAME), capacity_rows(results))?;
    write_rows(
        &output_dir.join(CONVERTER_FLOWS_FILE_NAME),
        converter_flow_rows(results),
    )?;
    write_rows(&output_dir.join(STORAGE_FILE_NAME), storage_rows(results))?;
    write_rows(
        &output_dir.join(HUB_EXCHANGE_FILE_NAME),
        hub_exchange_rows(results),
    )?;
    write_rows(
        &output_dir.join(NETWORK_FLOWS_FILE_NAME),
        network_flow_rows(results),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimisation::results::{ConverterResult, CostSummary, LinkResult, StorageResult};
    use crate::units::{Capacity, Carbon, Money};
    use indexmap::{IndexMap, indexmap};
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::io::{BufRead, BufReader};
    use tempfile::tempdir;

    fn series(values: &[f64]) -> Vec<Energy> {
        values.iter().copied().map(Energy).collect()
    }

    #[fixture]
    fn results() -> Results {
        Results {
            objective_value: 33.0,
            costs: CostSummary {
                investment: Money(0.0),
                operating: Money(33.0),
                maintenance: Money(0.0),
                export_income: Money(0.0),
                total: Money(33.0),
                carbon: Carbon(0.0),
            },
            converters: indexmap! {
                "boiler".into() => ConverterResult {
                    capacity: Capacity(11.0),
                    installed: true,
                    dispatch: series(&[11.0, 11.0]),
                    flows: indexmap! {
                        "gas".into() => series(&[-11.0, -11.0]),
                        "heat".into() => series(&[9.9, 9.9]),
                    },
                }
            },
            storages: indexmap! {
                "tank".into() => StorageResult {
                    capacity: Capacity(5.0),
                    installed: true,
                    charge: series(&[1.0, 0.0]),
                    discharge: series(&[0.0, 1.0]),
                    state_of_charge: series(&[2.0, 3.0, 2.0]),
                }
            },
            imports: indexmap! { ("hub1".into(), "gas".into()) => series(&[11.0, 11.0]) },
            exports: IndexMap::new(),
            links: indexmap! {
                "pipe".into() => LinkResult {
                    capacity: Capacity(30.0),
                    installed: false,
                    flows: indexmap! { "heat".into() => series(&[0.0, 0.0]) },
                }
            },
            values: Vec::new(),
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        let file = File::open(path).unwrap();
        BufReader::new(file).lines().map(|line| line.unwrap()).collect()
    }

    #[test]
    fn test_create_output_directory_new_directory() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("results");
        let result = create_output_directory(&output_dir, false).unwrap();
        assert!(!result);
        assert!(output_dir.is_dir());
    }

    #[test]
    fn test_create_output_directory_existing_empty_directory() {
        let temp_dir = tempdir().unwrap();
        let result = create_output_directory(temp_dir.path(), false).unwrap();
        assert!(!result);
    }

    #[rstest]
    #[case(false, false)]
    #[case(true, true)]
    fn test_create_output_directory_existing_non_empty(
        #[case] allow_overwrite: bool,
        #[case] succeeds: bool,
    ) {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("file.txt");
        fs::write(&file_path, "contents").unwrap();

        let result = create_output_directory(temp_dir.path(), allow_overwrite);
        assert_eq!(result.is_ok(), succeeds);
        if succeeds {
            assert!(result.unwrap());
            assert!(!file_path.exists());
        } else {
            assert!(file_path.exists());
        }
    }

    #[rstest]
    fn test_write_results(results: Results) {
        let dir = tempdir().unwrap();
        write_results(dir.path(), &results).unwrap();

        let summary = read_lines(&dir.path().join(SUMMARY_FILE_NAME));
        assert_eq!(summary[0], "metric,value");
        assert_eq!(summary[1], "objective,33.0");
        assert_eq!(summary.len(), 8);

        let capacities = read_lines(&dir.path().join(CAPACITIES_FILE_NAME));
        assert_eq!(
            capacities,
            [
                "kind,id,capacity,installed",
                "converter,boiler,11.0,true",
                "storage,tank,5.0,true",
                "link,pipe,30.0,false"
            ]
        );

        let flows = read_lines(&dir.path().join(CONVERTER_FLOWS_FILE_NAME));
        assert_eq!(flows[0], "converter_id,stream_id,time_step,flow");
        assert_eq!(flows[1], "boiler,gas,1,-11.0");
        assert_eq!(flows.len(), 5);

        let storage = read_lines(&dir.path().join(STORAGE_FILE_NAME));
        assert_eq!(storage[1], "tank,1,1.0,0.0,3.0");
        assert_eq!(storage[2], "tank,2,0.0,1.0,2.0");

        let exchange = read_lines(&dir.path().join(HUB_EXCHANGE_FILE_NAME));
        assert_eq!(exchange[0], "hub_id,stream_id,time_step,import,export");
        assert_eq!(exchange[2], "hub1,gas,2,11.0,0.0");

        let network = read_lines(&dir.path().join(NETWORK_FLOWS_FILE_NAME));
        assert_eq!(network.len(), 3);
    }
}
