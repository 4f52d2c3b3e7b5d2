//! Code for reading converters and their flows.
use super::{input_err_msg, read_csv};
use crate::capacity::CapacitySpec;
use crate::converter::{Converter, ConverterID, ConverterMap};
use crate::hub::HubID;
use crate::id::{IDCollection, collect_by_id};
use crate::stream::StreamID;
use crate::units::{Capacity, Dimensionless, Money, MoneyPerCapacity, MoneyPerEnergy};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const CONVERTERS_FILE_NAME: &str = "converters.csv";
const CONVERTER_FLOWS_FILE_NAME: &str = "converter_flows.csv";

#[derive(Deserialize)]
struct ConverterRaw {
    id: ConverterID,
    hub_id: HubID,
    capacity: Option<Capacity>,
    max_capacity: Option<Capacity>,
    min_part_load: Option<Dimensionless>,
    capital_cost: Option<MoneyPerCapacity>,
    fixed_capital_cost: Option<Money>,
    maintenance_cost: Option<MoneyPerCapacity>,
    usage_maintenance_cost: Option<MoneyPerEnergy>,
    lifetime: u32,
    requires_installation: Option<bool>,
    #[serde(default)]
    source_yield: Option<StreamID>,
    #[serde(default)]
    uses_roof: Option<bool>,
}

impl ConverterRaw {
    fn into_converter(self) -> Result<Converter> {
        ensure!(
            self.capacity.is_none() || self.max_capacity.is_none(),
            "Converter {} cannot have both capacity and max_capacity",
            self.id
        );

        Ok(Converter {
            id: self.id,
            hub: self.hub_id,
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            capacity: CapacitySpec::from_fields(self.capacity, self.max_capacity),
            min_part_load: self.min_part_load.unwrap_or_default(),
            capital_cost: self.capital_cost.unwrap_or_default(),
            fixed_capital_cost: self.fixed_capital_cost.unwrap_or_default(),
            maintenance_cost: self.maintenance_cost.unwrap_or_default(),
            usage_maintenance_cost: self.usage_maintenance_cost.unwrap_or_default(),
            lifetime: self.lifetime,
            requires_installation: self.requires_installation.unwrap_or_default(),
            source_yield: self.source_yield,
            uses_roof: self.uses_roof.unwrap_or_default(),
        })
    }
}

/// A row of the converter flows file.
///
/// A negative coefficient is the share of total input drawn from the stream; a positive one is
/// the output of the stream per unit of total input.
#[derive(Deserialize)]
struct ConverterFlowRaw {
    converter_id: ConverterID,
    stream_id: StreamID,
    coeff: f64,
}

/// Read converters from `converters.csv` and their flows from `converter_flows.csv`
pub fn read_converters(model_dir: &Path) -> Result<ConverterMap> {
    let file_path = model_dir.join(CONVERTERS_FILE_NAME);
    let mut converters: ConverterMap = read_csv::<ConverterRaw>(&file_path)?
        .into_iter()
        .map(ConverterRaw::into_converter)
        .collect::<Result<Vec<_>>>()
        .and_then(collect_by_id)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(CONVERTER_FLOWS_FILE_NAME);
    let flows = read_csv(&file_path)?;
    add_flows(&mut converters, flows).with_context(|| input_err_msg(&file_path))?;

    Ok(converters)
}

fn add_flows(converters: &mut ConverterMap, flows: Vec<ConverterFlowRaw>) -> Result<()> {
    for flow in flows {
        let id = converters.get_id(&flow.converter_id)?;
        let converter = &mut converters[&id];
        ensure!(
            !converter.inputs.contains_key(&flow.stream_id)
                && !converter.outputs.contains_key(&flow.stream_id),
            "Converter {id} has more than one flow for stream {}",
            flow.stream_id
        );

        if flow.coeff < 0.0 {
            converter
                .inputs
                .insert(flow.stream_id, Dimensionless(-flow.coeff));
        } else if flow.coeff > 0.0 {
            converter
                .outputs
                .insert(flow.stream_id, Dimensionless(flow.coeff));
        } else {
            bail!(
                "Flow coefficient for converter {id} and stream {} must be non-zero",
                flow.stream_id
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const CONVERTERS_HEADER: &str = "id,hub_id,capacity,max_capacity,min_part_load,capital_cost,\
        fixed_capital_cost,maintenance_cost,usage_maintenance_cost,lifetime,requires_installation";

    fn write_files(dir: &Path, converters: &str, flows: &str) {
        fs::write(
            dir.join(CONVERTERS_FILE_NAME),
            format!("{CONVERTERS_HEADER}\n{converters}"),
        )
        .unwrap();
        fs::write(
            dir.join(CONVERTER_FLOWS_FILE_NAME),
            format!("converter_id,stream_id,coeff\n{flows}"),
        )
        .unwrap();
    }

    #[test]
    fn test_read_converters() {
        let dir = tempdir().unwrap();
        write_files(
            dir.path(),
            "chp,hub1,,100,0.3,1000,500,10,0.01,20,true\nboiler,hub1,50,,,,,,,25,\n",
            "chp,gas,-1\nchp,elec,0.35\nchp,heat,0.5\nboiler,gas,-1\nboiler,heat,0.9\n",
        );

        let converters = read_converters(dir.path()).unwrap();
        let chp = &converters["chp"];
        assert_eq!(
            chp.capacity,
            CapacitySpec::Optimised {
                max: Some(Capacity(100.0))
            }
        );
        assert_eq!(chp.min_part_load, Dimensionless(0.3));
        assert_eq!(chp.fixed_capital_cost, Money(500.0));
        assert!(chp.requires_installation);
        assert_eq!(chp.inputs[&StreamID::new("gas")], Dimensionless(1.0));
        assert_eq!(chp.primary_output().unwrap().0, &StreamID::new("elec"));

        let boiler = &converters["boiler"];
        assert_eq!(boiler.capacity, CapacitySpec::Fixed(Capacity(50.0)));
        assert_eq!(boiler.min_part_load, Dimensionless(0.0));
        assert!(!boiler.requires_installation);
    }

    #[test]
    fn test_read_converters_roof_mounted() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONVERTERS_FILE_NAME),
            format!(
                "{CONVERTERS_HEADER},source_yield,uses_roof\n\
                pv,hub1,,,,300,,,,25,,solar,true\n\
                boiler,hub1,50,,,,,,,25,,,\n"
            ),
        )
        .unwrap();
        fs::write(
            dir.path().join(CONVERTER_FLOWS_FILE_NAME),
            "converter_id,stream_id,coeff\n\
            pv,solar,-1\npv,elec,0.2\nboiler,gas,-1\nboiler,heat,0.9\n",
        )
        .unwrap();

        let converters = read_converters(dir.path()).unwrap();
        let pv = &converters["pv"];
        assert_eq!(pv.source_yield, Some(StreamID::new("solar")));
        assert!(pv.uses_roof);
        let boiler = &converters["boiler"];
        assert_eq!(boiler.source_yield, None);
        assert!(!boiler.uses_roof);
    }

    #[test]
    fn test_read_converters_both_capacities() {
        let dir = tempdir().unwrap();
        write_files(
            dir.path(),
            "boiler,hub1,50,100,,,,,,25,\n",
            "boiler,gas,-1\nboiler,heat,0.9\n",
        );
        assert!(read_converters(dir.path()).is_err());
    }

    #[test]
    fn test_read_converters_bad_flows() {
        let dir = tempdir().unwrap();
        write_files(dir.path(), "boiler,hub1,50,,,,,,,25,\n", "boiler,gas,0\n");
        assert!(read_converters(dir.path()).is_err());

        write_files(
            dir.path(),
            "boiler,hub1,50,,,,,,,25,\n",
            "boiler,gas,-1\nboiler,gas,0.5\n",
        );
        assert!(read_converters(dir.path()).is_err());

        write_files(dir.path(), "boiler,hub1,50,,,,,,,25,\n", "kettle,gas,-1\n");
        assert!(read_converters(dir.path()).is_err());
    }
}
