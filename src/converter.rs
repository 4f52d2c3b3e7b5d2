//! Converters turn input streams into output streams at fixed efficiencies.
use crate::capacity::CapacitySpec;
use crate::hub::HubID;
use crate::id::{define_id_getter, define_id_type};
use crate::stream::StreamID;
use crate::units::{Dimensionless, Money, MoneyPerCapacity, MoneyPerEnergy};
use indexmap::IndexMap;

define_id_type! {ConverterID}

/// A map of [`Converter`]s, keyed by converter ID
pub type ConverterMap = IndexMap<ConverterID, Converter>;

/// A conversion technology installed at a hub.
///
/// Dispatch is measured as the total input consumed per time step. Each input stream supplies a
/// fixed share of that total and each output stream receives a fixed amount per unit of total
/// input. The first output is the primary output, against which capacity is rated.
#[derive(PartialEq, Debug, Clone)]
pub struct Converter {
    /// Unique identifier for the converter (e.g. "gas_boiler")
    pub id: ConverterID,
    /// The hub the converter is located at
    pub hub: HubID,
    /// Share of total input drawn from each input stream (sums to one)
    pub inputs: IndexMap<StreamID, Dimensionless>,
    /// Output per unit of total input for each output stream
    pub outputs: IndexMap<StreamID, Dimensionless>,
    /// Capacity, in units of primary output per hour
    pub capacity: CapacitySpec,
    /// Minimum fraction of capacity at which the converter may run while switched on
    pub min_part_load: Dimensionless,
    /// Investment cost per unit of capacity
    pub capital_cost: MoneyPerCapacity,
    /// Investment cost incurred once if the converter is installed at all
    pub fixed_capital_cost: Money,
    /// Annual maintenance cost per unit of capacity
    pub maintenance_cost: MoneyPerCapacity,
    /// Maintenance cost per unit of primary output
    pub usage_maintenance_cost: MoneyPerEnergy,
    /// Economic lifetime in years
    pub lifetime: u32,
    /// Whether installing the converter is a binary decision
    pub requires_installation: bool,
    /// An input stream collected in proportion to capacity, from the hub's yield series
    pub source_yield: Option<StreamID>,
    /// Whether the converter is mounted on the roof and so limited by the hub's roof area
    pub uses_roof: bool,
}
define_id_getter! {Converter, ConverterID}

impl Converter {
    /// The efficiency of turning `input` into `output`, if the converter has both streams
    pub fn efficiency(&self, input: &StreamID, output: &StreamID) -> Option<Dimensionless> {
        let share = self.inputs.get(input)?;
        let yield_ = self.outputs.get(output)?;
        Some(*yield_ / *share)
    }

    /// The primary output stream and its output per unit of total input
    pub fn primary_output(&self) -> Option<(&StreamID, Dimensionless)> {
        self.outputs.first().map(|(id, eff)| (id, *eff))
    }

    /// Whether the converter has a minimum part load
    pub fn has_part_load(&self) -> bool {
        self.min_part_load > Dimensionless(0.0)
    }

    /// The net amount of `stream` produced per unit of dispatch (negative if consumed)
    pub fn net_coefficient(&self, stream: &StreamID) -> f64 {
        let produced = self.outputs.get(stream).map_or(0.0, |eff| eff.value());
        let consumed = self.inputs.get(stream).map_or(0.0, |share| share.value());
        produced - consumed
    }
}
