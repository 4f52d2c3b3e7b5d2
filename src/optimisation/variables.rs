//! The variable registry.
//!
//! Every decision variable is identified by a [`VariableKey`] (a name plus an index tuple) and
//! resolves to exactly one [`Variable`] handle for the lifetime of a problem.
use crate::converter::ConverterID;
use crate::hub::HubID;
use crate::network::LinkID;
use crate::storage::StorageID;
use crate::stream::StreamID;
use indexmap::IndexMap;
use std::error::Error;
use std::fmt;

/// A decision variable in the optimisation.
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(usize);

impl Variable {
    /// The column index of the variable
    pub fn index(self) -> usize {
        self.0
    }
}

/// The set of values a variable may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Domain {
    /// Continuous and non-negative
    #[strum(to_string = "non-negative")]
    NonNegative,
    /// Continuous and unrestricted in sign
    #[strum(to_string = "free")]
    Free,
    /// Zero or one
    #[strum(to_string = "binary")]
    Binary,
}

/// The name and index of a decision variable.
///
/// Time steps are zero-based. State-of-charge variables are indexed over `0..=T`, where index 0
/// is the state before the first time step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum VariableKey {
    /// Total input consumed by a converter
    Dispatch {
        converter: ConverterID,
        time_step: usize,
    },
    /// Capacity of a converter
    ConverterCapacity(ConverterID),
    /// Whether a converter is installed
    ConverterInstalled(ConverterID),
    /// Whether a converter is switched on
    ConverterOn {
        converter: ConverterID,
        time_step: usize,
    },
    /// Amount of a stream bought at a hub
    Import {
        hub: HubID,
        stream: StreamID,
        time_step: usize,
    },
    /// Amount of a stream sold from a hub
    Export {
        hub: HubID,
        stream: StreamID,
        time_step: usize,
    },
    /// Energy put into a storage
    StorageCharge {
        storage: StorageID,
        time_step: usize,
    },
    /// Energy taken out of a storage
    StorageDischarge {
        storage: StorageID,
        time_step: usize,
    },
    /// Energy held in a storage
    StorageState { storage: StorageID, index: usize },
    /// Capacity of a storage
    StorageCapacity(StorageID),
    /// Whether a storage is installed
    StorageInstalled(StorageID),
    /// Flow of a stream along a link
    LinkFlow {
        link: LinkID,
        stream: StreamID,
        time_step: usize,
    },
    /// Whether a link is built
    LinkInstalled(LinkID),
}

impl VariableKey {
    /// The name of the variable family
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dispatch { .. } => "dispatch",
            Self::ConverterCapacity(_) => "converter_capacity",
            Self::ConverterInstalled(_) => "converter_installed",
            Self::ConverterOn { .. } => "converter_on",
            Self::Import { .. } => "import",
            Self::Export { .. } => "export",
            Self::StorageCharge { .. } => "storage_charge",
            Self::StorageDischarge { .. } => "storage_discharge",
            Self::StorageState { .. } => "state_of_charge",
            Self::StorageCapacity(_) => "storage_capacity",
            Self::StorageInstalled(_) => "storage_installed",
            Self::LinkFlow { .. } => "link_flow",
            Self::LinkInstalled(_) => "link_installed",
        }
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();

        // Time steps are shown one-based
        match self {
            Self::Dispatch {
                converter,
                time_step,
            }
            | Self::ConverterOn {
                converter,
                time_step,
            } => write!(f, "{name}[{converter},{}]", time_step + 1),
            Self::ConverterCapacity(id) | Self::ConverterInstalled(id) => {
                write!(f, "{name}[{id}]")
            }
            Self::Import {
                hub,
                stream,
                time_step,
            }
            | Self::Export {
                hub,
                stream,
                time_step,
            } => write!(f, "{name}[{hub},{stream},{}]", time_step + 1),
            Self::StorageCharge { storage, time_step }
            | Self::StorageDischarge { storage, time_step } => {
                write!(f, "{name}[{storage},{}]", time_step + 1)
            }
            Self::StorageState { storage, index } => write!(f, "{name}[{storage},{index}]"),
            Self::StorageCapacity(id) | Self::StorageInstalled(id) => write!(f, "{name}[{id}]"),
            Self::LinkFlow {
                link,
                stream,
                time_step,
            } => write!(f, "{name}[{link},{stream},{}]", time_step + 1),
            Self::LinkInstalled(id) => write!(f, "{name}[{id}]"),
        }
    }
}

/// The domain and bounds of a declared variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    /// The variable's identity
    pub key: VariableKey,
    /// The variable's domain
    pub domain: Domain,
    /// Lower bound (may be `-inf`)
    pub lower: f64,
    /// Upper bound (may be `inf`)
    pub upper: f64,
}

impl VariableDefinition {
    #[allow(clippy::float_cmp)]
    fn matches(&self, domain: Domain, lower: f64, upper: f64) -> bool {
        self.domain == domain && self.lower == lower && self.upper == upper
    }
}

/// Indicates that a variable was declared twice with incompatible domains or bounds.
///
/// This can only result from a defect in the formulation logic.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictingDeclarationError {
    /// The definition already in the registry
    pub existing: VariableDefinition,
    /// The conflicting definition
    pub requested: VariableDefinition,
}

impl fmt::Display for ConflictingDeclarationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let existing = &self.existing;
        let requested = &self.requested;
        write!(
            f,
            "Variable {} is already declared as {} in [{}, {}] and cannot be redeclared as {} \
            in [{}, {}]",
            existing.key,
            existing.domain,
            existing.lower,
            existing.upper,
            requested.domain,
            requested.lower,
            requested.upper
        )
    }
}

impl Error for ConflictingDeclarationError {}

/// All decision variables in a problem, in declaration order.
///
/// A variable's handle is its position in the registry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableRegistry {
    definitions: IndexMap<VariableKey, VariableDefinition>,
}

impl VariableRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable, or look it up if it has already been declared.
    ///
    /// # Arguments
    ///
    /// * `key` - Name and index of the variable
    /// * `domain` - The variable's domain
    /// * `lower` - Lower bound (`f64::NEG_INFINITY` for none)
    /// * `upper` - Upper bound (`f64::INFINITY` for none)
    ///
    /// # Returns
    ///
    /// The handle for the variable, or an error if it was previously declared with a different
    /// domain or bounds.
    pub fn declare(
        &mut self,
        key: VariableKey,
        domain: Domain,
        lower: f64,
        upper: f64,
    ) -> Result<Variable, ConflictingDeclarationError> {
        assert!(
            lower <= upper,
            "Invalid bounds for variable {key}: [{lower}, {upper}]"
        );
        match domain {
            Domain::NonNegative => {
                assert!(lower >= 0.0, "Negative lower bound for variable {key}");
            }
            Domain::Binary => assert!(
                lower >= 0.0 && upper <= 1.0,
                "Binary variable {key} has bounds outside [0, 1]"
            ),
            Domain::Free => {}
        }

        if let Some((index, _, existing)) = self.definitions.get_full(&key) {
            if existing.matches(domain, lower, upper) {
                return Ok(Variable(index));
            }

            return Err(ConflictingDeclarationError {
                existing: existing.clone(),
                requested: VariableDefinition {
                    key,
                    domain,
                    lower,
                    upper,
                },
            });
        }

        let definition = VariableDefinition {
            key: key.clone(),
            domain,
            lower,
            upper,
        };
        let (index, _) = self.definitions.insert_full(key, definition);
        Ok(Variable(index))
    }

    /// Declare a binary variable
    pub fn declare_binary(
        &mut self,
        key: VariableKey,
    ) -> Result<Variable, ConflictingDeclarationError> {
        self.declare(key, Domain::Binary, 0.0, 1.0)
    }

    /// Look up a previously declared variable
    pub fn get(&self, key: &VariableKey) -> Option<Variable> {
        self.definitions.get_index_of(key).map(Variable)
    }

    /// The definition of a variable
    pub fn definition(&self, var: Variable) -> &VariableDefinition {
        &self.definitions[var.0]
    }

    /// Number of declared variables
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no variables have been declared
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterate over variables and their definitions in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Variable, &VariableDefinition)> {
        self.definitions
            .values()
            .enumerate()
            .map(|(index, definition)| (Variable(index), definition))
    }

    /// Number of variables with the given domain
    pub fn count_with_domain(&self, domain: Domain) -> usize {
        self.definitions
            .values()
            .filter(|definition| definition.domain == domain)
            .count()
    }
}
