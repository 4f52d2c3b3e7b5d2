//! How the size of a technology is determined.
use crate::units::Capacity;

/// The capacity of a converter or storage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapacitySpec {
    /// The capacity is given
    Fixed(Capacity),
    /// The capacity is a decision variable, optionally with an upper limit
    Optimised {
        /// Largest capacity that may be installed
        max: Option<Capacity>,
    },
}

impl CapacitySpec {
    /// Build from the optional `capacity` and `max_capacity` input fields.
    ///
    /// A fixed capacity takes precedence; the input readers reject records with both.
    pub fn from_fields(capacity: Option<Capacity>, max_capacity: Option<Capacity>) -> Self {
        match capacity {
            Some(capacity) => Self::Fixed(capacity),
            None => Self::Optimised { max: max_capacity },
        }
    }

    /// The largest capacity the technology can have, if bounded
    pub fn max_capacity(&self) -> Option<Capacity> {
        match self {
            Self::Fixed(capacity) => Some(*capacity),
            Self::Optimised { max } => *max,
        }
    }

    /// Whether capacity is a decision variable
    pub fn is_optimised(&self) -> bool {
        matches!(self, Self::Optimised { .. })
    }
}
