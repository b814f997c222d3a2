//! Rescue categories offered by the dashboard's filter control, and their
//! translation into store predicates.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{query::RESCUE_TYPE_FIELD, Error, Predicate};

/// The closed set of filter options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    WaterRescue,
    MountainOrWildernessRescue,
    DisasterOrIndividualTracking,
    /// The reset option, showing every record.
    All,
}

impl Category {
    /// Every option, in the order the filter control presents them.
    pub const ALL: [Category; 4] = [
        Self::WaterRescue,
        Self::MountainOrWildernessRescue,
        Self::DisasterOrIndividualTracking,
        Self::All,
    ];

    /// The value the filter control emits for this option. Rescue categories
    /// are stored verbatim under this value.
    pub fn value(&self) -> &'static str {
        match self {
            Self::WaterRescue => "Water Rescue",
            Self::MountainOrWildernessRescue => "Mountain or Wilderness Rescue",
            Self::DisasterOrIndividualTracking => "Disaster or Individual Tracking",
            Self::All => "All",
        }
    }

    /// The human-readable label for this option.
    pub fn label(&self) -> &'static str {
        match self {
            Self::WaterRescue => "Water Rescue",
            Self::MountainOrWildernessRescue => "Mountain/Wilderness Rescue",
            Self::DisasterOrIndividualTracking => "Disaster/Tracking",
            Self::All => "Reset",
        }
    }

    /// The predicate selecting the records for this option.
    pub fn resolve(self) -> Predicate {
        match self {
            Self::All => Predicate::all(),
            other => Predicate::all().with(RESCUE_TYPE_FIELD, other.value()),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::All
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Parses the exact value emitted by the filter control. Matching is
/// case-sensitive and performs no normalization.
impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.value() == s)
            .ok_or_else(|| Error::InvalidCategory(s.to_string()))
    }
}

/// Resolve a selected filter value straight into a predicate.
pub fn resolve(selected: &str) -> Result<Predicate, Error> {
    Ok(Category::from_str(selected)?.resolve())
}
