// SPDX-License-Identifier: MIT

use core::fmt;
use core::str::FromStr;

use crate::core::errors::FaultError;

/// Operator choice for fixable inconsistencies. Fixed for the duration of a pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RepairPolicy {
    #[default]
    Never,
    Always,
    /// Ask the operator for each instance.
    Ask,
}

impl RepairPolicy {
    pub const ALL: [RepairPolicy; 3] = [RepairPolicy::Never, RepairPolicy::Always, RepairPolicy::Ask];

    pub fn as_str(&self) -> &'static str {
        match self {
            RepairPolicy::Never => "no",
            RepairPolicy::Always => "yes",
            RepairPolicy::Ask => "ask",
        }
    }
}

impl FromStr for RepairPolicy {
    type Err = FaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "no" | "n" | "never" | "false" => Ok(RepairPolicy::Never),
            "yes" | "y" | "always" | "true" => Ok(RepairPolicy::Always),
            "ask" => Ok(RepairPolicy::Ask),
            _ => Err(FaultError::InvalidPolicy),
        }
    }
}

impl fmt::Display for RepairPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
