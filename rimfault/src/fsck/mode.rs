// SPDX-License-Identifier: MIT

use core::fmt;
use core::str::FromStr;

use crate::core::errors::FaultError;

/// Fixability of one detected inconsistency.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fixability {
    /// A repair exists for this inconsistency.
    pub fixable: bool,
    /// The pass may go on if this instance stays unfixed.
    pub ignorable: bool,
    /// Appended to the message when the repair is skipped for lack of one.
    pub reason: &'static str,
}

impl Fixability {
    pub const fn new(fixable: bool, ignorable: bool, reason: &'static str) -> Self {
        Self {
            fixable,
            ignorable,
            reason,
        }
    }
}

/// The four negotiation modes call sites pick from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FixMode {
    /// No repair implemented, safe to leave.
    Unfixable,
    /// No repair at mount time, a later full fsck run corrects it.
    NeedFsck,
    /// Repair exists and leaving it is not safe.
    MustFix,
    /// Repair exists, leaving it is safe.
    Fix,
}

impl FixMode {
    pub const ALL: [FixMode; 4] = [
        FixMode::Unfixable,
        FixMode::NeedFsck,
        FixMode::MustFix,
        FixMode::Fix,
    ];

    pub const fn fixability(self) -> Fixability {
        match self {
            FixMode::Unfixable => Fixability::new(false, true, "repair unimplemented"),
            FixMode::NeedFsck => Fixability::new(false, true, "run fsck to correct"),
            FixMode::MustFix => Fixability::new(true, false, "not fixing"),
            FixMode::Fix => Fixability::new(true, true, "not fixing"),
        }
    }

    pub const fn fixable(self) -> bool {
        self.fixability().fixable
    }

    pub const fn ignorable(self) -> bool {
        self.fixability().ignorable
    }

    pub const fn reason(self) -> &'static str {
        self.fixability().reason
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FixMode::Unfixable => "unfixable",
            FixMode::NeedFsck => "need-fsck",
            FixMode::MustFix => "must-fix",
            FixMode::Fix => "fix",
        }
    }
}

impl From<FixMode> for Fixability {
    fn from(mode: FixMode) -> Self {
        mode.fixability()
    }
}

impl FromStr for FixMode {
    type Err = FaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "unfixable" => Ok(FixMode::Unfixable),
            "need-fsck" => Ok(FixMode::NeedFsck),
            "must-fix" | "mustfix" => Ok(FixMode::MustFix),
            "fix" => Ok(FixMode::Fix),
            _ => Err(FaultError::InvalidMode),
        }
    }
}

impl fmt::Display for FixMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_table() {
        let table: Vec<_> = FixMode::ALL
            .iter()
            .map(|m| (m.fixable(), m.ignorable(), m.reason()))
            .collect();
        assert_eq!(
            table,
            vec![
                (false, true, "repair unimplemented"),
                (false, true, "run fsck to correct"),
                (true, false, "not fixing"),
                (true, true, "not fixing"),
            ]
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("need_fsck".parse(), Ok(FixMode::NeedFsck));
        assert_eq!("MUST-FIX".parse(), Ok(FixMode::MustFix));
        assert_eq!("repair".parse::<FixMode>(), Err(FaultError::InvalidMode));
    }
}
