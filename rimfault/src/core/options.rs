// SPDX-License-Identifier: MIT

use core::fmt;
use core::str::FromStr;
use std::time::Duration;

use crate::core::errors::FaultError;
use crate::fsck::RepairPolicy;

/// What callers of `report_inconsistent` should do once the filesystem is inconsistent.
///
/// The actuator only records the inconsistency. Acting on this switch is the
/// caller's job, see [`crate::Filesystem::on_inconsistency`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ErrorAction {
    #[default]
    Continue,
    ReadOnly,
    Panic,
}

impl ErrorAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorAction::Continue => "continue",
            ErrorAction::ReadOnly => "ro",
            ErrorAction::Panic => "panic",
        }
    }
}

impl FromStr for ErrorAction {
    type Err = FaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(ErrorAction::Continue),
            "ro" | "read-only" | "remount-ro" => Ok(ErrorAction::ReadOnly),
            "panic" => Ok(ErrorAction::Panic),
            _ => Err(FaultError::InvalidErrorAction),
        }
    }
}

impl fmt::Display for ErrorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per call-site throttling of rate-limited reports.
///
/// At most `burst` messages per `interval`; an interval of zero disables throttling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub interval: Duration,
    pub burst: u32,
}

impl RateLimitConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_BURST: u32 = 10;

    pub const fn new(interval: Duration, burst: u32) -> Self {
        Self { interval, burst }
    }

    pub const fn unlimited() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    pub const fn is_unlimited(&self) -> bool {
        self.interval.is_zero()
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_BURST)
    }
}

/// Mount-time options consumed by the fault layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaultOptions {
    /// Repair policy for the check pass.
    pub fix_errors: RepairPolicy,
    /// Reaction to inconsistencies, read by callers.
    pub errors: ErrorAction,
    pub ratelimit: RateLimitConfig,
}
