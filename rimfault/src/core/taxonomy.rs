// SPDX-License-Identifier: MIT

//! Static fault classification.
//!
//! Every fault a call site can report falls into exactly one [`FaultClass`].
//! The class alone decides what the actuator does with it; nothing here holds state.

use core::fmt;

/// Severity class of a detected fault.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FaultClass {
    /// Running code violated one of its own invariants. Not caused by disk contents.
    LogicBug,
    /// On-disk metadata violates an invariant.
    Inconsistent,
    /// Inconsistency found by the mount-time check pass.
    FsckIssue,
    /// Metadata IO failed badly enough that writing further is unsafe.
    Fatal,
    /// Data IO failed on one device; tolerable with redundancy.
    NonFatalIO,
}

/// What the actuator does for a given class.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Escalation {
    /// Emit, then terminate the process.
    Terminate,
    /// Emit, then mark the filesystem inconsistent.
    MarkInconsistent,
    /// Handed to the fsck repair negotiator.
    Negotiate,
    /// Emit, then force the filesystem read-only.
    ForceReadOnly,
    /// Emit (rate limited), then mark the device degraded.
    DegradeDevice,
}

impl FaultClass {
    pub const ALL: [FaultClass; 5] = [
        FaultClass::LogicBug,
        FaultClass::Inconsistent,
        FaultClass::FsckIssue,
        FaultClass::Fatal,
        FaultClass::NonFatalIO,
    ];

    pub const fn escalation(self) -> Escalation {
        match self {
            FaultClass::LogicBug => Escalation::Terminate,
            FaultClass::Inconsistent => Escalation::MarkInconsistent,
            FaultClass::FsckIssue => Escalation::Negotiate,
            FaultClass::Fatal => Escalation::ForceReadOnly,
            FaultClass::NonFatalIO => Escalation::DegradeDevice,
        }
    }

    /// Only fsck issues go through a policy-driven fix decision.
    pub const fn needs_negotiation(self) -> bool {
        matches!(self.escalation(), Escalation::Negotiate)
    }

    /// Whether a report of this class is throttled per call site.
    pub const fn is_rate_limited(self) -> bool {
        matches!(self, FaultClass::NonFatalIO)
    }

    pub const fn name(self) -> &'static str {
        match self {
            FaultClass::LogicBug => "logic-bug",
            FaultClass::Inconsistent => "inconsistent",
            FaultClass::FsckIssue => "fsck",
            FaultClass::Fatal => "fatal",
            FaultClass::NonFatalIO => "io",
        }
    }

    pub const fn describe(self) -> &'static str {
        match self {
            FaultClass::LogicBug => "invariant violated by running code",
            FaultClass::Inconsistent => "on-disk metadata violates an invariant",
            FaultClass::FsckIssue => "inconsistency found during the check pass",
            FaultClass::Fatal => "metadata IO failure, forward progress unsafe",
            FaultClass::NonFatalIO => "data IO failure on a single device",
        }
    }
}

impl Escalation {
    pub const fn describe(self) -> &'static str {
        match self {
            Escalation::Terminate => "abort process",
            Escalation::MarkInconsistent => "mark filesystem inconsistent",
            Escalation::Negotiate => "resolved by repair negotiation",
            Escalation::ForceReadOnly => "force filesystem read-only",
            Escalation::DegradeDevice => "mark device degraded",
        }
    }
}

impl fmt::Display for FaultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_fsck_negotiates() {
        for class in FaultClass::ALL {
            assert_eq!(class.needs_negotiation(), class == FaultClass::FsckIssue);
        }
    }

    #[test]
    fn test_escalation_targets() {
        assert_eq!(FaultClass::LogicBug.escalation(), Escalation::Terminate);
        assert_eq!(
            FaultClass::Inconsistent.escalation(),
            Escalation::MarkInconsistent
        );
        assert_eq!(FaultClass::Fatal.escalation(), Escalation::ForceReadOnly);
        assert_eq!(FaultClass::NonFatalIO.escalation(), Escalation::DegradeDevice);
    }

    #[test]
    fn test_only_io_is_rate_limited() {
        let limited: Vec<_> = FaultClass::ALL
            .iter()
            .filter(|c| c.is_rate_limited())
            .collect();
        assert_eq!(limited, vec![&FaultClass::NonFatalIO]);
    }
}
