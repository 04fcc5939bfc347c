// SPDX-License-Identifier: MIT

use core::fmt;

use crate::core::taxonomy::FaultClass;

/// Errors raised by the fault layer itself (configuration parsing, misrouted reports).
///
/// Fault *outcomes* are never errors: an unfixed fsck issue surfaces as
/// [`crate::fsck::FsckAbort`], everything else as a side effect on the state stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultError {
    InvalidPolicy,
    InvalidErrorAction,
    InvalidMode,
    /// Fsck issues must go through the repair negotiator.
    NeedsNegotiation(FaultClass),
    /// Class can only be reported against a device.
    NeedsDevice(FaultClass),
    Other(&'static str),
}

impl FaultError {
    pub fn msg(&self) -> &'static str {
        match self {
            FaultError::InvalidPolicy => "Invalid repair policy (expected yes, no or ask)",
            FaultError::InvalidErrorAction => {
                "Invalid error action (expected continue, ro or panic)"
            }
            FaultError::InvalidMode => "Invalid fsck mode",
            FaultError::NeedsNegotiation(_) => "Fault class requires repair negotiation",
            FaultError::NeedsDevice(_) => "Fault class requires a device scope",
            FaultError::Other(msg) => msg,
        }
    }

    pub fn class(&self) -> Option<FaultClass> {
        match self {
            FaultError::NeedsNegotiation(c) | FaultError::NeedsDevice(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for FaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        if let Some(class) = self.class() {
            write!(f, " (class: {class})")?;
        }
        Ok(())
    }
}

impl std::error::Error for FaultError {}

// === type Fault*Result ===

pub type FaultResult<T = ()> = Result<T, FaultError>;

crate::fault_error_wiring! {
    str_into => [FaultError],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_class() {
        let e = FaultError::NeedsNegotiation(FaultClass::FsckIssue);
        assert_eq!(
            e.to_string(),
            "Fault class requires repair negotiation (class: fsck)"
        );
    }

    #[test]
    fn test_str_into_other() {
        let e: FaultError = "boom".into();
        assert_eq!(e, FaultError::Other("boom"));
        assert_eq!(e.to_string(), "boom");
    }
}
