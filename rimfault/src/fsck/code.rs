// SPDX-License-Identifier: MIT

use core::fmt;

/// Check-pass result handed to the mount driver.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FsckCode {
    #[default]
    Ok = 0,
    ErrorsNotFixed = 1,
    RepairUnimplemented = 2,
    RepairImpossible = 3,
    UnknownVersion = 4,
}

impl FsckCode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FsckCode::Ok),
            1 => Some(FsckCode::ErrorsNotFixed),
            2 => Some(FsckCode::RepairUnimplemented),
            3 => Some(FsckCode::RepairImpossible),
            4 => Some(FsckCode::UnknownVersion),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, FsckCode::Ok)
    }

    /// Process exit status for tools driving a pass.
    pub fn exit_code(&self) -> i32 {
        *self as u8 as i32
    }

    pub fn msg(&self) -> &'static str {
        match self {
            FsckCode::Ok => "no errors",
            FsckCode::ErrorsNotFixed => "errors not fixed",
            FsckCode::RepairUnimplemented => "repair unimplemented",
            FsckCode::RepairImpossible => "repair impossible",
            FsckCode::UnknownVersion => "unknown on-disk version",
        }
    }
}

impl fmt::Display for FsckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg())
    }
}

/// Stops the current check pass. Carries a non-`Ok` code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FsckAbort {
    code: FsckCode,
}

impl FsckAbort {
    pub const fn errors_not_fixed() -> Self {
        Self {
            code: FsckCode::ErrorsNotFixed,
        }
    }

    /// `FsckCode::Ok` is not an abort; it is mapped to `ErrorsNotFixed`.
    pub const fn with_code(code: FsckCode) -> Self {
        let code = match code {
            FsckCode::Ok => FsckCode::ErrorsNotFixed,
            c => c,
        };
        Self { code }
    }

    pub const fn code(&self) -> FsckCode {
        self.code
    }
}

impl From<FsckCode> for FsckAbort {
    fn from(code: FsckCode) -> Self {
        Self::with_code(code)
    }
}

impl fmt::Display for FsckAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fsck halted: {}", self.code)
    }
}

impl std::error::Error for FsckAbort {}

pub type FsckResult<T = ()> = Result<T, FsckAbort>;
