// SPDX-License-Identifier: MIT

use core::fmt;

#[derive(Debug)]
pub enum ScenarioError {
    UnknownDevice(String),
    DuplicateDevice(String),
    UnknownPhase(String),
    UnknownCode(String),
    EmptyName(&'static str),
    NeedsDevice(&'static str),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::UnknownDevice(name) => write!(f, "Unknown device '{name}'"),
            ScenarioError::DuplicateDevice(name) => write!(f, "Device '{name}' declared twice"),
            ScenarioError::UnknownPhase(name) => write!(f, "Unknown fsck phase '{name}'"),
            ScenarioError::UnknownCode(code) => write!(f, "Unknown fsck result '{code}'"),
            ScenarioError::EmptyName(what) => write!(f, "{what} needs a name"),
            ScenarioError::NeedsDevice(kind) => write!(f, "'{kind}' events need a device"),
        }
    }
}

impl std::error::Error for ScenarioError {}
