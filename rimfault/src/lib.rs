// SPDX-License-Identifier: MIT

// Core Modules
pub mod core;
pub mod fsck;

// Reusable types and traits
pub use core::traits::*;
pub use core::*;

/// Everything a fault-reporting call site usually needs.
pub mod prelude {
    pub use crate::core::clock::{Clock, ManualClock, MonotonicClock};
    pub use crate::core::errors::*;
    pub use crate::core::escalate::Reporter;
    pub use crate::core::options::{ErrorAction, FaultOptions, RateLimitConfig};
    pub use crate::core::prompt::{AutoPrompt, Prompt, ScriptedPrompt, StdinPrompt};
    pub use crate::core::sink::{Level, LogCrateSink, LogSink, MemorySink, Record};
    pub use crate::core::state::{DevFlags, Device, Filesystem, FilesystemBuilder, FsFlags, Scope};
    pub use crate::core::taxonomy::{Escalation, FaultClass};
    pub use crate::core::terminate::{AbortTerminator, PanicTerminator, Terminator};
    pub use crate::fsck::*;
}
