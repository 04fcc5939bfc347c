// === Sub-modules ===
pub mod clock;
pub mod errors;
pub mod escalate;
pub mod macros;
pub mod options;
pub mod prompt;
pub mod ratelimit;
pub mod sink;
pub mod state;
pub mod taxonomy;
pub mod terminate;

// === Core Traits ===
pub mod traits {
    pub use super::clock::Clock;
    pub use super::prompt::Prompt;
    pub use super::sink::LogSink;
    pub use super::terminate::Terminator;
}

// === Error types ===
pub use errors::*;

// === Handles ===
pub use options::{ErrorAction, FaultOptions, RateLimitConfig};
pub use state::{DevFlags, Device, Filesystem, FilesystemBuilder, FsFlags, Scope};
pub use taxonomy::{Escalation, FaultClass};
