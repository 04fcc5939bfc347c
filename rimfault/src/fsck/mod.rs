// SPDX-License-Identifier: MIT

//! Mount-time check pass: repair negotiation and the pass driver.

mod code;
mod mode;
mod negotiate;
mod pass;
mod policy;

pub use code::{FsckAbort, FsckCode, FsckResult};
pub use mode::{FixMode, Fixability};
pub use negotiate::{NegotiationSnapshot, NegotiationStats, Negotiator, Outcome, Verdict, verdict};
pub use pass::{FnCheck, FsckCheck, FsckOptions, FsckPass, FsckPhases, FsckReport, check_fn};
pub use policy::RepairPolicy;
