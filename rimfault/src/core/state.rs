// SPDX-License-Identifier: MIT

//! Filesystem and device handles with their sticky fault flags.
//!
//! Flags only ever get set during a session. Setting is a single atomic `fetch_or`,
//! so concurrent reporters race freely and end up in the same state.

use bitflags::bitflags;
use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::core::clock::{Clock, MonotonicClock};
use crate::core::options::{ErrorAction, FaultOptions, RateLimitConfig};
use crate::core::prompt::{AutoPrompt, Prompt};
use crate::core::ratelimit::RateLimiter;
use crate::core::sink::{Level, LogCrateSink, LogSink, Record};
use crate::core::terminate::{AbortTerminator, Terminator};
use crate::fsck::{Negotiator, RepairPolicy};

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct FsFlags: u32 {
        const INCONSISTENT      = 1 << 0;
        const FATAL             = 1 << 1;
        const FSCK_FIXED_ERRORS = 1 << 2;
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct DevFlags: u32 {
        const DEGRADED = 1 << 0;
        const FATAL    = 1 << 1;
    }
}

/// Set-only atomic flag word.
#[derive(Debug, Default)]
struct FlagCell(AtomicU32);

impl FlagCell {
    /// Returns true if any of `bits` was not set before.
    #[inline]
    fn set(&self, bits: u32) -> bool {
        self.0.fetch_or(bits, Ordering::AcqRel) & bits != bits
    }

    #[inline]
    fn load(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }
}

/// Reporting scope: a whole filesystem or one of its devices.
#[derive(Clone, Copy)]
pub enum Scope<'a> {
    Fs(&'a Filesystem),
    Dev(&'a Device),
}

impl<'a> Scope<'a> {
    /// Owning filesystem.
    pub fn fs(&self) -> &'a Filesystem {
        match self {
            Scope::Fs(fs) => fs,
            Scope::Dev(dev) => dev.fs(),
        }
    }

    pub fn device(&self) -> Option<&'a Device> {
        match self {
            Scope::Fs(_) => None,
            Scope::Dev(dev) => Some(dev),
        }
    }

    /// Sends `msg` to the filesystem's sink, prefixed by this scope.
    pub fn emit(&self, level: Level, msg: impl Into<String>) {
        let record = Record::new(level, self.to_string(), msg);
        self.fs().sink.emit(&record);
    }
}

impl fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Fs(fs) => write!(f, "{}", fs.name),
            Scope::Dev(dev) => write!(f, "{} ({})", dev.fs.name, dev.name),
        }
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({self})")
    }
}

/// Mounted filesystem as seen by the fault layer.
///
/// Owns the filesystem-scoped flags and the collaborators every report goes through.
/// Lives for one mount session; a new mount builds a new handle.
pub struct Filesystem {
    name: String,
    opts: FaultOptions,
    flags: FlagCell,
    next_dev: AtomicU32,
    sink: Arc<dyn LogSink>,
    prompt: Arc<dyn Prompt>,
    terminator: Arc<dyn Terminator>,
    clock: Arc<dyn Clock>,
}

impl Filesystem {
    pub fn builder(name: impl Into<String>) -> FilesystemBuilder {
        FilesystemBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &FaultOptions {
        &self.opts
    }

    /// The "on inconsistency" switch. Callers of `report_inconsistent` act on it.
    pub fn on_inconsistency(&self) -> ErrorAction {
        self.opts.errors
    }

    pub fn repair_policy(&self) -> RepairPolicy {
        self.opts.fix_errors
    }

    pub fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    pub fn prompt(&self) -> &dyn Prompt {
        self.prompt.as_ref()
    }

    pub fn terminator(&self) -> &dyn Terminator {
        self.terminator.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn scope(&self) -> Scope<'_> {
        Scope::Fs(self)
    }

    /// Attaches a new device to this filesystem.
    pub fn attach(self: &Arc<Self>, name: impl Into<String>) -> Arc<Device> {
        let idx = self.next_dev.fetch_add(1, Ordering::Relaxed);
        Arc::new(Device {
            fs: Arc::clone(self),
            idx,
            name: name.into(),
            flags: FlagCell::default(),
            io_errors: AtomicU64::new(0),
            limiter: RateLimiter::new(self.opts.ratelimit),
        })
    }

    /// Repair negotiator using the mount's repair policy.
    pub fn negotiator(&self) -> Negotiator<'_> {
        Negotiator::new(self, self.opts.fix_errors)
    }

    // --- flags ---

    pub fn flags(&self) -> FsFlags {
        FsFlags::from_bits_truncate(self.flags.load())
    }

    /// Returns true on the first call of the session.
    pub fn set_inconsistent(&self) -> bool {
        self.flags.set(FsFlags::INCONSISTENT.bits())
    }

    /// Returns true on the first call of the session.
    pub fn set_fatal(&self) -> bool {
        self.flags.set(FsFlags::FATAL.bits())
    }

    pub fn set_fixed_errors(&self) -> bool {
        self.flags.set(FsFlags::FSCK_FIXED_ERRORS.bits())
    }

    pub fn is_inconsistent(&self) -> bool {
        self.flags().contains(FsFlags::INCONSISTENT)
    }

    pub fn is_fatal(&self) -> bool {
        self.flags().contains(FsFlags::FATAL)
    }

    /// A fatal filesystem refuses further writes.
    pub fn is_read_only(&self) -> bool {
        self.is_fatal()
    }

    pub fn fixed_errors(&self) -> bool {
        self.flags().contains(FsFlags::FSCK_FIXED_ERRORS)
    }
}

impl fmt::Debug for Filesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filesystem")
            .field("name", &self.name)
            .field("opts", &self.opts)
            .field("flags", &self.flags())
            .finish()
    }
}

/// A member device of a filesystem.
pub struct Device {
    fs: Arc<Filesystem>,
    idx: u32,
    name: String,
    flags: FlagCell,
    io_errors: AtomicU64,
    limiter: RateLimiter,
}

impl Device {
    pub fn fs(&self) -> &Filesystem {
        &self.fs
    }

    pub fn idx(&self) -> u32 {
        self.idx
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Scope<'_> {
        Scope::Dev(self)
    }

    pub fn ratelimiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn flags(&self) -> DevFlags {
        DevFlags::from_bits_truncate(self.flags.load())
    }

    /// Counts one IO error and marks the device degraded. Never throttled.
    pub fn record_io_error(&self) -> bool {
        self.io_errors.fetch_add(1, Ordering::Relaxed);
        self.flags.set(DevFlags::DEGRADED.bits())
    }

    pub fn set_degraded(&self) -> bool {
        self.flags.set(DevFlags::DEGRADED.bits())
    }

    pub fn set_fatal(&self) -> bool {
        self.flags.set((DevFlags::FATAL | DevFlags::DEGRADED).bits())
    }

    pub fn is_degraded(&self) -> bool {
        self.flags().contains(DevFlags::DEGRADED)
    }

    pub fn is_fatal(&self) -> bool {
        self.flags().contains(DevFlags::FATAL)
    }

    /// IO errors recorded during this attach session.
    pub fn io_errors(&self) -> u64 {
        self.io_errors.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("fs", &self.fs.name)
            .field("idx", &self.idx)
            .field("name", &self.name)
            .field("flags", &self.flags())
            .field("io_errors", &self.io_errors())
            .finish()
    }
}

pub struct FilesystemBuilder {
    name: String,
    opts: FaultOptions,
    sink: Option<Arc<dyn LogSink>>,
    prompt: Option<Arc<dyn Prompt>>,
    terminator: Option<Arc<dyn Terminator>>,
    clock: Option<Arc<dyn Clock>>,
}

impl FilesystemBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            opts: FaultOptions::default(),
            sink: None,
            prompt: None,
            terminator: None,
            clock: None,
        }
    }

    pub fn options(mut self, opts: FaultOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn policy(mut self, policy: RepairPolicy) -> Self {
        self.opts.fix_errors = policy;
        self
    }

    pub fn errors(mut self, action: ErrorAction) -> Self {
        self.opts.errors = action;
        self
    }

    pub fn ratelimit(mut self, cfg: RateLimitConfig) -> Self {
        self.opts.ratelimit = cfg;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn prompt(mut self, prompt: Arc<dyn Prompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn terminator(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.terminator = Some(terminator);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults: `log` sink, no-operator prompt answering no, abort on logic bugs.
    pub fn build(self) -> Arc<Filesystem> {
        Arc::new(Filesystem {
            name: self.name,
            opts: self.opts,
            flags: FlagCell::default(),
            next_dev: AtomicU32::new(0),
            sink: self.sink.unwrap_or_else(|| Arc::new(LogCrateSink)),
            prompt: self.prompt.unwrap_or_else(|| Arc::new(AutoPrompt::default())),
            terminator: self.terminator.unwrap_or_else(|| Arc::new(AbortTerminator)),
            clock: self.clock.unwrap_or_else(|| Arc::new(MonotonicClock::new())),
        })
    }
}
