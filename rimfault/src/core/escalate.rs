// SPDX-License-Identifier: MIT

//! Escalation actuator.
//!
//! One entry point per fault class. Each emits its message first, then applies the
//! class's side effect on the filesystem or device state. Nothing is returned: call
//! sites deep in the stack report and carry on, the state stores carry the outcome.

use core::fmt;
use core::panic::Location;

use crate::core::errors::{FaultError, FaultResult};
use crate::core::ratelimit::{CallSite, RateDecision};
use crate::core::sink::Level;
use crate::core::state::{Device, Filesystem, Scope};
use crate::core::taxonomy::{Escalation, FaultClass};

/// Emits `msg` and terminates through the filesystem's terminator.
pub fn logic_bug(scope: Scope<'_>, msg: &str) -> ! {
    scope.emit(Level::Error, msg);
    scope.fs().terminator().terminate(msg)
}

/// Emits `msg` and marks the owning filesystem inconsistent.
///
/// Does not stop the caller. Whether to go on is decided by the caller from
/// [`Filesystem::on_inconsistency`].
pub fn inconsistent(scope: Scope<'_>, msg: &str) {
    scope.emit(Level::Error, msg);
    if scope.fs().set_inconsistent() {
        log::debug!("{scope}: marked inconsistent");
    }
}

/// Emits `msg` and makes the filesystem unusable for writes.
///
/// A device scope marks the device fatal as well.
pub fn fatal(scope: Scope<'_>, msg: &str) {
    scope.emit(Level::Error, msg);
    if let Some(dev) = scope.device() {
        dev.set_fatal();
    }
    emergency_read_only(scope.fs());
}

/// Rate-limited non-fatal IO report. The device is degraded even when the message is dropped.
pub fn nonfatal_io(dev: &Device, site: CallSite, msg: &str) {
    emit_limited(dev, site, || format!("IO error on {} for {msg}", dev.name()));
    dev.record_io_error();
}

/// Rate-limited fatal IO report. Device and filesystem go fatal even when the message is dropped.
pub fn fatal_io(dev: &Device, site: CallSite, msg: &str) {
    emit_limited(dev, site, || {
        format!("fatal IO error on {} for {msg}", dev.name())
    });
    dev.record_io_error();
    dev.set_fatal();
    emergency_read_only(dev.fs());
}

/// Routes a classified fault to its actuation.
pub fn dispatch(class: FaultClass, scope: Scope<'_>, site: CallSite, msg: &str) -> FaultResult {
    match class.escalation() {
        Escalation::Terminate => logic_bug(scope, msg),
        Escalation::MarkInconsistent => inconsistent(scope, msg),
        Escalation::ForceReadOnly => fatal(scope, msg),
        Escalation::DegradeDevice => match scope.device() {
            Some(dev) => nonfatal_io(dev, site, msg),
            None => return Err(FaultError::NeedsDevice(class)),
        },
        Escalation::Negotiate => return Err(FaultError::NeedsNegotiation(class)),
    }
    Ok(())
}

fn emergency_read_only(fs: &Filesystem) {
    if fs.set_fatal() {
        fs.scope().emit(Level::Error, "emergency read only");
    }
}

fn emit_limited(dev: &Device, site: CallSite, render: impl FnOnce() -> String) {
    let scope = dev.scope();
    match dev.ratelimiter().check(site, dev.fs().clock().now()) {
        RateDecision::Emit { suppressed } => {
            if suppressed > 0 {
                scope.emit(Level::Warn, format!("{suppressed} reports suppressed"));
            }
            scope.emit(Level::Error, render());
        }
        RateDecision::Suppress => {
            log::trace!("{scope}: report from {}:{} throttled", site.file(), site.line());
        }
    }
}

/// Reporting surface shared by filesystems and devices.
pub trait Reporter {
    fn scope(&self) -> Scope<'_>;

    fn report_logic_bug(&self, msg: impl fmt::Display) -> ! {
        logic_bug(self.scope(), &msg.to_string())
    }

    fn report_inconsistent(&self, msg: impl fmt::Display) {
        inconsistent(self.scope(), &msg.to_string())
    }

    fn report_fatal(&self, msg: impl fmt::Display) {
        fatal(self.scope(), &msg.to_string())
    }

    #[track_caller]
    fn report(&self, class: FaultClass, msg: impl fmt::Display) -> FaultResult {
        let site = Location::caller();
        dispatch(class, self.scope(), site, &msg.to_string())
    }

    fn inconsistent_on(&self, cond: bool, msg: impl fmt::Display) -> bool {
        if cond {
            self.report_inconsistent(msg);
        }
        cond
    }

    fn fatal_on(&self, cond: bool, msg: impl fmt::Display) -> bool {
        if cond {
            self.report_fatal(msg);
        }
        cond
    }
}

impl Reporter for Filesystem {
    fn scope(&self) -> Scope<'_> {
        Scope::Fs(self)
    }
}

impl Reporter for Device {
    fn scope(&self) -> Scope<'_> {
        Scope::Dev(self)
    }
}

impl Device {
    /// Non-fatal IO error. The caller's location is the rate-limit key.
    #[track_caller]
    pub fn report_nonfatal_io(&self, msg: impl fmt::Display) {
        nonfatal_io(self, Location::caller(), &msg.to_string())
    }

    #[track_caller]
    pub fn report_fatal_io(&self, msg: impl fmt::Display) {
        fatal_io(self, Location::caller(), &msg.to_string())
    }

    #[track_caller]
    pub fn nonfatal_io_on(&self, cond: bool, msg: impl fmt::Display) -> bool {
        if cond {
            nonfatal_io(self, Location::caller(), &msg.to_string());
        }
        cond
    }
}
