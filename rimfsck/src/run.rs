// SPDX-License-Identifier: MIT

use anyhow::bail;
use rimfault::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::scenario::{EventKind, EventEntry, Scenario};

pub struct RunSettings {
    /// Overrides the scenario's repair policy.
    pub policy: Option<RepairPolicy>,
    pub phases: FsckPhases,
    pub sink: Arc<dyn LogSink>,
    /// `None` picks stdin under `ask` and a refusing prompt otherwise.
    pub prompt: Option<Arc<dyn Prompt>>,
}

#[derive(Debug)]
pub struct DeviceStatus {
    pub name: String,
    pub io_errors: u64,
    pub flags: DevFlags,
}

#[derive(Debug)]
pub struct RunSummary {
    pub report: FsckReport,
    pub flags: FsFlags,
    pub devices: Vec<DeviceStatus>,
    /// Issues the checks agreed to repair, in pass order.
    pub repaired: Vec<String>,
}

impl RunSummary {
    pub fn exit_code(&self) -> i32 {
        self.report.code.exit_code()
    }

    pub fn print(&self) {
        crate::log_info!("{}", self.report);
        crate::log_info!(
            "Filesystem: inconsistent={} read-only={}",
            self.flags.contains(FsFlags::INCONSISTENT),
            self.flags.contains(FsFlags::FATAL)
        );
        for issue in &self.repaired {
            crate::log_verbose!("  repaired: {issue}");
        }
        for d in &self.devices {
            crate::log_info!(
                "  {:<16} io_errors={:<6} degraded={} fatal={}",
                d.name,
                d.io_errors,
                d.flags.contains(DevFlags::DEGRADED),
                d.flags.contains(DevFlags::FATAL)
            );
        }
    }
}

fn replay(fs: &Filesystem, devices: &HashMap<&str, Arc<Device>>, ev: &EventEntry) -> anyhow::Result<()> {
    let dev = match ev.device.as_deref() {
        Some(name) => match devices.get(name) {
            Some(dev) => Some(dev),
            None => bail!("Unknown device '{name}'"),
        },
        None => None,
    };

    crate::log_verbose!("Replaying {} x{} '{}'", ev.kind.as_str(), ev.count, ev.message);
    for _ in 0..ev.count {
        match (ev.kind, dev) {
            (EventKind::Io, Some(dev)) => dev.report_nonfatal_io(&ev.message),
            (EventKind::FatalIo, Some(dev)) => dev.report_fatal_io(&ev.message),
            (EventKind::Io | EventKind::FatalIo, None) => {
                bail!("'{}' events need a device", ev.kind.as_str())
            }
            (EventKind::Inconsistent, Some(dev)) => dev.report_inconsistent(&ev.message),
            (EventKind::Inconsistent, None) => fs.report_inconsistent(&ev.message),
            (EventKind::Fatal, Some(dev)) => dev.report_fatal(&ev.message),
            (EventKind::Fatal, None) => fs.report_fatal(&ev.message),
        }
    }
    Ok(())
}

/// Carries out the mount's `errors=` choice once the filesystem is inconsistent.
pub fn apply_error_action(fs: &Filesystem) -> anyhow::Result<()> {
    if !fs.is_inconsistent() {
        return Ok(());
    }
    match fs.on_inconsistency() {
        ErrorAction::Continue => Ok(()),
        ErrorAction::ReadOnly => {
            if !fs.is_read_only() {
                fs.report_fatal("inconsistency detected, going read-only");
            }
            Ok(())
        }
        ErrorAction::Panic => bail!("{}: filesystem inconsistent (errors=panic)", fs.name()),
    }
}

/// Replays the scenario's runtime reports, then runs its check pass.
pub fn run_scenario(scenario: &Scenario, settings: RunSettings) -> anyhow::Result<RunSummary> {
    let opts = scenario.fault_options(settings.policy)?;
    let prompt: Arc<dyn Prompt> = match settings.prompt {
        Some(p) => p,
        None if opts.fix_errors == RepairPolicy::Ask => Arc::new(StdinPrompt::stdin()),
        None => Arc::new(AutoPrompt::new(false)),
    };

    let fs = Filesystem::builder(scenario.name.as_str())
        .options(opts)
        .sink(settings.sink)
        .prompt(prompt)
        .build();

    let devices: HashMap<&str, Arc<Device>> = scenario
        .devices
        .iter()
        .map(|d| (d.name.as_str(), fs.attach(d.name.as_str())))
        .collect();

    for ev in &scenario.events {
        replay(&fs, &devices, ev)?;
    }
    apply_error_action(&fs)?;

    let mut owned = scenario.checks()?;
    let mut checks: Vec<Box<dyn FsckCheck + '_>> = owned
        .iter_mut()
        .map(|c| Box::new(c) as Box<dyn FsckCheck + '_>)
        .collect();
    let pass = FsckPass::with_options(
        &fs,
        FsckOptions {
            phases: settings.phases,
            policy: None,
        },
    );
    let report = pass.run(&mut checks);
    drop(checks);
    let repaired = owned
        .iter()
        .flat_map(|c| c.repaired().iter().cloned())
        .collect();

    let devices = scenario
        .devices
        .iter()
        .filter_map(|d| devices.get(d.name.as_str()))
        .map(|d| DeviceStatus {
            name: d.name().to_string(),
            io_errors: d.io_errors(),
            flags: d.flags(),
        })
        .collect();

    Ok(RunSummary {
        report,
        flags: fs.flags(),
        devices,
        repaired,
    })
}
