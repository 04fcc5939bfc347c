// SPDX-License-Identifier: MIT

use rimfault::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use crate::scenario::check::{ScenarioCheck, parse_code};
use crate::scenario::error::ScenarioError;

/// Replayable fault scenario: a filesystem, its devices, runtime fault reports and
/// the checks of one mount-time pass.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub policy: Option<String>,
    /// Reaction to inconsistencies: continue, ro or panic.
    #[serde(default)]
    pub errors: Option<String>,
    #[serde(default)]
    pub ratelimit: Option<RateLimitEntry>,
    #[serde(default, rename = "device")]
    pub devices: Vec<DeviceEntry>,
    #[serde(default, rename = "event")]
    pub events: Vec<EventEntry>,
    #[serde(default, rename = "check")]
    pub checks: Vec<CheckEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitEntry {
    pub interval_ms: u64,
    pub burst: u32,
}

#[derive(Debug, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    #[serde(default)]
    pub id: Option<Uuid>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Io,
    FatalIo,
    Inconsistent,
    Fatal,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Io => "io",
            EventKind::FatalIo => "fatal-io",
            EventKind::Inconsistent => "inconsistent",
            EventKind::Fatal => "fatal",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EventEntry {
    pub kind: EventKind,
    #[serde(default)]
    pub device: Option<String>,
    pub message: String,
    #[serde(default = "default_count")]
    pub count: u32,
}

#[derive(Debug, Deserialize)]
pub struct CheckEntry {
    pub name: String,
    pub phase: String,
    #[serde(default, rename = "issue")]
    pub issues: Vec<IssueEntry>,
    /// Result code the check fails with after its issues, e.g. "unknown-version".
    #[serde(default)]
    pub fail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueEntry {
    pub mode: String,
    pub message: String,
    #[serde(default = "default_present")]
    pub present: bool,
}

fn default_count() -> u32 {
    1
}

fn default_present() -> bool {
    true
}

impl Scenario {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut scenario: Scenario = toml::from_str(content)?;
        scenario.assign_ids();
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn assign_ids(&mut self) {
        for dev in &mut self.devices {
            if dev.id.is_none() {
                dev.id = Some(Uuid::new_v4());
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            return Err(ScenarioError::EmptyName("filesystem").into());
        }

        let mut seen = HashSet::new();
        for dev in &self.devices {
            if dev.name.trim().is_empty() {
                return Err(ScenarioError::EmptyName("device").into());
            }
            if !seen.insert(dev.name.as_str()) {
                return Err(ScenarioError::DuplicateDevice(dev.name.clone()).into());
            }
        }

        for ev in &self.events {
            match (&ev.device, ev.kind) {
                (Some(name), _) if !seen.contains(name.as_str()) => {
                    return Err(ScenarioError::UnknownDevice(name.clone()).into());
                }
                (None, EventKind::Io | EventKind::FatalIo) => {
                    return Err(ScenarioError::NeedsDevice(ev.kind.as_str()).into());
                }
                _ => {}
            }
        }

        for check in &self.checks {
            if check.name.trim().is_empty() {
                return Err(ScenarioError::EmptyName("check").into());
            }
            if FsckPhases::by_name(&check.phase).is_none() {
                return Err(ScenarioError::UnknownPhase(check.phase.clone()).into());
            }
            for issue in &check.issues {
                issue.mode.parse::<FixMode>()?;
            }
            if let Some(code) = &check.fail {
                parse_code(code)?;
            }
        }

        self.policy()?;
        self.error_action()?;
        Ok(())
    }

    pub fn policy(&self) -> anyhow::Result<Option<RepairPolicy>> {
        Ok(self.policy.as_deref().map(str::parse).transpose()?)
    }

    pub fn error_action(&self) -> anyhow::Result<ErrorAction> {
        Ok(self
            .errors
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default())
    }

    /// Mount options; `policy` from the command line wins over the scenario's.
    pub fn fault_options(&self, policy: Option<RepairPolicy>) -> anyhow::Result<FaultOptions> {
        let ratelimit = self
            .ratelimit
            .as_ref()
            .map(|r| RateLimitConfig::new(Duration::from_millis(r.interval_ms), r.burst))
            .unwrap_or_default();
        Ok(FaultOptions {
            fix_errors: policy.or(self.policy()?).unwrap_or_default(),
            errors: self.error_action()?,
            ratelimit,
        })
    }

    pub fn checks(&self) -> anyhow::Result<Vec<ScenarioCheck>> {
        self.checks.iter().map(ScenarioCheck::from_entry).collect()
    }

    pub fn print_summary(&self) {
        crate::log_info!("Scenario '{}'{}", self.name, self);
    }
}

impl core::fmt::Display for Scenario {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(
            f,
            "\n  ┌────┬──────────────────┬──────────────────────────────────────┬────────┐"
        )?;
        writeln!(
            f,
            "  | Id | Device           | UUID                                 | Events |"
        )?;
        writeln!(
            f,
            "  ├────┼──────────────────┼──────────────────────────────────────┼────────┤"
        )?;
        for (i, d) in self.devices.iter().enumerate() {
            let events: u32 = self
                .events
                .iter()
                .filter(|e| e.device.as_deref() == Some(d.name.as_str()))
                .map(|e| e.count)
                .sum();
            writeln!(
                f,
                "  | {i:<2} | {n:<16} | {id:<36} | {events:>6} |",
                n = d.name.chars().take(16).collect::<String>(),
                id = d.id.map(|u| u.to_string()).unwrap_or_default(),
            )?;
        }
        writeln!(
            f,
            "  └────┴──────────────────┴──────────────────────────────────────┴────────┘"
        )?;
        write!(f, "  {} checks", self.checks.len())
    }
}
