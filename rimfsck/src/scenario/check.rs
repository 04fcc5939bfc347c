// SPDX-License-Identifier: MIT

use rimfault::prelude::*;

use crate::scenario::error::ScenarioError;
use crate::scenario::scenario::CheckEntry;

pub fn parse_code(name: &str) -> Result<FsckCode, ScenarioError> {
    match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "errors-not-fixed" => Ok(FsckCode::ErrorsNotFixed),
        "repair-unimplemented" => Ok(FsckCode::RepairUnimplemented),
        "repair-impossible" => Ok(FsckCode::RepairImpossible),
        "unknown-version" => Ok(FsckCode::UnknownVersion),
        _ => Err(ScenarioError::UnknownCode(name.to_string())),
    }
}

#[derive(Clone, Debug)]
pub struct ScenarioIssue {
    pub mode: FixMode,
    pub message: String,
    pub present: bool,
}

/// Check replaying a fixed list of issues through the negotiator.
#[derive(Clone, Debug)]
pub struct ScenarioCheck {
    name: String,
    phase: FsckPhases,
    issues: Vec<ScenarioIssue>,
    fail: Option<FsckCode>,
    repaired: Vec<String>,
}

impl ScenarioCheck {
    pub fn from_entry(entry: &CheckEntry) -> anyhow::Result<Self> {
        let phase = FsckPhases::by_name(&entry.phase)
            .ok_or_else(|| ScenarioError::UnknownPhase(entry.phase.clone()))?;
        let issues = entry
            .issues
            .iter()
            .map(|i| -> anyhow::Result<ScenarioIssue> {
                Ok(ScenarioIssue {
                    mode: i.mode.parse()?,
                    message: i.message.clone(),
                    present: i.present,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let fail = entry.fail.as_deref().map(parse_code).transpose()?;

        Ok(Self {
            name: entry.name.clone(),
            phase,
            issues,
            fail,
            repaired: Vec::new(),
        })
    }

    /// Issues the operator or policy agreed to repair.
    pub fn repaired(&self) -> &[String] {
        &self.repaired
    }
}

impl FsckCheck for ScenarioCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> FsckPhases {
        self.phase
    }

    fn run(&mut self, fsck: &Negotiator<'_>) -> FsckResult {
        for issue in &self.issues {
            if fsck.negotiate_mode(issue.present, issue.mode, &issue.message)? {
                crate::log_verbose!("{}: repaired '{}'", self.name, issue.message);
                self.repaired.push(issue.message.clone());
            }
        }
        match self.fail {
            Some(code) => Err(FsckAbort::with_code(code)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::scenario::IssueEntry;
    use std::sync::Arc;

    fn entry(fail: Option<&str>) -> CheckEntry {
        CheckEntry {
            name: "inodes".into(),
            phase: "inodes".into(),
            issues: vec![
                IssueEntry {
                    mode: "fix".into(),
                    message: "inode 42 i_size wrong".into(),
                    present: true,
                },
                IssueEntry {
                    mode: "unfixable".into(),
                    message: "inode 43 has unknown flags".into(),
                    present: true,
                },
            ],
            fail: fail.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code("unknown_version").unwrap(), FsckCode::UnknownVersion);
        assert_eq!(
            parse_code("Repair-Impossible").unwrap(),
            FsckCode::RepairImpossible
        );
        assert!(parse_code("ok").is_err());
    }

    #[test]
    fn test_replays_issues() {
        let sink = Arc::new(MemorySink::new());
        let fs = Filesystem::builder("pool0")
            .policy(RepairPolicy::Always)
            .sink(sink.clone())
            .build();
        let mut check = ScenarioCheck::from_entry(&entry(None)).unwrap();

        check.run(&fs.negotiator()).unwrap();
        assert_eq!(check.repaired(), ["inode 42 i_size wrong"]);
        assert!(sink.contains("inode 42 i_size wrong, fixing"));
        assert!(sink.contains("inode 43 has unknown flags (repair unimplemented)"));
    }

    #[test]
    fn test_fail_code_aborts() {
        let fs = Filesystem::builder("pool0")
            .sink(Arc::new(MemorySink::new()))
            .build();
        let mut checks: Vec<Box<dyn FsckCheck>> = vec![Box::new(
            ScenarioCheck::from_entry(&entry(Some("repair-impossible"))).unwrap(),
        )];

        let rep = FsckPass::new(&fs).run(&mut checks);
        assert_eq!(rep.code, FsckCode::RepairImpossible);
        assert_eq!(rep.halted_in.as_deref(), Some("inodes"));
    }
}
