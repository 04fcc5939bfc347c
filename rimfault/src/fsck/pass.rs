// SPDX-License-Identifier: MIT

use bitflags::bitflags;
use core::fmt;

use crate::core::state::Filesystem;
use crate::fsck::code::{FsckCode, FsckResult};
use crate::fsck::negotiate::{NegotiationSnapshot, Negotiator};
use crate::fsck::policy::RepairPolicy;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct FsckPhases: u32 {
        const ALLOC               = 1 << 0;
        const EXTENTS             = 1 << 1;
        const INODES              = 1 << 2;
        const DIRENTS             = 1 << 3;
        const XATTRS              = 1 << 4;
        const ROOT                = 1 << 5;
        const DIRECTORY_STRUCTURE = 1 << 6;
        const NLINKS              = 1 << 7;
        const ALL                 = u32::MAX;
    }
}

impl FsckPhases {
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "alloc" => Some(Self::ALLOC),
            "extents" => Some(Self::EXTENTS),
            "inodes" => Some(Self::INODES),
            "dirents" => Some(Self::DIRENTS),
            "xattrs" => Some(Self::XATTRS),
            "root" => Some(Self::ROOT),
            "directory_structure" => Some(Self::DIRECTORY_STRUCTURE),
            "nlinks" => Some(Self::NLINKS),
            "all" => Some(Self::ALL),
            _ => None,
        }
    }
}

/// One check of the mount-time pass.
///
/// Report every inconsistency through the negotiator and propagate its abort with `?`.
pub trait FsckCheck {
    fn name(&self) -> &str;

    fn phase(&self) -> FsckPhases;

    fn run(&mut self, fsck: &Negotiator<'_>) -> FsckResult;
}

/// Lets a driver run checks it still owns and inspect them after the pass.
impl<C: FsckCheck + ?Sized> FsckCheck for &mut C {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn phase(&self) -> FsckPhases {
        (**self).phase()
    }

    fn run(&mut self, fsck: &Negotiator<'_>) -> FsckResult {
        (**self).run(fsck)
    }
}

/// Closure-backed [`FsckCheck`].
pub struct FnCheck<F> {
    name: String,
    phase: FsckPhases,
    f: F,
}

pub fn check_fn<F>(name: impl Into<String>, phase: FsckPhases, f: F) -> FnCheck<F>
where
    F: FnMut(&Negotiator<'_>) -> FsckResult,
{
    FnCheck {
        name: name.into(),
        phase,
        f,
    }
}

impl<F> FsckCheck for FnCheck<F>
where
    F: FnMut(&Negotiator<'_>) -> FsckResult,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> FsckPhases {
        self.phase
    }

    fn run(&mut self, fsck: &Negotiator<'_>) -> FsckResult {
        (self.f)(fsck)
    }
}

#[derive(Clone, Debug)]
pub struct FsckOptions {
    pub phases: FsckPhases,
    /// Overrides the mount's repair policy for this pass.
    pub policy: Option<RepairPolicy>,
}

impl Default for FsckOptions {
    fn default() -> Self {
        Self {
            phases: FsckPhases::ALL,
            policy: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FsckReport {
    pub code: FsckCode,
    pub policy: RepairPolicy,
    /// Checks that ran to completion.
    pub ran: Vec<String>,
    /// Check that stopped the pass.
    pub halted_in: Option<String>,
    /// Checks never started because the pass stopped.
    pub not_run: Vec<String>,
    /// Checks whose phase was not selected.
    pub filtered: Vec<String>,
    pub stats: NegotiationSnapshot,
    pub fixed_errors: bool,
}

impl FsckReport {
    pub fn ok(&self) -> bool {
        self.code.is_ok()
    }
}

impl fmt::Display for FsckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "fsck ({}): {}", self.policy, self.code)?;
        writeln!(
            f,
            "  checks: ran={} not_run={} filtered={}",
            self.ran.len(),
            self.not_run.len(),
            self.filtered.len()
        )?;
        if let Some(name) = &self.halted_in {
            writeln!(f, "  halted in: {name}")?;
        }
        writeln!(
            f,
            "  issues: fixed={} skipped={} halted={} prompted={}",
            self.stats.fixed, self.stats.skipped, self.stats.halted, self.stats.prompted
        )?;
        write!(f, "  fixed errors: {}", if self.fixed_errors { "yes" } else { "no" })
    }
}

/// Mount-time check pass driver.
///
/// Runs checks in order and stops at the first abort; no later check runs.
pub struct FsckPass<'a> {
    fs: &'a Filesystem,
    opts: FsckOptions,
}

impl<'a> FsckPass<'a> {
    pub fn new(fs: &'a Filesystem) -> Self {
        Self::with_options(fs, FsckOptions::default())
    }

    pub fn with_options(fs: &'a Filesystem, opts: FsckOptions) -> Self {
        Self { fs, opts }
    }

    pub fn run(&self, checks: &mut [Box<dyn FsckCheck + '_>]) -> FsckReport {
        let policy = self.opts.policy.unwrap_or(self.fs.repair_policy());
        let fsck = Negotiator::new(self.fs, policy);
        let mut rep = FsckReport {
            policy,
            ..FsckReport::default()
        };

        for check in checks.iter_mut() {
            let name = check.name().to_string();
            if rep.halted_in.is_some() {
                rep.not_run.push(name);
                continue;
            }
            if !self.opts.phases.intersects(check.phase()) {
                rep.filtered.push(name);
                continue;
            }

            log::debug!("{}: fsck running {name}", self.fs.name());
            match check.run(&fsck) {
                Ok(()) => rep.ran.push(name),
                Err(abort) => {
                    rep.code = abort.code();
                    rep.halted_in = Some(name);
                }
            }
        }

        // a check may have dropped the abort instead of propagating it
        if fsck.is_halted() && rep.code.is_ok() {
            rep.code = FsckCode::ErrorsNotFixed;
        }

        rep.stats = fsck.stats();
        rep.fixed_errors = self.fs.fixed_errors();
        log::info!("{}: fsck pass finished: {}", self.fs.name(), rep.code);
        rep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::MemorySink;
    use crate::fsck::{FixMode, FsckAbort};
    use std::cell::Cell;
    use std::sync::Arc;

    fn fs(policy: RepairPolicy) -> Arc<Filesystem> {
        Filesystem::builder("pool0")
            .policy(policy)
            .sink(Arc::new(MemorySink::new()))
            .build()
    }

    #[test]
    fn test_clean_pass_is_ok() {
        let fs = fs(RepairPolicy::Never);
        let mut checks: Vec<Box<dyn FsckCheck>> = vec![
            Box::new(check_fn("alloc", FsckPhases::ALLOC, |f| {
                f.fix_on(false, "never")?;
                Ok(())
            })),
            Box::new(check_fn("inodes", FsckPhases::INODES, |_| Ok(()))),
        ];

        let rep = FsckPass::new(&fs).run(&mut checks);
        assert!(rep.ok());
        assert_eq!(rep.ran, vec!["alloc", "inodes"]);
        assert!(!rep.fixed_errors);
    }

    #[test]
    fn test_abort_skips_remaining_checks() {
        let fs = fs(RepairPolicy::Never);
        let later_ran = Cell::new(false);
        let mut checks: Vec<Box<dyn FsckCheck + '_>> = vec![
            Box::new(check_fn("dirents", FsckPhases::DIRENTS, |f| {
                f.negotiate_mode(true, FixMode::MustFix, "dirent hash mismatch")?;
                // unreachable once aborted
                f.fix_on(true, "second issue")?;
                Ok(())
            })),
            Box::new(check_fn("nlinks", FsckPhases::NLINKS, |_| {
                later_ran.set(true);
                Ok(())
            })),
        ];

        let rep = FsckPass::new(&fs).run(&mut checks);
        assert_eq!(rep.code, FsckCode::ErrorsNotFixed);
        assert_eq!(rep.halted_in.as_deref(), Some("dirents"));
        assert_eq!(rep.not_run, vec!["nlinks"]);
        assert!(rep.ran.is_empty());
        assert!(!later_ran.get());
        assert_eq!(rep.stats.halted, 1);
        assert_eq!(rep.stats.skipped, 0);
    }

    #[test]
    fn test_discarded_abort_still_fails_pass() {
        let fs = fs(RepairPolicy::Never);
        let mut checks: Vec<Box<dyn FsckCheck>> = vec![
            Box::new(check_fn("inodes", FsckPhases::INODES, |f| {
                let _ = f.must_fix_on(true, "root inode missing");
                Ok(())
            })),
            Box::new(check_fn("dirents", FsckPhases::DIRENTS, |f| {
                f.fix_on(true, "dirent hash mismatch")?;
                Ok(())
            })),
        ];

        let rep = FsckPass::new(&fs).run(&mut checks);
        assert_eq!(rep.code, FsckCode::ErrorsNotFixed);
        assert!(!rep.ok());
        assert_eq!(rep.halted_in.as_deref(), Some("dirents"));
        assert_eq!(rep.ran, vec!["inodes"]);
        assert_eq!(rep.stats.halted, 1);
        assert_eq!(rep.stats.skipped, 0);
    }

    #[test]
    fn test_check_specific_codes_propagate() {
        let fs = fs(RepairPolicy::Always);
        let mut checks: Vec<Box<dyn FsckCheck>> = vec![Box::new(check_fn(
            "root",
            FsckPhases::ROOT,
            |_| Err(FsckAbort::with_code(FsckCode::UnknownVersion)),
        ))];

        let rep = FsckPass::new(&fs).run(&mut checks);
        assert_eq!(rep.code, FsckCode::UnknownVersion);
        assert_eq!(rep.code.exit_code(), 4);
    }

    #[test]
    fn test_phase_filter_and_policy_override() {
        let fs = fs(RepairPolicy::Never);
        let mut checks: Vec<Box<dyn FsckCheck>> = vec![
            Box::new(check_fn("alloc", FsckPhases::ALLOC, |f| {
                f.fix_on(true, "bucket sector count wrong")?;
                Ok(())
            })),
            Box::new(check_fn("xattrs", FsckPhases::XATTRS, |f| {
                f.must_fix("xattr without inode")?;
                Ok(())
            })),
        ];

        let opts = FsckOptions {
            phases: FsckPhases::ALLOC,
            policy: Some(RepairPolicy::Always),
        };
        let rep = FsckPass::with_options(&fs, opts).run(&mut checks);

        assert!(rep.ok());
        assert_eq!(rep.policy, RepairPolicy::Always);
        assert_eq!(rep.filtered, vec!["xattrs"]);
        assert!(rep.fixed_errors);
        assert!(fs.fixed_errors());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(
            FsckPhases::by_name("directory-structure"),
            Some(FsckPhases::DIRECTORY_STRUCTURE)
        );
        assert_eq!(FsckPhases::by_name("Alloc"), Some(FsckPhases::ALLOC));
        assert_eq!(FsckPhases::by_name("journal"), None);
    }

    #[test]
    fn test_report_display() {
        let fs = fs(RepairPolicy::Always);
        let mut checks: Vec<Box<dyn FsckCheck>> = vec![Box::new(check_fn(
            "extents",
            FsckPhases::EXTENTS,
            |f| {
                f.fix_on(true, "extent overlaps")?;
                Ok(())
            },
        ))];
        let out = FsckPass::new(&fs).run(&mut checks).to_string();
        assert!(out.starts_with("fsck (yes): no errors"));
        assert!(out.contains("fixed=1"));
        assert!(out.ends_with("fixed errors: yes"));
    }
}
