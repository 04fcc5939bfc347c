// SPDX-License-Identifier: MIT

//! Fsck repair negotiation.
//!
//! Decision table, for a condition that actually occurred:
//!
//! | fixable | policy | emitted                | outcome              |
//! |---------|--------|------------------------|----------------------|
//! | no      | any    | `msg (reason)`         | not fixed            |
//! | yes     | always | `msg, fixing`          | fixed                |
//! | yes     | never  | `msg`                  | not fixed            |
//! | yes     | ask    | prompt `msg: fix?`     | fixed iff answer yes |
//!
//! Under `ask` the answer is logged as `msg, fixing` or `msg, not fixing`, so a
//! non-interactive prompt still leaves a record of the decision.
//!
//! A not-fixed outcome on a non-ignorable issue emits `Unable to continue, halting`
//! and returns [`FsckAbort`]. A fixed outcome sets the filesystem's fixed-errors flag.

use core::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::core::sink::Level;
use crate::core::state::Filesystem;
use crate::fsck::code::{FsckAbort, FsckResult};
use crate::fsck::mode::{FixMode, Fixability};
use crate::fsck::policy::RepairPolicy;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The condition did not occur.
    NoAction,
    Fixed,
    NotFixed,
}

impl Outcome {
    pub fn is_fixed(&self) -> bool {
        matches!(self, Outcome::Fixed)
    }
}

/// Pure decision for one occurred inconsistency.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Fix,
    /// Left unfixed, pass continues.
    Skip,
    /// Left unfixed, pass aborts.
    Halt,
}

/// Decides fix/skip/halt. `answer` is only consulted for a fixable issue under `Ask`.
pub fn verdict(fix: Fixability, policy: RepairPolicy, answer: impl FnOnce() -> bool) -> Verdict {
    let fixed = fix.fixable
        && match policy {
            RepairPolicy::Always => true,
            RepairPolicy::Never => false,
            RepairPolicy::Ask => answer(),
        };

    match (fixed, fix.ignorable) {
        (true, _) => Verdict::Fix,
        (false, true) => Verdict::Skip,
        (false, false) => Verdict::Halt,
    }
}

/// Informational counters. Never feed back into a decision.
#[derive(Debug, Default)]
pub struct NegotiationStats {
    fixed: AtomicU32,
    skipped: AtomicU32,
    halted: AtomicU32,
    prompted: AtomicU32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NegotiationSnapshot {
    pub fixed: u32,
    pub skipped: u32,
    pub halted: u32,
    pub prompted: u32,
}

impl NegotiationStats {
    pub fn snapshot(&self) -> NegotiationSnapshot {
        NegotiationSnapshot {
            fixed: self.fixed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            halted: self.halted.load(Ordering::Relaxed),
            prompted: self.prompted.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU32) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Negotiates repairs for one filesystem under a fixed policy.
///
/// Shareable across threads. With [`RepairPolicy::Ask`] every negotiation blocks on
/// the filesystem's prompt; the caller serializes `Ask` negotiations.
///
/// A halt is sticky: once one negotiation has halted, every later one fails with
/// [`FsckAbort`] without being evaluated, even if the caller dropped the first error.
pub struct Negotiator<'a> {
    fs: &'a Filesystem,
    policy: RepairPolicy,
    stats: NegotiationStats,
    halted: AtomicBool,
}

impl<'a> Negotiator<'a> {
    pub fn new(fs: &'a Filesystem, policy: RepairPolicy) -> Self {
        Self {
            fs,
            policy,
            stats: NegotiationStats::default(),
            halted: AtomicBool::new(false),
        }
    }

    pub fn policy(&self) -> RepairPolicy {
        self.policy
    }

    pub fn fs(&self) -> &'a Filesystem {
        self.fs
    }

    pub fn stats(&self) -> NegotiationSnapshot {
        self.stats.snapshot()
    }

    /// True once a negotiation has halted the pass.
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Core negotiation. A false `cond` is a no-op returning [`Outcome::NoAction`].
    pub fn negotiate(
        &self,
        cond: bool,
        fix: impl Into<Fixability>,
        msg: impl fmt::Display,
    ) -> FsckResult<Outcome> {
        if self.is_halted() {
            return Err(FsckAbort::errors_not_fixed());
        }
        if !cond {
            return Ok(Outcome::NoAction);
        }
        let fix = fix.into();
        let scope = self.fs.scope();

        let v = if !fix.fixable {
            scope.emit(Level::Error, format!("{msg} ({})", fix.reason));
            verdict(fix, self.policy, || false)
        } else {
            match self.policy {
                RepairPolicy::Always => scope.emit(Level::Error, format!("{msg}, fixing")),
                RepairPolicy::Never => scope.emit(Level::Error, msg.to_string()),
                RepairPolicy::Ask => {}
            }
            let v = verdict(fix, self.policy, || {
                NegotiationStats::bump(&self.stats.prompted);
                self.fs.prompt().ask_yes_no(&format!("{msg}: fix?"))
            });
            if self.policy == RepairPolicy::Ask {
                let done = if v == Verdict::Fix { "fixing" } else { "not fixing" };
                scope.emit(Level::Error, format!("{msg}, {done}"));
            }
            v
        };
        log::debug!("{scope}: fsck {:?} under policy {}", v, self.policy);

        match v {
            Verdict::Fix => {
                NegotiationStats::bump(&self.stats.fixed);
                self.fs.set_fixed_errors();
                Ok(Outcome::Fixed)
            }
            Verdict::Skip => {
                NegotiationStats::bump(&self.stats.skipped);
                Ok(Outcome::NotFixed)
            }
            Verdict::Halt => {
                self.halted.store(true, Ordering::Release);
                NegotiationStats::bump(&self.stats.halted);
                scope.emit(Level::Error, "Unable to continue, halting");
                Err(FsckAbort::errors_not_fixed())
            }
        }
    }

    /// Negotiates in `mode`; `Ok(true)` means the caller must apply the repair.
    pub fn negotiate_mode(
        &self,
        cond: bool,
        mode: FixMode,
        msg: impl fmt::Display,
    ) -> FsckResult<bool> {
        self.negotiate(cond, mode, msg).map(|o| o.is_fixed())
    }

    /// No repair implemented; reported and left in place.
    pub fn unfixable_on(&self, cond: bool, msg: impl fmt::Display) -> FsckResult<bool> {
        self.negotiate_mode(cond, FixMode::Unfixable, msg)
    }

    /// Deferred to a full fsck run.
    pub fn need_fsck_on(&self, cond: bool, msg: impl fmt::Display) -> FsckResult<bool> {
        self.negotiate_mode(cond, FixMode::NeedFsck, msg)
    }

    /// Must be repaired or the pass halts.
    pub fn must_fix_on(&self, cond: bool, msg: impl fmt::Display) -> FsckResult<bool> {
        self.negotiate_mode(cond, FixMode::MustFix, msg)
    }

    /// Unconditional [`Self::must_fix_on`], for call sites that already branched.
    pub fn must_fix(&self, msg: impl fmt::Display) -> FsckResult<bool> {
        self.negotiate_mode(true, FixMode::MustFix, msg)
    }

    /// Best-effort repair.
    pub fn fix_on(&self, cond: bool, msg: impl fmt::Display) -> FsckResult<bool> {
        self.negotiate_mode(cond, FixMode::Fix, msg)
    }
}

impl fmt::Debug for Negotiator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Negotiator")
            .field("fs", &self.fs.name())
            .field("policy", &self.policy)
            .field("stats", &self.stats.snapshot())
            .field("halted", &self.is_halted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompt::{AutoPrompt, ScriptedPrompt};
    use crate::core::sink::MemorySink;
    use crate::fsck::FsckCode;
    use std::sync::Arc;

    fn setup(policy: RepairPolicy, answers: &[bool]) -> (Arc<Filesystem>, Arc<MemorySink>, Arc<ScriptedPrompt>) {
        let sink = Arc::new(MemorySink::new());
        let prompt = Arc::new(ScriptedPrompt::new(answers.iter().copied()));
        let fs = Filesystem::builder("pool0")
            .policy(policy)
            .sink(sink.clone())
            .prompt(prompt.clone())
            .build();
        (fs, sink, prompt)
    }

    #[test]
    fn test_verdict_is_pure() {
        for mode in FixMode::ALL {
            for policy in RepairPolicy::ALL {
                for answer in [false, true] {
                    let a = verdict(mode.fixability(), policy, || answer);
                    let b = verdict(mode.fixability(), policy, || answer);
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_verdict_never_fixes_unfixable() {
        for mode in [FixMode::Unfixable, FixMode::NeedFsck] {
            for policy in RepairPolicy::ALL {
                assert_eq!(verdict(mode.fixability(), policy, || true), Verdict::Skip);
            }
        }
    }

    #[test]
    fn test_false_condition_is_noop() {
        let (fs, sink, prompt) = setup(RepairPolicy::Ask, &[true]);
        let fsck = fs.negotiator();

        for mode in FixMode::ALL {
            assert_eq!(fsck.negotiate(false, mode, "nothing"), Ok(Outcome::NoAction));
        }

        assert!(sink.is_empty());
        assert!(prompt.asked().is_empty());
        assert!(fs.flags().is_empty());
        assert_eq!(fsck.stats(), NegotiationSnapshot::default());
    }

    #[test]
    fn test_best_effort_fix_always() {
        let (fs, sink, _) = setup(RepairPolicy::Always, &[]);
        let fsck = fs.negotiator();

        assert_eq!(fsck.fix_on(true, "dirent points to missing inode 12"), Ok(true));
        assert!(fs.fixed_errors());
        assert_eq!(sink.messages(), vec!["dirent points to missing inode 12, fixing"]);
    }

    #[test]
    fn test_unfixable_reports_reason() {
        for policy in RepairPolicy::ALL {
            let (fs, sink, prompt) = setup(policy, &[true]);
            let fsck = fs.negotiator();

            assert_eq!(
                fsck.negotiate(true, FixMode::Unfixable, "extent past i_size"),
                Ok(Outcome::NotFixed)
            );
            assert_eq!(sink.messages(), vec!["extent past i_size (repair unimplemented)"]);
            assert!(prompt.asked().is_empty());
            assert!(!fs.fixed_errors());
        }
    }

    #[test]
    fn test_need_fsck_reason() {
        let (fs, sink, _) = setup(RepairPolicy::Always, &[]);
        assert_eq!(fs.negotiator().need_fsck_on(true, "stale dirent"), Ok(false));
        assert!(sink.contains("stale dirent (run fsck to correct)"));
    }

    #[test]
    fn test_must_fix_never_halts() {
        let (fs, sink, _) = setup(RepairPolicy::Never, &[]);
        let fsck = fs.negotiator();

        let err = fsck.must_fix_on(true, "root inode missing").unwrap_err();
        assert_eq!(err.code(), FsckCode::ErrorsNotFixed);
        assert_eq!(
            sink.messages(),
            vec!["root inode missing", "Unable to continue, halting"]
        );
        assert!(!fs.fixed_errors());
        assert_eq!(fsck.stats().halted, 1);
    }

    #[test]
    fn test_ask_uses_prompt_answer() {
        let (fs, sink, prompt) = setup(RepairPolicy::Ask, &[false, true]);
        let fsck = fs.negotiator();

        assert_eq!(fsck.fix_on(true, "nlink wrong for inode 4"), Ok(false));
        assert!(!fs.fixed_errors());
        assert_eq!(fsck.must_fix(format_args!("inode {} unreachable", 5)), Ok(true));
        assert!(fs.fixed_errors());

        assert_eq!(
            prompt.asked(),
            vec!["nlink wrong for inode 4: fix?", "inode 5 unreachable: fix?"]
        );
        assert_eq!(
            sink.messages(),
            vec![
                "nlink wrong for inode 4, not fixing",
                "inode 5 unreachable, fixing"
            ]
        );
        assert_eq!(fsck.stats().prompted, 2);
    }

    #[test]
    fn test_ask_no_on_mandatory_halts() {
        let (fs, sink, _) = setup(RepairPolicy::Ask, &[false]);
        let res = fs.negotiator().must_fix_on(true, "alloc key missing");
        assert_eq!(res, Err(FsckAbort::errors_not_fixed()));
        assert_eq!(
            sink.messages(),
            vec!["alloc key missing, not fixing", "Unable to continue, halting"]
        );
    }

    #[test]
    fn test_ask_with_auto_prompt_is_logged() {
        let sink = Arc::new(MemorySink::new());
        let fs = Filesystem::builder("pool0")
            .policy(RepairPolicy::Ask)
            .sink(sink.clone())
            .prompt(Arc::new(AutoPrompt::new(true)))
            .build();

        assert_eq!(fs.negotiator().fix_on(true, "bucket 7 gen mismatch"), Ok(true));
        assert!(fs.fixed_errors());
        assert_eq!(sink.messages(), vec!["bucket 7 gen mismatch, fixing"]);
    }

    #[test]
    fn test_default_prompt_refusal_is_logged() {
        let sink = Arc::new(MemorySink::new());
        let fs = Filesystem::builder("pool0")
            .policy(RepairPolicy::Ask)
            .sink(sink.clone())
            .build();

        assert!(fs.negotiator().must_fix_on(true, "root inode missing").is_err());
        assert_eq!(
            sink.messages(),
            vec!["root inode missing, not fixing", "Unable to continue, halting"]
        );
    }

    #[test]
    fn test_halt_is_sticky() {
        let (fs, sink, _) = setup(RepairPolicy::Always, &[]);
        let fsck = Negotiator::new(&fs, RepairPolicy::Never);

        let _ = fsck.must_fix_on(true, "root inode missing");
        assert!(fsck.is_halted());

        // later negotiations fail without being evaluated
        assert_eq!(fsck.fix_on(true, "i_size wrong"), Err(FsckAbort::errors_not_fixed()));
        assert_eq!(fsck.fix_on(false, "never"), Err(FsckAbort::errors_not_fixed()));
        assert!(!fs.fixed_errors());
        assert_eq!(
            sink.messages(),
            vec!["root inode missing", "Unable to continue, halting"]
        );
        assert_eq!(fsck.stats().halted, 1);
    }
}
