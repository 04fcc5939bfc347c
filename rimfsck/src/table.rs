// SPDX-License-Identifier: MIT

use rimfault::prelude::*;
use std::fmt::Write;

fn cell(v: Verdict) -> &'static str {
    match v {
        Verdict::Fix => "fix",
        Verdict::Skip => "skip",
        Verdict::Halt => "halt",
    }
}

/// Renders the negotiation outcome of every fix mode, for the given policies.
///
/// Under `ask` both operator answers are shown as `yes/no`.
pub fn render_verdicts(policies: &[RepairPolicy]) -> String {
    let mut out = String::new();
    let _ = write!(out, "  {:<12}", "mode");
    for p in policies {
        let _ = write!(out, "| {:<10}", p.as_str());
    }
    out.push('\n');

    for mode in FixMode::ALL {
        let _ = write!(out, "  {:<12}", mode.as_str());
        for &p in policies {
            let text = if p == RepairPolicy::Ask && mode.fixable() {
                format!(
                    "{}/{}",
                    cell(verdict(mode.into(), p, || true)),
                    cell(verdict(mode.into(), p, || false))
                )
            } else {
                cell(verdict(mode.into(), p, || false)).to_string()
            };
            let _ = write!(out, "| {text:<10}");
        }
        out.push('\n');
    }
    out
}

pub fn render_taxonomy() -> String {
    let mut out = String::new();
    for class in FaultClass::ALL {
        let _ = writeln!(
            out,
            "  {:<14} -> {:<18} {}",
            class.name(),
            class.escalation().to_string(),
            class.describe()
        );
    }
    out
}

pub fn print_table(policy: Option<RepairPolicy>) {
    let policies: Vec<RepairPolicy> = match policy {
        Some(p) => vec![p],
        None => RepairPolicy::ALL.to_vec(),
    };
    crate::log_normal!("Fault classes:\n{}", render_taxonomy());
    crate::log_normal!("Fsck negotiation:\n{}", render_verdicts(&policies));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_rows() {
        let out = render_verdicts(&RepairPolicy::ALL);
        let rows: Vec<Vec<&str>> = out
            .lines()
            .map(|l| l.split('|').map(str::trim).collect())
            .collect();

        assert_eq!(rows.len(), 5);
        let by_mode = |m: &str| rows.iter().find(|r| r[0] == m).unwrap().clone();
        assert_eq!(by_mode("unfixable"), ["unfixable", "skip", "skip", "skip"]);
        assert_eq!(by_mode("need-fsck"), ["need-fsck", "skip", "skip", "skip"]);
        assert_eq!(by_mode("must-fix"), ["must-fix", "halt", "fix", "fix/halt"]);
        assert_eq!(by_mode("fix"), ["fix", "skip", "fix", "fix/skip"]);
    }

    #[test]
    fn test_taxonomy_lists_every_class() {
        let out = render_taxonomy();
        assert_eq!(out.lines().count(), FaultClass::ALL.len());
        assert!(out.contains("logic-bug"));
    }
}
