// SPDX-License-Identifier: MIT

//! Fixed-window message throttling, keyed by call site.
//!
//! Each device owns one [`RateLimiter`], so the effective key is (device, call site).
//! Only message emission is throttled; callers update device state unconditionally.

use core::panic::Location;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::core::options::RateLimitConfig;

/// Source location of a reporting call.
pub type CallSite = &'static Location<'static>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RateDecision {
    /// Emit the message. `suppressed` messages were dropped in the window that just ended.
    Emit { suppressed: u32 },
    Suppress,
}

impl RateDecision {
    pub fn allows(&self) -> bool {
        matches!(self, RateDecision::Emit { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    begin: Duration,
    printed: u32,
    missed: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    cfg: RateLimitConfig,
    windows: Mutex<HashMap<CallSite, Window>>,
}

impl RateLimiter {
    pub fn new(cfg: RateLimitConfig) -> Self {
        Self {
            cfg,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.cfg
    }

    /// Decides whether a report from `site` at time `now` may be emitted.
    pub fn check(&self, site: CallSite, now: Duration) -> RateDecision {
        if self.cfg.is_unlimited() {
            return RateDecision::Emit { suppressed: 0 };
        }

        let mut windows = self.windows.lock();
        let w = windows.entry(site).or_insert(Window {
            begin: now,
            printed: 0,
            missed: 0,
        });

        let mut suppressed = 0;
        if now.saturating_sub(w.begin) >= self.cfg.interval {
            if w.missed > 0 {
                log::debug!(
                    "ratelimit window at {}:{} closed, {} suppressed",
                    site.file(),
                    site.line(),
                    w.missed
                );
            }
            suppressed = w.missed;
            *w = Window {
                begin: now,
                printed: 0,
                missed: 0,
            };
        }

        if w.printed < self.cfg.burst {
            w.printed += 1;
            RateDecision::Emit { suppressed }
        } else {
            w.missed += 1;
            RateDecision::Suppress
        }
    }

    /// Messages dropped so far in the current window of `site`.
    pub fn missed(&self, site: CallSite) -> u32 {
        self.windows.lock().get(site).map_or(0, |w| w.missed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn here() -> CallSite {
        Location::caller()
    }

    #[test]
    fn test_burst_then_suppress() {
        let rl = RateLimiter::new(RateLimitConfig::new(Duration::from_secs(5), 3));
        let site = here();
        let now = Duration::from_secs(1);

        let allowed = (0..10).filter(|_| rl.check(site, now).allows()).count();
        assert_eq!(allowed, 3);
        assert_eq!(rl.missed(site), 7);
    }

    #[test]
    fn test_new_window_reports_suppressed() {
        let rl = RateLimiter::new(RateLimitConfig::new(Duration::from_secs(5), 1));
        let site = here();

        assert_eq!(
            rl.check(site, Duration::ZERO),
            RateDecision::Emit { suppressed: 0 }
        );
        assert_eq!(rl.check(site, Duration::from_secs(1)), RateDecision::Suppress);
        assert_eq!(rl.check(site, Duration::from_secs(2)), RateDecision::Suppress);
        assert_eq!(
            rl.check(site, Duration::from_secs(6)),
            RateDecision::Emit { suppressed: 2 }
        );
        assert_eq!(rl.missed(site), 0);
    }

    #[test]
    fn test_sites_are_independent() {
        let rl = RateLimiter::new(RateLimitConfig::new(Duration::from_secs(5), 1));
        let a = here();
        let b = here();
        assert_ne!(a, b);

        assert!(rl.check(a, Duration::ZERO).allows());
        assert!(!rl.check(a, Duration::ZERO).allows());
        assert!(rl.check(b, Duration::ZERO).allows());
    }

    #[test]
    fn test_unlimited_never_suppresses() {
        let rl = RateLimiter::new(RateLimitConfig::unlimited());
        let site = here();
        assert!((0..1000).all(|_| rl.check(site, Duration::ZERO).allows()));
    }
}
