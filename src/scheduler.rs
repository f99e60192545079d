// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Cooperative multi-rate scheduler.
//!
//! Four cadences share the main loop:
//!
//! | Cadence    | Period                      | Work                              |
//! |------------|-----------------------------|-----------------------------------|
//! | dispatch   | [`DISPATCH_INTERVAL_MS`]    | mode / autonomy                   |
//! | inner      | [`INNER_INTERVAL_MS`]       | fusion, heading, attitude, mixer  |
//! | outer      | [`OUTER_INTERVAL_MS`]       | velocity loop (only on inner ticks) |
//! | diagnostic | [`DIAGNOSTIC_INTERVAL_MS`]  | telemetry and logging             |
//!
//! Each deadline advances by its own period, not to `now`, so a late tick is followed by a short
//! gap rather than a permanent phase shift. Every tick that is already a full period behind when it
//! fires is counted in [`LoopScheduler::overruns`].
//!
//! Times are wrapping `u32` milliseconds.

use log::warn;

use crate::config::{
    DIAGNOSTIC_INTERVAL_MS, DISPATCH_INTERVAL_MS, INNER_INTERVAL_MS, INNER_OVERRUN_WARN_MS,
    OUTER_INTERVAL_MS,
};

/// Which cadences are due on this pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Due {
    pub dispatch: bool,
    pub inner: bool,
    pub outer: bool,
    pub diagnostic: bool,
}

/// One periodic deadline.
#[derive(Copy, Clone, Debug)]
struct Cadence {
    period: u32,
    deadline: u32,
    overruns: u32,
}

impl Cadence {
    fn new(period: u32, start: u32) -> Self {
        Self {
            period,
            deadline: start.wrapping_add(period),
            overruns: 0,
        }
    }

    /// True if the deadline has passed. Advances the deadline by one period when it fires.
    fn poll(&mut self, now: u32) -> bool {
        let late = now.wrapping_sub(self.deadline) as i32;
        if late < 0 {
            return false;
        }
        if late as u32 >= self.period {
            self.overruns = self.overruns.wrapping_add(1);
        }
        self.deadline = self.deadline.wrapping_add(self.period);
        true
    }
}

pub struct LoopScheduler {
    dispatch: Cadence,
    inner: Cadence,
    outer: Cadence,
    diagnostic: Cadence,
    last_inner: u32,
    warn_gap: u32,
}

impl LoopScheduler {
    pub fn new(now: u32) -> Self {
        Self::with_periods(
            now,
            DISPATCH_INTERVAL_MS,
            INNER_INTERVAL_MS,
            OUTER_INTERVAL_MS,
            DIAGNOSTIC_INTERVAL_MS,
        )
    }

    pub fn with_periods(now: u32, dispatch: u32, inner: u32, outer: u32, diagnostic: u32) -> Self {
        Self {
            dispatch: Cadence::new(dispatch, now),
            inner: Cadence::new(inner, now),
            outer: Cadence::new(outer, now),
            diagnostic: Cadence::new(diagnostic, now),
            last_inner: now,
            warn_gap: INNER_OVERRUN_WARN_MS,
        }
    }

    /// Check every deadline once. Each cadence fires at most once per call.
    pub fn poll(&mut self, now: u32) -> Due {
        let dispatch = self.dispatch.poll(now);
        let inner = self.inner.poll(now);
        let outer = inner && self.outer.poll(now);
        let diagnostic = self.diagnostic.poll(now);

        if inner {
            let gap = now.wrapping_sub(self.last_inner);
            if gap > self.warn_gap {
                warn!("inner loop stalled for {} ms", gap);
            }
            self.last_inner = now;
        }

        Due {
            dispatch,
            inner,
            outer,
            diagnostic,
        }
    }

    /// Ticks that fired a full period or more behind schedule, across all cadences.
    pub fn overruns(&self) -> u32 {
        self.dispatch
            .overruns
            .wrapping_add(self.inner.overruns)
            .wrapping_add(self.outer.overruns)
            .wrapping_add(self.diagnostic.overruns)
    }

    #[inline]
    pub fn inner_overruns(&self) -> u32 {
        self.inner.overruns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(s: &mut LoopScheduler, from: u32, to: u32) -> [u32; 4] {
        let mut n = [0; 4];
        for now in from..to {
            let due = s.poll(now);
            n[0] += due.dispatch as u32;
            n[1] += due.inner as u32;
            n[2] += due.outer as u32;
            n[3] += due.diagnostic as u32;
        }
        n
    }

    #[test]
    fn nothing_due_at_start() {
        let mut s = LoopScheduler::new(0);
        assert_eq!(s.poll(0), Due::default());
    }

    #[test]
    fn rates_match_periods() {
        let mut s = LoopScheduler::new(0);
        let n = count(&mut s, 0, 1200);
        assert_eq!(n, [11, 299, 99, 23]);
        assert_eq!(s.overruns(), 0);
    }

    #[test]
    fn outer_only_on_inner_ticks() {
        let mut s = LoopScheduler::new(0);
        for now in 0..500 {
            let due = s.poll(now);
            if due.outer {
                assert!(due.inner);
            }
        }
    }

    #[test]
    fn late_ticks_catch_up_without_drift() {
        let mut s = LoopScheduler::with_periods(0, 100, 4, 12, 50);

        // Loop was blocked for 20 ms: the next pass runs one inner tick, then the backlog drains
        // one tick per pass.
        let due = s.poll(20);
        assert!(due.inner);
        assert!(s.poll(20).inner);
        assert!(s.poll(20).inner);
        assert!(s.poll(20).inner);
        assert!(s.poll(20).inner);
        assert!(!s.poll(20).inner);
        assert!(s.inner_overruns() > 0);

        // Back on the initial grid.
        assert!(!s.poll(23).inner);
        assert!(s.poll(24).inner);
    }

    #[test]
    fn survives_clock_wrap() {
        let start = u32::MAX - 10;
        let mut s = LoopScheduler::with_periods(start, 100, 4, 12, 50);
        let mut inner = 0;
        for i in 0..40u32 {
            if s.poll(start.wrapping_add(i)).inner {
                inner += 1;
            }
        }
        assert_eq!(inner, 9);
    }
}
