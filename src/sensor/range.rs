// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Obstacle stop from an ultrasonic echo.
//!
//! The echo driver reports the round-trip time in microseconds; [`RangeGuard`] converts it to a
//! distance and keeps a sticky "blocked" flag so the stop and resume commands fire once per
//! crossing. Resuming needs the obstacle to move back past a release margin, which keeps the robot
//! from chattering at the threshold.

use crate::config::{RANGE_RESUME_CM, RANGE_STOP_CM};

/// Speed of sound in cm/µs.
const SOUND_CM_PER_US: f32 = 0.034;

/// Convert an echo round-trip time to a one-way distance.
#[inline]
pub fn echo_to_cm(echo_us: u32) -> f32 {
    echo_us as f32 * SOUND_CM_PER_US / 2.0
}

/// Edge reported by [`RangeGuard::update`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RangeEvent {
    /// Obstacle just came inside the stop distance.
    Blocked,
    /// Obstacle just moved back out past the resume distance.
    Cleared,
}

pub struct RangeGuard {
    stop_cm: f32,
    resume_cm: f32,
    blocked: bool,
}

impl RangeGuard {
    pub fn new(stop_cm: f32, resume_cm: f32) -> Self {
        Self {
            stop_cm,
            resume_cm: resume_cm.max(stop_cm),
            blocked: false,
        }
    }

    /// Feed one echo measurement. Returns an event only on a state change.
    pub fn update(&mut self, echo_us: u32) -> Option<RangeEvent> {
        let distance = echo_to_cm(echo_us);

        if !self.blocked && distance < self.stop_cm {
            self.blocked = true;
            return Some(RangeEvent::Blocked);
        }
        if self.blocked && distance >= self.resume_cm {
            self.blocked = false;
            return Some(RangeEvent::Cleared);
        }
        None
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }
}

impl Default for RangeGuard {
    fn default() -> Self {
        Self::new(RANGE_STOP_CM, RANGE_RESUME_CM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_for_cm(cm: f32) -> u32 {
        (cm * 2.0 / SOUND_CM_PER_US) as u32
    }

    #[test]
    fn converts_round_trip_time() {
        // 588 µs round trip is ~10 cm.
        assert!((echo_to_cm(588) - 9.996).abs() < 1e-3);
    }

    #[test]
    fn blocks_once_and_stays_blocked() {
        let mut g = RangeGuard::default();
        assert_eq!(g.update(echo_for_cm(50.0)), None);
        assert_eq!(g.update(echo_for_cm(8.0)), Some(RangeEvent::Blocked));
        assert_eq!(g.update(echo_for_cm(7.0)), None);
        assert!(g.is_blocked());
    }

    #[test]
    fn does_not_chatter_inside_release_margin() {
        let mut g = RangeGuard::default();
        g.update(echo_for_cm(9.0));
        // Hovering between stop and resume distances changes nothing.
        for cm in [10.5, 9.5, 11.0, 9.9, 11.5] {
            assert_eq!(g.update(echo_for_cm(cm)), None);
        }
        assert!(g.is_blocked());
        assert_eq!(g.update(echo_for_cm(13.0)), Some(RangeEvent::Cleared));
        assert!(!g.is_blocked());
    }
}
