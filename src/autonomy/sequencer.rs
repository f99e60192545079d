// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Marker-stop routine for automatic mode.
//!
//! ```text
//! MovingForward --detected--> Stopped --> Turning --> Turned --cue idle--> TurningBack --> MovingForward
//! ```
//!
//! Every transition happens on a dispatch tick, one per tick. `Turned` waits on the status cue so
//! the robot pauses facing sideways for the length of the melody plus its hold.

use log::info;

use crate::buzzer::{Cue, CuePlayer};
use crate::config::{AUTONOMY_TURN_ANGLE, CRUISE_SPEED};
use crate::state::ControlContext;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AutonomyState {
    MovingForward,
    Stopped,
    Turning,
    Turned,
    TurningBack,
}

pub struct AutonomySequencer {
    state: AutonomyState,
    return_heading: f32,
}

impl AutonomySequencer {
    pub fn new() -> Self {
        Self {
            state: AutonomyState::MovingForward,
            return_heading: 0.0,
        }
    }

    /// Back to following the line, forgetting any turn in progress.
    pub fn reset(&mut self) {
        self.state = AutonomyState::MovingForward;
    }

    #[inline]
    pub fn state(&self) -> AutonomyState {
        self.state
    }

    /// Advance by one dispatch tick.
    pub fn step(&mut self, ctx: &mut ControlContext, yaw: f32, cues: &mut CuePlayer, now: u32) {
        let next = match self.state {
            AutonomyState::MovingForward => {
                ctx.target.tracking_enabled = true;
                if ctx.target_detected {
                    ctx.target_detected = false;
                    ctx.target.target_velocity = 0.0;
                    AutonomyState::Stopped
                } else {
                    ctx.target.target_velocity = -CRUISE_SPEED;
                    AutonomyState::MovingForward
                }
            }
            AutonomyState::Stopped => {
                cues.start(Cue::Status, now);
                ctx.target.tracking_enabled = false;
                self.return_heading = yaw;
                ctx.target.target_heading = yaw + AUTONOMY_TURN_ANGLE;
                AutonomyState::Turning
            }
            AutonomyState::Turning => AutonomyState::Turned,
            AutonomyState::Turned => {
                if cues.is_idle() {
                    cues.release();
                    AutonomyState::TurningBack
                } else {
                    AutonomyState::Turned
                }
            }
            AutonomyState::TurningBack => {
                ctx.target.target_heading = self.return_heading;
                AutonomyState::MovingForward
            }
        };

        if next != self.state {
            info!("autonomy: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

impl Default for AutonomySequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buzzer::ToneSink;
    use crate::config::{CUE_HOLD_MS, DISPATCH_INTERVAL_MS};

    struct Silent;

    impl ToneSink for Silent {
        fn tone(&mut self, _freq_hz: u16, _duration_ms: u32) {}
    }

    #[test]
    fn cruises_until_detection() {
        let mut ctx = ControlContext::default();
        let mut cues = CuePlayer::new();
        let mut seq = AutonomySequencer::new();

        seq.step(&mut ctx, 0.0, &mut cues, 0);
        assert_eq!(seq.state(), AutonomyState::MovingForward);
        assert!(ctx.target.tracking_enabled);
        assert_eq!(ctx.target.target_velocity, -CRUISE_SPEED);
    }

    #[test]
    fn detection_stops_on_next_tick() {
        let mut ctx = ControlContext::default();
        let mut cues = CuePlayer::new();
        let mut seq = AutonomySequencer::new();

        seq.step(&mut ctx, 0.0, &mut cues, 0);
        ctx.target_detected = true;
        seq.step(&mut ctx, 0.0, &mut cues, 100);

        assert_eq!(seq.state(), AutonomyState::Stopped);
        assert_eq!(ctx.target.target_velocity, 0.0);
        assert!(!ctx.target_detected);
    }

    #[test]
    fn flag_raised_before_entering_auto_still_stops() {
        let mut ctx = ControlContext::default();
        let mut cues = CuePlayer::new();
        let mut seq = AutonomySequencer::new();

        ctx.target_detected = true;
        seq.step(&mut ctx, 0.0, &mut cues, 0);
        assert_eq!(seq.state(), AutonomyState::Stopped);
        assert_eq!(ctx.target.target_velocity, 0.0);
    }

    #[test]
    fn full_cycle_turns_waits_and_returns() {
        let mut ctx = ControlContext::default();
        let mut cues = CuePlayer::new();
        let mut sink = Silent;
        let mut seq = AutonomySequencer::new();
        let yaw = 0.3;

        ctx.target_detected = true;
        seq.step(&mut ctx, yaw, &mut cues, 0);
        assert_eq!(seq.state(), AutonomyState::Stopped);

        seq.step(&mut ctx, yaw, &mut cues, 100);
        assert_eq!(seq.state(), AutonomyState::Turning);
        assert!(!ctx.target.tracking_enabled);
        assert!((ctx.target.target_heading - (yaw + AUTONOMY_TURN_ANGLE)).abs() < 1e-6);
        assert_eq!(cues.current(), Some(Cue::Status));

        seq.step(&mut ctx, yaw + 1.0, &mut cues, 200);
        assert_eq!(seq.state(), AutonomyState::Turned);

        // Held in Turned while the cue plays.
        let mut now = 200;
        while !cues.is_idle() {
            now += DISPATCH_INTERVAL_MS;
            for ms in now - DISPATCH_INTERVAL_MS + 1..=now {
                cues.update(ms, &mut sink);
            }
            if !cues.is_idle() {
                seq.step(&mut ctx, yaw + 1.5, &mut cues, now);
                assert_eq!(seq.state(), AutonomyState::Turned);
            }
        }
        assert!(now >= 200 + CUE_HOLD_MS);

        seq.step(&mut ctx, yaw + 1.5, &mut cues, now);
        assert_eq!(seq.state(), AutonomyState::TurningBack);
        assert_eq!(cues.current(), None);

        seq.step(&mut ctx, yaw + 1.5, &mut cues, now + 100);
        assert_eq!(seq.state(), AutonomyState::MovingForward);
        assert_eq!(ctx.target.target_heading, yaw);

        seq.step(&mut ctx, yaw, &mut cues, now + 200);
        assert!(ctx.target.tracking_enabled);
        assert_eq!(ctx.target.target_velocity, -CRUISE_SPEED);
    }
}
