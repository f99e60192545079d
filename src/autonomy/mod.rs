// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Target Producers
//!
//! Runs on the dispatch cadence and decides where the motion targets come from.
//!
//! | Mode           | Each dispatch tick                                                    |
//! |----------------|-----------------------------------------------------------------------|
//! | `Automatic`    | step the [`AutonomySequencer`]                                        |
//! | `AutoToManual` | zero velocity, tracking off, hold current yaw; then behave as Manual |
//! | `Manual`       | apply the pending [`ManualCommand`], if any, exactly once             |
//! | `Stop`         | zero velocity, tracking off                                           |
//!
//! ## Modules
//!
//! - [`manual`] - Remote motion commands.
//! - [`sequencer`] - Marker-stop state machine.

pub mod manual;
pub mod sequencer;

pub use manual::ManualCommand;
pub use sequencer::{AutonomySequencer, AutonomyState};

use log::{debug, info};

use crate::buzzer::CuePlayer;
use crate::state::{ControlContext, Mode};

pub struct Dispatcher {
    sequencer: AutonomySequencer,
    pending: Option<ManualCommand>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            sequencer: AutonomySequencer::new(),
            pending: None,
        }
    }

    /// Queue a manual command for the next dispatch tick. A newer command replaces an unconsumed one.
    pub fn queue_manual(&mut self, cmd: ManualCommand) {
        self.pending = Some(cmd);
    }

    pub fn switch_to_auto(&mut self, ctx: &mut ControlContext) {
        self.pending = None;
        self.sequencer.reset();
        set_mode(ctx, Mode::Automatic);
    }

    /// Targets are initialized on the next dispatch tick.
    pub fn switch_to_manual(&mut self, ctx: &mut ControlContext) {
        if !matches!(ctx.mode, Mode::Manual | Mode::AutoToManual) {
            set_mode(ctx, Mode::AutoToManual);
        }
    }

    pub fn switch_to_stop(&mut self, ctx: &mut ControlContext) {
        self.pending = None;
        set_mode(ctx, Mode::Stop);
    }

    /// Run one dispatch tick.
    pub fn dispatch(&mut self, ctx: &mut ControlContext, yaw: f32, cues: &mut CuePlayer, now: u32) {
        match ctx.mode {
            Mode::Automatic => self.sequencer.step(ctx, yaw, cues, now),
            Mode::AutoToManual => {
                ctx.target.target_velocity = 0.0;
                ctx.target.tracking_enabled = false;
                ctx.target.target_heading = yaw;
                set_mode(ctx, Mode::Manual);
                self.run_manual(ctx, yaw);
            }
            Mode::Manual => self.run_manual(ctx, yaw),
            Mode::Stop => {
                ctx.target.target_velocity = 0.0;
                ctx.target.tracking_enabled = false;
            }
        }
    }

    fn run_manual(&mut self, ctx: &mut ControlContext, yaw: f32) {
        if let Some(cmd) = self.pending.take() {
            debug!("manual: {}", cmd);
            cmd.apply(&mut ctx.target, yaw);
        }
    }

    #[inline]
    pub fn autonomy_state(&self) -> AutonomyState {
        self.sequencer.state()
    }

    #[inline]
    pub fn pending(&self) -> Option<ManualCommand> {
        self.pending
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn set_mode(ctx: &mut ControlContext, mode: Mode) {
    if ctx.mode != mode {
        info!("mode: {:?} -> {:?}", ctx.mode, mode);
        ctx.mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CRUISE_SPEED;

    #[test]
    fn auto_to_manual_initializes_once() {
        let mut ctx = ControlContext::default();
        let mut cues = CuePlayer::new();
        let mut d = Dispatcher::new();

        d.dispatch(&mut ctx, 0.0, &mut cues, 0);
        assert!(ctx.target.tracking_enabled);

        d.switch_to_manual(&mut ctx);
        assert_eq!(ctx.mode, Mode::AutoToManual);
        d.dispatch(&mut ctx, 0.7, &mut cues, 100);

        assert_eq!(ctx.mode, Mode::Manual);
        assert_eq!(ctx.target.target_velocity, 0.0);
        assert!(!ctx.target.tracking_enabled);
        assert_eq!(ctx.target.target_heading, 0.7);

        // A second request while already manual keeps the targets.
        d.queue_manual(ManualCommand::Forward);
        d.dispatch(&mut ctx, 0.7, &mut cues, 200);
        d.switch_to_manual(&mut ctx);
        assert_eq!(ctx.mode, Mode::Manual);
        assert_eq!(ctx.target.target_velocity, -CRUISE_SPEED);
    }

    #[test]
    fn manual_commands_are_edge_triggered() {
        let mut ctx = ControlContext::new(Mode::Manual);
        let mut cues = CuePlayer::new();
        let mut d = Dispatcher::new();

        d.queue_manual(ManualCommand::Left);
        d.dispatch(&mut ctx, 1.0, &mut cues, 0);
        let heading = ctx.target.target_heading;
        assert_eq!(d.pending(), None);

        // Yaw moves; the heading target must not be re-stepped.
        d.dispatch(&mut ctx, 1.5, &mut cues, 100);
        d.dispatch(&mut ctx, 2.0, &mut cues, 200);
        assert_eq!(ctx.target.target_heading, heading);
    }

    #[test]
    fn command_queued_before_first_manual_tick_applies_after_init() {
        let mut ctx = ControlContext::default();
        let mut cues = CuePlayer::new();
        let mut d = Dispatcher::new();

        d.switch_to_manual(&mut ctx);
        d.queue_manual(ManualCommand::Backward);
        d.dispatch(&mut ctx, 0.0, &mut cues, 0);
        assert_eq!(ctx.target.target_velocity, CRUISE_SPEED);
    }

    #[test]
    fn stop_mode_pins_velocity() {
        let mut ctx = ControlContext::default();
        let mut cues = CuePlayer::new();
        let mut d = Dispatcher::new();

        d.dispatch(&mut ctx, 0.0, &mut cues, 0);
        d.switch_to_stop(&mut ctx);
        ctx.target.target_velocity = 3.0;
        d.dispatch(&mut ctx, 0.0, &mut cues, 100);
        assert_eq!(ctx.target.target_velocity, 0.0);
        assert!(!ctx.target.tracking_enabled);
    }

    #[test]
    fn back_to_auto_restarts_sequence() {
        let mut ctx = ControlContext::default();
        let mut cues = CuePlayer::new();
        let mut d = Dispatcher::new();

        ctx.target_detected = true;
        d.dispatch(&mut ctx, 0.0, &mut cues, 0);
        assert_eq!(d.autonomy_state(), AutonomyState::Stopped);

        d.switch_to_manual(&mut ctx);
        d.queue_manual(ManualCommand::Forward);
        d.switch_to_auto(&mut ctx);
        assert_eq!(d.pending(), None);
        assert_eq!(d.autonomy_state(), AutonomyState::MovingForward);
    }
}
