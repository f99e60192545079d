// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! One-shot remote motion commands.

use core::fmt;

use crate::config::{CRUISE_SPEED, MANUAL_TURN_STEP};
use crate::state::MotionTarget;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ManualCommand {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl ManualCommand {
    pub const ALL: [ManualCommand; 5] = [
        ManualCommand::Forward,
        ManualCommand::Backward,
        ManualCommand::Left,
        ManualCommand::Right,
        ManualCommand::Stop,
    ];

    /// Exact, case-sensitive match on the wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            ManualCommand::Forward => "forward",
            ManualCommand::Backward => "backward",
            ManualCommand::Left => "left",
            ManualCommand::Right => "right",
            ManualCommand::Stop => "stop",
        }
    }

    /// Apply to the motion target. Turns step the heading relative to the current yaw.
    pub fn apply(&self, target: &mut MotionTarget, yaw: f32) {
        match self {
            ManualCommand::Forward => target.target_velocity = -CRUISE_SPEED,
            ManualCommand::Backward => target.target_velocity = CRUISE_SPEED,
            ManualCommand::Stop => target.target_velocity = 0.0,
            ManualCommand::Left => target.target_heading = yaw + MANUAL_TURN_STEP,
            ManualCommand::Right => target.target_heading = yaw - MANUAL_TURN_STEP,
        }
    }
}

impl fmt::Display for ManualCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
