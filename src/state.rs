// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Shared configuration and target context.
//!
//! One [`ControlContext`] is owned by the balancer and passed by reference to every component that
//! reads gains or targets. The command link only writes to it through
//! [`VariableId::apply`](crate::protocol::VariableId::apply) and the mode-switch helpers in
//! [`autonomy`](crate::autonomy).

use crate::config::ControlGains;
use crate::sensor::VisionBearing;

/// Which policy produces motion targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Autonomy sequencer drives the targets.
    Automatic,
    /// One-shot remote motion commands drive the targets.
    Manual,
    /// Manual was requested; targets get initialized on the next dispatch tick.
    AutoToManual,
    /// Balance in place, ignore motion commands.
    Stop,
}

/// What the loops are currently asked to do.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MotionTarget {
    /// Average wheel speed target (rad/s).
    pub target_velocity: f32,
    /// Heading target for heading-hold (rad).
    pub target_heading: f32,
    /// Steer from the vision bearing instead of holding a heading.
    pub tracking_enabled: bool,
}

pub struct ControlContext {
    pub gains: ControlGains,
    pub target: MotionTarget,
    pub mode: Mode,
    /// Set by the vision source when the goal marker is in view; cleared by the sequencer.
    pub target_detected: bool,
    pub vision: VisionBearing,
}

impl ControlContext {
    pub fn new(mode: Mode) -> Self {
        Self {
            gains: ControlGains::default(),
            target: MotionTarget::default(),
            mode,
            target_detected: false,
            vision: VisionBearing::default(),
        }
    }
}

impl Default for ControlContext {
    fn default() -> Self {
        Self::new(Mode::Automatic)
    }
}
