// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Differential-drive output stage and fall interlock.
//!
//! `left = vertical + turn`, `right = vertical - turn`. Each wheel gets the saturating speed
//! limit as its target with the opposite sign of its acceleration command; the pulse driver ramps
//! toward that target at the commanded rate, so the target acts as a direction cue rather than a
//! tracked setpoint.
//!
//! If |pitch| is past the fall angle both wheels are braked to zero instead, whatever the loops
//! asked for. The interlock releases as soon as pitch is back inside the limit.

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::{BRAKE_ACCELERATION, FALL_PITCH, WHEEL_SPEED_LIMIT};
use crate::control::wheel::WheelCommand;

pub struct MotionMixer {
    fall_pitch: f32,
    brake_acceleration: f32,
    speed_limit: f32,
    braking: bool,
}

impl MotionMixer {
    pub fn new(fall_pitch: f32, brake_acceleration: f32, speed_limit: f32) -> Self {
        Self {
            fall_pitch,
            brake_acceleration,
            speed_limit,
            braking: false,
        }
    }

    /// Raw per-wheel accelerations, before the interlock.
    #[inline]
    pub fn split(vertical: f32, turn: f32) -> (f32, f32) {
        (vertical + turn, vertical - turn)
    }

    /// Produce the commands for both wheels.
    pub fn mix(&mut self, vertical: f32, turn: f32, pitch: f32) -> [WheelCommand; 2] {
        self.braking = pitch.abs() > self.fall_pitch;
        if self.braking {
            let brake = WheelCommand::new(self.brake_acceleration, 0.0);
            return [brake, brake];
        }

        let (left, right) = Self::split(vertical, turn);
        [self.drive(left), self.drive(right)]
    }

    fn drive(&self, acceleration: f32) -> WheelCommand {
        let target_speed = if acceleration > 0.0 {
            -self.speed_limit
        } else {
            self.speed_limit
        };
        WheelCommand::new(acceleration, target_speed)
    }

    /// True if the last mix was overridden by the fall interlock.
    #[inline]
    pub fn is_braking(&self) -> bool {
        self.braking
    }
}

impl Default for MotionMixer {
    fn default() -> Self {
        Self::new(FALL_PITCH, BRAKE_ACCELERATION, WHEEL_SPEED_LIMIT)
    }
}
