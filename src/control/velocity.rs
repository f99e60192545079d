// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Outer velocity loop.
//!
//! Turns the error between the target and the measured average wheel speed into a lean
//! correction for the attitude loop. The error is low-pass filtered before it reaches the PI terms:
//!
//! ```text
//! raw      = target - (left + right) / 2
//! filtered = (1 - a) * raw + a * filtered_prev
//! integral = clamp(integral + filtered, -I_max, I_max)   // zero while |pitch| > reset
//! output   = Kp * filtered + Ki * integral
//! ```
//!
//! The integral is also forced to zero whenever the robot is tipped past the reset angle, so a
//! fall or a pick-up does not leave a wound-up correction behind.

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::{ControlGains, INTEGRAL_RESET_PITCH, VELOCITY_FILTER, VELOCITY_INTEGRAL_MAX};

pub struct VelocityController {
    /// Weight of the previous filtered error.
    filter: f32,
    /// Symmetric integral clamp.
    int_max: f32,
    /// |pitch| above which the integral is dropped.
    reset_pitch: f32,

    filtered_error: f32,
    integral: f32,
    /// `Kp * filtered` from the last update.
    proportional: f32,
    output: f32,
}

impl VelocityController {
    pub fn new() -> Self {
        Self {
            filter: VELOCITY_FILTER,
            int_max: VELOCITY_INTEGRAL_MAX,
            reset_pitch: INTEGRAL_RESET_PITCH,
            filtered_error: 0.0,
            integral: 0.0,
            proportional: 0.0,
            output: 0.0,
        }
    }

    /// Set the low-pass coefficient (clamped to `[0, 1)`).
    pub fn with_filter(mut self, a: f32) -> Self {
        self.filter = a.clamp(0.0, 0.999);
        self
    }

    /// Set the symmetric integral limit for anti-windup.
    pub fn with_integral_limit(mut self, max: f32) -> Self {
        self.int_max = max.abs();
        self
    }

    /// Set the tilt at which the integral is reset.
    pub fn with_reset_pitch(mut self, pitch: f32) -> Self {
        self.reset_pitch = pitch.abs();
        self
    }

    /// Run one outer tick and return the lean correction.
    ///
    /// `wheel_speeds` are the two measured wheel speeds in the same units as `target`.
    pub fn update(
        &mut self,
        target: f32,
        wheel_speeds: [f32; 2],
        pitch: f32,
        gains: &ControlGains,
    ) -> f32 {
        let average = (wheel_speeds[0] + wheel_speeds[1]) / 2.0;
        let raw = target - average;

        self.filtered_error = (1.0 - self.filter) * raw + self.filter * self.filtered_error;

        self.integral = (self.integral + self.filtered_error).clamp(-self.int_max, self.int_max);
        if pitch.abs() > self.reset_pitch {
            self.integral = 0.0;
        }

        self.proportional = gains.velocity_kp * self.filtered_error;
        self.output = self.proportional + gains.velocity_ki * self.integral;
        self.output
    }

    /// Drop the accumulated integral immediately. The output keeps only the proportional term.
    #[inline]
    pub fn reset_integral(&mut self) {
        self.integral = 0.0;
        self.output = self.proportional;
    }

    /// Clear all history.
    pub fn reset(&mut self) {
        self.filtered_error = 0.0;
        self.integral = 0.0;
        self.proportional = 0.0;
        self.output = 0.0;
    }

    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    #[inline]
    pub fn filtered_error(&self) -> f32 {
        self.filtered_error
    }

    /// Output of the last update.
    #[inline]
    pub fn output(&self) -> f32 {
        self.output
    }
}

impl Default for VelocityController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gains(kp: f32) -> ControlGains {
        ControlGains {
            velocity_kp: kp,
            velocity_ki: ControlGains::velocity_ki_for(kp),
            ..ControlGains::default()
        }
    }

    #[test]
    fn single_step_matches_hand_calculation() {
        let g = gains(0.015);
        let mut c = VelocityController::new().with_filter(0.7);

        let out = c.update(1.5, [1.0, 1.0], 0.0, &g);

        assert!((c.filtered_error() - 0.15).abs() < 1e-6);
        assert!((c.integral() - 0.15).abs() < 1e-6);
        // 0.015 * 0.15 + 0.000075 * 0.15
        assert!((out - 0.00226125).abs() < 1e-6);
    }

    #[test]
    fn integral_never_leaves_its_bounds() {
        let g = gains(0.04);
        let mut c = VelocityController::new().with_integral_limit(0.1);

        for i in 0..500 {
            let target = if (i / 50) % 2 == 0 { 25.0 } else { -25.0 };
            c.update(target, [0.0, 0.0], 0.0, &g);
            assert!(c.integral() <= 0.1 && c.integral() >= -0.1);
        }
    }

    #[test]
    fn tipping_over_clears_integral() {
        let g = gains(0.04);
        let mut c = VelocityController::new();
        for _ in 0..20 {
            c.update(1.0, [0.0, 0.0], 0.0, &g);
        }
        assert!(c.integral() > 0.0);

        c.update(1.0, [0.0, 0.0], INTEGRAL_RESET_PITCH + 0.01, &g);
        assert_eq!(c.integral(), 0.0);

        c.update(1.0, [0.0, 0.0], -(INTEGRAL_RESET_PITCH + 0.2), &g);
        assert_eq!(c.integral(), 0.0);
    }

    #[test]
    fn integral_reset_drops_its_share_of_the_output() {
        let g = gains(0.04);
        let mut c = VelocityController::new();
        for _ in 0..20 {
            c.update(1.0, [0.0, 0.0], 0.0, &g);
        }
        let proportional = g.velocity_kp * c.filtered_error();
        assert!(c.output() > proportional);

        c.reset_integral();
        assert_eq!(c.integral(), 0.0);
        assert!((c.output() - proportional).abs() < 1e-7);
    }

    #[test]
    fn on_target_settles_to_zero_error() {
        let g = gains(0.04);
        let mut c = VelocityController::new();
        c.update(2.0, [0.0, 0.0], 0.0, &g);
        for _ in 0..200 {
            c.update(2.0, [2.0, 2.0], 0.0, &g);
        }
        assert!(c.filtered_error().abs() < 1e-6);
    }
}
