// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Inner balance loop.
//!
//! PD on the pitch error. The desired lean (`bias + velocity correction`) only changes when the
//! velocity loop runs, so its derivative is taken per millisecond of the outer period: the term is
//! non-zero on the first inner tick after each outer tick and zero otherwise.

use crate::config::{ControlGains, OUTER_INTERVAL_MS};

pub struct AttitudeController {
    lean_period_ms: f32,
    prev_lean: f32,
    output: f32,
}

impl AttitudeController {
    /// `lean_period_ms` is the period at which the lean setpoint is refreshed.
    pub fn new(lean_period_ms: f32) -> Self {
        Self {
            lean_period_ms,
            prev_lean: 0.0,
            output: 0.0,
        }
    }

    /// Run one inner tick and return the common wheel acceleration.
    pub fn update(&mut self, lean: f32, pitch: f32, pitch_rate: f32, gains: &ControlGains) -> f32 {
        let lean_rate = (lean - self.prev_lean) / self.lean_period_ms;
        self.prev_lean = lean;

        self.output = (lean - pitch) * gains.vertical_kp + (lean_rate - pitch_rate) * gains.vertical_kd;
        self.output
    }

    /// Output of the last update.
    #[inline]
    pub fn output(&self) -> f32 {
        self.output
    }
}

impl Default for AttitudeController {
    fn default() -> Self {
        Self::new(OUTER_INTERVAL_MS as f32)
    }
}
