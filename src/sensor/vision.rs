// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Bearing error reported by the vision tracker.
//!
//! The tracker sends `rho` (lateral offset) and `theta` (angle) whenever it has a new frame. The
//! heading loop consumes the pair once; if no fresh pair arrives before the next inner tick the
//! loop only sees zeros and falls back to pure yaw-rate damping.

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct VisionBearing {
    pub rho: f32,
    pub theta: f32,
}

impl VisionBearing {
    /// Store a fresh bearing, replacing anything not yet consumed.
    pub fn set(&mut self, rho: f32, theta: f32) {
        self.rho = rho;
        self.theta = theta;
    }

    /// Consume the bearing, leaving zeros behind.
    pub fn take(&mut self) -> VisionBearing {
        core::mem::take(self)
    }
}
