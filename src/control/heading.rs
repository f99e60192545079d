// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Turn loop.
//!
//! Two exclusive PD policies, chosen by [`MotionTarget::tracking_enabled`]:
//!
//! - tracking: `(rho + theta) * camera_kp + yaw_rate * camera_kd`
//! - heading hold: `(target_heading - yaw) * turn_kp - yaw_rate * turn_kd + yaw_bias`
//!
//! The heading error is wrapped into `(-π, π]`, so a target written past the yaw wrap still
//! converges by the short way round.
//!
//! There is no integral term; heading references arrive as steps rather than held offsets.

use core::f32::consts::{PI, TAU};

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::ControlGains;
use crate::sensor::VisionBearing;
use crate::state::MotionTarget;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeadingPolicy {
    Tracking,
    Hold,
}

pub struct HeadingController {
    policy: HeadingPolicy,
    output: f32,
}

impl HeadingController {
    pub fn new() -> Self {
        Self {
            policy: HeadingPolicy::Hold,
            output: 0.0,
        }
    }

    /// Run one inner tick and return the differential turn command.
    ///
    /// `bearing` should already have been taken from the vision source; it is ignored while holding
    /// a heading.
    pub fn update(
        &mut self,
        target: &MotionTarget,
        yaw: f32,
        yaw_rate: f32,
        bearing: VisionBearing,
        gains: &ControlGains,
    ) -> f32 {
        self.output = if target.tracking_enabled {
            self.policy = HeadingPolicy::Tracking;
            (bearing.rho + bearing.theta) * gains.camera_kp + yaw_rate * gains.camera_kd
        } else {
            self.policy = HeadingPolicy::Hold;
            let error = wrap_angle(target.target_heading - yaw);
            error * gains.turn_kp - yaw_rate * gains.turn_kd + gains.yaw_bias
        };
        self.output
    }

    #[inline]
    pub fn policy(&self) -> HeadingPolicy {
        self.policy
    }

    /// Output of the last update.
    #[inline]
    pub fn output(&self) -> f32 {
        self.output
    }
}

/// Wrap an angle into `(-π, π]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle - TAU * ((angle + PI) / TAU).floor();
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

impl Default for HeadingController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_is_pd_on_heading_error() {
        let g = ControlGains::default();
        let mut c = HeadingController::new();
        let target = MotionTarget {
            target_heading: 1.0,
            ..MotionTarget::default()
        };
        let out = c.update(&target, 0.2, 0.1, VisionBearing::default(), &g);
        // 0.8 * -0.5 - 0.1 * -1.0
        assert!((out + 0.3).abs() < 1e-6);
        assert_eq!(c.policy(), HeadingPolicy::Hold);
    }

    #[test]
    fn wrap_angle_takes_the_short_way() {
        assert!((wrap_angle(1.0) - 1.0).abs() < 1e-6);
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!((wrap_angle(-TAU - 0.5) + 0.5).abs() < 1e-5);
        assert!((wrap_angle(7.28) - (7.28 - TAU)).abs() < 1e-5);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-6);
        assert!((wrap_angle(PI) - PI).abs() < 1e-6);
    }

    #[test]
    fn hold_converges_past_the_yaw_wrap() {
        use crate::config::{INNER_DT, YAW_WRAP};

        let g = ControlGains::default();
        let mut c = HeadingController::new();
        // Manual left from near the wrap puts the target above any reportable yaw.
        let mut yaw = 5.88;
        let target = MotionTarget {
            target_heading: yaw + 1.0,
            ..MotionTarget::default()
        };

        let mut rate = 0.0;
        for _ in 0..20_000 {
            let out = c.update(&target, yaw, rate, VisionBearing::default(), &g);
            // Plant: the chassis turns against the differential command.
            rate = -0.5 * out;
            yaw += rate * INNER_DT;
            if yaw > YAW_WRAP {
                yaw -= YAW_WRAP;
            }
            if yaw < -YAW_WRAP {
                yaw += YAW_WRAP;
            }
        }

        assert!(wrap_angle(target.target_heading - yaw).abs() < 0.05);
        assert!(c.output().abs() < 0.05);
    }

    #[test]
    fn tracking_uses_bearing_and_ignores_heading() {
        let g = ControlGains::default();
        let mut c = HeadingController::new();
        let target = MotionTarget {
            target_heading: 3.0,
            tracking_enabled: true,
            ..MotionTarget::default()
        };
        let bearing = VisionBearing { rho: 0.2, theta: 0.1 };
        let out = c.update(&target, 0.0, 0.05, bearing, &g);
        // 0.3 * 0.5 + 0.05 * 1.0
        assert!((out - 0.2).abs() < 1e-6);
        assert_eq!(c.policy(), HeadingPolicy::Tracking);
    }

    #[test]
    fn tracking_without_fresh_bearing_only_damps() {
        let g = ControlGains::default();
        let mut c = HeadingController::new();
        let target = MotionTarget {
            tracking_enabled: true,
            ..MotionTarget::default()
        };
        let out = c.update(&target, 0.0, 0.4, VisionBearing::default(), &g);
        assert!((out - 0.4 * g.camera_kd).abs() < 1e-6);
    }
}
