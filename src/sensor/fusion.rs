// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Attitude estimation from a 6-axis IMU.
//!
//! Pitch comes from a complementary filter that blends the integrated gyro rate with the
//! accelerometer tilt. Yaw is integrated from the gyro and has its drift cancelled while the robot
//! is still: whenever the yaw rate stays below [`YAW_STILL_RATE`] the running mean of the per-tick
//! yaw change is treated as bias and subtracted. This assumes that stillness means the true yaw is
//! constant. It is a heuristic, not an estimator with any convergence guarantee.
//!
//! Axis mapping (as mounted): pitch rate is `gyro[1]`, yaw rate is `gyro[0]`, and the tilt angle
//! is `atan(accel[2] / accel[0])`.

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::{PITCH_ALPHA, YAW_ALPHA, YAW_STILL_RATE, YAW_WRAP};
use crate::sensor::{SensorError, SensorSample};

/// Pitch state of the complementary filter.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AttitudeEstimate {
    /// Tilt from vertical (rad).
    pub pitch: f32,
    /// Pitch rate (rad/s).
    pub pitch_rate: f32,
}

/// Integrated heading with its drift bookkeeping.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct YawEstimate {
    /// Heading (rad), wrapped into `[-YAW_WRAP, YAW_WRAP]`.
    pub yaw: f32,
    /// Current running mean of the per-tick yaw change while still.
    pub drift_bias: f32,
    drift_sum: f32,
    /// Samples that went into `drift_bias`, plus one.
    pub drift_sample_count: u32,
}

impl Default for YawEstimate {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            drift_bias: 0.0,
            drift_sum: 0.0,
            drift_sample_count: 1,
        }
    }
}

impl YawEstimate {
    fn reset_drift(&mut self) {
        self.drift_sum = 0.0;
        self.drift_bias = 0.0;
        self.drift_sample_count = 1;
    }
}

/// Everything the loops need from one fusion step.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Estimate {
    pub pitch: f32,
    pub pitch_rate: f32,
    pub yaw: f32,
    pub yaw_rate: f32,
}

pub struct SensorFusion {
    dt: f32,
    attitude: AttitudeEstimate,
    yaw: YawEstimate,
    yaw_rate: f32,
    fault: bool,
}

impl SensorFusion {
    /// Create a filter for a fixed sample period `dt` (seconds).
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            attitude: AttitudeEstimate::default(),
            yaw: YawEstimate::default(),
            yaw_rate: 0.0,
            fault: false,
        }
    }

    /// Fold one sample into the estimate.
    ///
    /// A sample containing NaN (or a degenerate accelerometer vector) is rejected: the previous
    /// estimate is kept, the fault flag is raised and `Err(NotANumber)` is returned. The next good
    /// sample clears the fault.
    pub fn update(&mut self, sample: &SensorSample) -> Result<Estimate, SensorError> {
        let [ax, _, az] = sample.accel;
        let tilt = (az / ax).atan();

        if sample.has_nan() || tilt.is_nan() {
            self.fault = true;
            return Err(SensorError::NotANumber);
        }
        self.fault = false;

        let pitch_rate = sample.gyro[1];
        let yaw_rate = sample.gyro[0];

        self.attitude.pitch =
            PITCH_ALPHA * (self.attitude.pitch + pitch_rate * self.dt) + (1.0 - PITCH_ALPHA) * tilt;
        self.attitude.pitch_rate = pitch_rate;

        self.update_yaw(yaw_rate);
        self.yaw_rate = yaw_rate;

        Ok(self.estimate())
    }

    fn update_yaw(&mut self, rate: f32) {
        let previous = self.yaw.yaw;

        let mut yaw = YAW_ALPHA * (previous + rate * self.dt) + (1.0 - YAW_ALPHA) * previous;
        if yaw > YAW_WRAP {
            yaw -= YAW_WRAP;
        }
        if yaw < -YAW_WRAP {
            yaw += YAW_WRAP;
        }

        if rate.abs() < YAW_STILL_RATE {
            self.yaw.drift_sum += yaw - previous;
            self.yaw.drift_bias = self.yaw.drift_sum / self.yaw.drift_sample_count as f32;
            self.yaw.drift_sample_count = self.yaw.drift_sample_count.saturating_add(1);
            yaw -= self.yaw.drift_bias;
        } else {
            self.yaw.reset_drift();
        }

        self.yaw.yaw = yaw;
    }

    /// Last good estimate.
    pub fn estimate(&self) -> Estimate {
        Estimate {
            pitch: self.attitude.pitch,
            pitch_rate: self.attitude.pitch_rate,
            yaw: self.yaw.yaw,
            yaw_rate: self.yaw_rate,
        }
    }

    #[inline]
    pub fn attitude(&self) -> &AttitudeEstimate {
        &self.attitude
    }

    #[inline]
    pub fn yaw(&self) -> &YawEstimate {
        &self.yaw
    }

    /// True while the most recent sample was rejected.
    #[inline]
    pub fn fault(&self) -> bool {
        self.fault
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.004;

    fn upright(gyro: [f32; 3]) -> SensorSample {
        // Gravity along +x, nothing on z: zero tilt.
        SensorSample::new([9.81, 0.0, 0.0], gyro)
    }

    #[test]
    fn level_and_still_stays_at_zero() {
        let mut f = SensorFusion::new(DT);
        for _ in 0..100 {
            let e = f.update(&upright([0.0; 3])).unwrap();
            assert!(e.pitch.abs() < 1e-6);
            assert!(e.yaw.abs() < 1e-6);
        }
    }

    #[test]
    fn pitch_converges_to_accelerometer_tilt() {
        let mut f = SensorFusion::new(DT);
        // atan(z / x) = atan(1) = pi/4
        let sample = SensorSample::new([5.0, 0.0, 5.0], [0.0; 3]);
        for _ in 0..1000 {
            f.update(&sample).unwrap();
        }
        assert!((f.estimate().pitch - core::f32::consts::FRAC_PI_4).abs() < 1e-3);
    }

    #[test]
    fn nan_holds_previous_pitch_and_flags_fault() {
        let mut f = SensorFusion::new(DT);
        let tilted = SensorSample::new([5.0, 0.0, 5.0], [0.1, 0.2, 0.0]);
        for _ in 0..10 {
            f.update(&tilted).unwrap();
        }
        let before = f.estimate();

        let bad = SensorSample::new([f32::NAN, 0.0, 9.81], [0.0; 3]);
        assert_eq!(f.update(&bad), Err(SensorError::NotANumber));
        assert!(f.fault());
        assert_eq!(f.estimate(), before);
        assert!(!f.estimate().pitch.is_nan());

        f.update(&tilted).unwrap();
        assert!(!f.fault());
    }

    #[test]
    fn zero_accelerometer_is_rejected() {
        let mut f = SensorFusion::new(DT);
        let bad = SensorSample::new([0.0, 0.0, 0.0], [0.0; 3]);
        assert!(f.update(&bad).is_err());
        assert_eq!(f.estimate().pitch, 0.0);
    }

    #[test]
    fn turning_integrates_yaw() {
        let mut f = SensorFusion::new(DT);
        for _ in 0..250 {
            f.update(&upright([1.0, 0.0, 0.0])).unwrap();
        }
        // 250 ticks * 4 ms * 1 rad/s * alpha
        let expected = 250.0 * DT * YAW_ALPHA;
        assert!((f.estimate().yaw - expected).abs() < 1e-3);
        assert!((f.estimate().yaw_rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn yaw_wraps_past_a_full_turn() {
        let mut f = SensorFusion::new(0.1);
        for _ in 0..100 {
            f.update(&upright([5.0, 0.0, 0.0])).unwrap();
            let yaw = f.estimate().yaw;
            assert!(yaw <= YAW_WRAP && yaw >= -YAW_WRAP);
        }
    }

    #[test]
    fn stationary_drift_is_cancelled() {
        let mut f = SensorFusion::new(DT);
        // A bias just under the stillness threshold plus some zero-mean noise.
        for i in 0..5000 {
            let noise = if i % 2 == 0 { 0.002 } else { -0.002 };
            f.update(&upright([0.015 + noise, 0.0, 0.0])).unwrap();
        }
        assert!(f.estimate().yaw.abs() < 1e-3);
        assert!(f.yaw().drift_sample_count > 1);
    }

    #[test]
    fn motion_resets_drift_statistics() {
        let mut f = SensorFusion::new(DT);
        for _ in 0..10 {
            f.update(&upright([0.01, 0.0, 0.0])).unwrap();
        }
        assert!(f.yaw().drift_sample_count > 1);
        f.update(&upright([0.5, 0.0, 0.0])).unwrap();
        assert_eq!(f.yaw().drift_sample_count, 1);
        assert_eq!(f.yaw().drift_bias, 0.0);
    }
}
