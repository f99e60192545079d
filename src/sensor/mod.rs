// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Sensor Inputs
//!
//! Raw inputs and the estimators that turn them into something the control loops can use.
//!
//! ## Modules
//!
//! - [`fusion`] - Complementary-filter pitch and drift-compensated yaw.
//! - [`range`] - Echo time-of-flight to a sticky "too close" flag.
//! - [`vision`] - One-shot bearing error from the line / target tracker.

pub mod fusion;
pub mod range;
pub mod vision;

pub use fusion::{AttitudeEstimate, Estimate, SensorFusion, YawEstimate};
pub use range::{RangeEvent, RangeGuard};
pub use vision::VisionBearing;

use core::fmt;

/// One accelerometer + gyroscope reading.
///
/// Accelerations in m/s², rates in rad/s, body axes as mounted on the chassis.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SensorSample {
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
}

impl SensorSample {
    pub const fn new(accel: [f32; 3], gyro: [f32; 3]) -> Self {
        Self { accel, gyro }
    }

    /// True if any axis is not a number.
    pub fn has_nan(&self) -> bool {
        self.accel.iter().chain(self.gyro.iter()).any(|v| v.is_nan())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SensorError {
    /// Bus transfer failed.
    Bus,
    /// WHO_AM_I did not match the expected part.
    IdentityMismatch,
    /// Reading contained a NaN.
    NotANumber,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Bus => f.write_str("sensor bus error"),
            SensorError::IdentityMismatch => f.write_str("unexpected sensor identity"),
            SensorError::NotANumber => f.write_str("sensor reading is NaN"),
        }
    }
}

/// Anything that can produce IMU samples.
pub trait Imu {
    fn read(&mut self) -> Result<SensorSample, SensorError>;
}
