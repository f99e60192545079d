// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers that sit above the raw `hw/` layer and below the
//! control task. The pulse-interrupt drivers are written against `embedded-hal` pin traits.
//!
//! ## Existing drivers
//!
//! - [`stepper`] – STEP/DIR stepper pulse generator with speed ramp
//! - [`tone`] – Square-wave buzzer tone
//! - [`ultrasonic`] – Trigger/echo ultrasonic ranger
//! - [`mpu6000`] – InvenSense MPU-6000 IMU over SPI

pub mod mpu6000;
pub mod stepper;
pub mod tone;
pub mod ultrasonic;

#[cfg(target_os = "none")]
pub use mpu6000::Mpu6000;
pub use stepper::{PulseDriver, Stepper};
pub use tone::ToneGenerator;
pub use ultrasonic::EchoRanger;
