// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Loops
//!
//! The balance cascade and the stage that turns its outputs into wheel commands.
//!
//! | Loop                   | Runs on      | Input                         | Output                |
//! |------------------------|--------------|-------------------------------|-----------------------|
//! | [`VelocityController`] | outer tick   | target vs. wheel speed        | lean correction       |
//! | [`AttitudeController`] | inner tick   | lean vs. pitch                | common acceleration   |
//! | [`HeadingController`]  | inner tick   | heading or vision bearing     | differential accel    |
//! | [`MotionMixer`]        | inner tick   | common + differential, pitch  | two [`WheelCommand`]s |
//!
//! ## Modules
//!
//! - [`attitude`] - PD balance loop on pitch.
//! - [`velocity`] - Filtered PI on average wheel speed.
//! - [`heading`] - Tracking / heading-hold PD.
//! - [`mixer`] - Differential mixing and the fall interlock.
//! - [`wheel`] - Wheel commands and the interrupt hand-off buffers.

pub mod attitude;
pub mod heading;
pub mod mixer;
pub mod velocity;
pub mod wheel;

pub use attitude::AttitudeController;
pub use heading::{HeadingController, HeadingPolicy};
pub use mixer::MotionMixer;
pub use velocity::VelocityController;
pub use wheel::{SharedWheelCommands, SharedWheelSpeeds, WheelCommand};
