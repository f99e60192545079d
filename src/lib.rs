// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Balancebot Firmware
//!
//! Control core for a two-wheeled self-balancing robot on stepper motors, written in Rust,
//! targeting an STM32F777 MCU.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`sensor`] | IMU samples, attitude/heading fusion, range and vision inputs |
//! | [`control`] | Attitude, velocity and heading loops, wheel mixer, ISR hand-off |
//! | [`autonomy`] | Mode dispatch, manual commands, obstacle sequencer |
//! | [`protocol`] | Line-based command link, variables read-back, telemetry frames |
//! | [`buzzer`] | Non-blocking melody cues |
//! | [`scheduler`] | Deadline-based loop timing |
//! | [`balancer`] | The control task tying everything together |
//! | [`drivers`] | Device-level drivers (MPU-6000, steppers, buzzer, ultrasonic) |
//! | [`hw`] | MCU-level wrappers around USART, SPI, LEDs, SysTick |
//!
//! Everything above [`drivers`] is hardware-independent and tested on the host:
//!
//! ```bash
//! cargo test --lib
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod autonomy;
pub mod balancer;
pub mod buzzer;
pub mod config;
pub mod control;
pub mod drivers;
pub mod hw;
pub mod protocol;
pub mod scheduler;
pub mod sensor;
pub mod state;
