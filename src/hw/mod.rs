// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod led;
pub use led::{Led, StatusLeds};

#[cfg(target_os = "none")]
pub mod clock;
#[cfg(target_os = "none")]
pub mod logger;
#[cfg(target_os = "none")]
pub mod pins;
#[cfg(target_os = "none")]
pub mod spi;
#[cfg(target_os = "none")]
pub mod usart;

#[cfg(target_os = "none")]
pub use pins::BoardPins;
#[cfg(target_os = "none")]
pub use spi::{ChipSelect, SpiBus, SpiDevice};
#[cfg(target_os = "none")]
pub use usart::Usart;
