// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Status LEDs.
//!
//! [`Led`] remembers its active level so callers only ever say on or off. [`StatusLeds`] drives
//! the board's two indicators from the main loop: green blinks while the loop is alive, red is
//! lit while the control task reports a fault.

use embedded_hal::digital::v2::OutputPin;

/// Whether the LED is driven active-high or active-low on the board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActiveLevel {
    High,
    Low,
}

pub struct Led<PIN: OutputPin> {
    pin: PIN,
    active: ActiveLevel,
    is_on: bool,
}

impl<PIN: OutputPin> Led<PIN> {
    /// Wrap a pin and switch the LED off.
    pub fn new(pin: PIN, active: ActiveLevel) -> Self {
        let mut led = Self {
            pin,
            active,
            is_on: true,
        };
        led.set(false);
        led
    }

    pub fn active_high(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::High)
    }

    pub fn active_low(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::Low)
    }

    pub fn set(&mut self, on: bool) {
        let drive_high = on == (self.active == ActiveLevel::High);
        if drive_high {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
        self.is_on = on;
    }

    #[inline]
    pub fn toggle(&mut self) {
        self.set(!self.is_on);
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }
}

/// Heartbeat half-period.
pub const HEARTBEAT_MS: u32 = 500;

pub struct StatusLeds<G: OutputPin, R: OutputPin> {
    heartbeat: Led<G>,
    fault: Led<R>,
    last_toggle: u32,
}

impl<G: OutputPin, R: OutputPin> StatusLeds<G, R> {
    pub fn new(heartbeat: Led<G>, fault: Led<R>, now: u32) -> Self {
        Self {
            heartbeat,
            fault,
            last_toggle: now,
        }
    }

    pub fn update(&mut self, now: u32, fault: bool) {
        if now.wrapping_sub(self.last_toggle) >= HEARTBEAT_MS {
            self.last_toggle = now;
            self.heartbeat.toggle();
        }
        if fault != self.fault.is_on() {
            self.fault.set(fault);
        }
    }
}
