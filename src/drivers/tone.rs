// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Square-wave tone on a passive buzzer, clocked by the pulse interrupt.
//!
//! Frequency resolution is limited by the interrupt period: the half-period is rounded to a whole
//! number of ticks.

use embedded_hal::digital::v2::OutputPin;

use crate::buzzer::ToneSink;
use crate::config::PULSE_INTERVAL_US;

pub struct ToneGenerator<PIN: OutputPin> {
    pin: PIN,
    tick_us: u32,
    half_period: u32,
    counter: u32,
    remaining: u32,
    high: bool,
}

impl<PIN: OutputPin> ToneGenerator<PIN> {
    pub fn new(mut pin: PIN) -> Self {
        pin.set_low().ok();
        Self {
            pin,
            tick_us: PULSE_INTERVAL_US,
            half_period: 0,
            counter: 0,
            remaining: 0,
            high: false,
        }
    }

    /// Start a tone, replacing any tone still playing. A zero frequency is silence.
    pub fn start(&mut self, freq_hz: u16, duration_ms: u32) {
        if freq_hz == 0 {
            self.silence();
            return;
        }
        let half_period_us = 500_000 / freq_hz as u32;
        self.half_period = (half_period_us / self.tick_us).max(1);
        self.remaining = duration_ms.saturating_mul(1000) / self.tick_us;
        self.counter = 0;
    }

    pub fn silence(&mut self) {
        self.remaining = 0;
        self.pin.set_low().ok();
        self.high = false;
    }

    /// Advance one interrupt period.
    pub fn tick(&mut self) {
        if self.remaining == 0 {
            if self.high {
                self.silence();
            }
            return;
        }
        self.remaining -= 1;
        self.counter += 1;
        if self.counter >= self.half_period {
            self.counter = 0;
            self.high = !self.high;
            if self.high {
                self.pin.set_high().ok();
            } else {
                self.pin.set_low().ok();
            }
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.remaining > 0
    }
}

impl<PIN: OutputPin> ToneSink for ToneGenerator<PIN> {
    fn tone(&mut self, freq_hz: u16, duration_ms: u32) {
        self.start(freq_hz, duration_ms);
    }
}
