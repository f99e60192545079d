// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! HC-SR04 style ultrasonic ranger, polled from the pulse interrupt.
//!
//! | Phase     | Ticks                          |
//! |-----------|--------------------------------|
//! | trigger   | TRIG high for one tick         |
//! | wait      | until ECHO rises, or timeout   |
//! | measure   | count ticks while ECHO is high |
//! | rest      | until the next cycle           |
//!
//! Nothing here busy-waits; each call to [`EchoRanger::tick`] does at most one pin access.

use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::config::PULSE_INTERVAL_US;

/// Time between trigger pulses.
pub const CYCLE_US: u32 = 60_000;
/// Longest echo worth waiting for (~4 m).
pub const ECHO_TIMEOUT_US: u32 = 25_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Trigger,
    Wait { ticks: u32 },
    Measure { ticks: u32 },
    Rest { ticks: u32 },
}

pub struct EchoRanger<TRIG: OutputPin, ECHO: InputPin> {
    trig: TRIG,
    echo: ECHO,
    tick_us: u32,
    phase: Phase,
    latest: Option<u32>,
}

impl<TRIG: OutputPin, ECHO: InputPin> EchoRanger<TRIG, ECHO> {
    pub fn new(mut trig: TRIG, echo: ECHO) -> Self {
        trig.set_low().ok();
        Self {
            trig,
            echo,
            tick_us: PULSE_INTERVAL_US,
            phase: Phase::Rest { ticks: 0 },
            latest: None,
        }
    }

    fn echo_high(&self) -> bool {
        self.echo.is_high().unwrap_or(false)
    }

    /// Advance one interrupt period.
    pub fn tick(&mut self) {
        let to_ticks = |us: u32| us / self.tick_us;
        self.phase = match self.phase {
            Phase::Rest { ticks } => {
                if ticks + 1 >= to_ticks(CYCLE_US) {
                    self.trig.set_high().ok();
                    Phase::Trigger
                } else {
                    Phase::Rest { ticks: ticks + 1 }
                }
            }
            Phase::Trigger => {
                self.trig.set_low().ok();
                Phase::Wait { ticks: 0 }
            }
            Phase::Wait { ticks } => {
                if self.echo_high() {
                    Phase::Measure { ticks: 1 }
                } else if ticks + 1 >= to_ticks(ECHO_TIMEOUT_US) {
                    Phase::Rest { ticks: ticks + 1 }
                } else {
                    Phase::Wait { ticks: ticks + 1 }
                }
            }
            Phase::Measure { ticks } => {
                if self.echo_high() && ticks * self.tick_us < ECHO_TIMEOUT_US {
                    Phase::Measure { ticks: ticks + 1 }
                } else {
                    self.latest = Some(ticks * self.tick_us);
                    Phase::Rest { ticks }
                }
            }
        };
    }

    /// Take the most recent echo time in microseconds, if a new one has completed.
    pub fn take_echo(&mut self) -> Option<u32> {
        self.latest.take()
    }

    pub fn free(self) -> (TRIG, ECHO) {
        (self.trig, self.echo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Line(Rc<Cell<bool>>);

    impl OutputPin for Line {
        type Error = Infallible;
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.set(true);
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.set(false);
            Ok(())
        }
    }

    impl InputPin for Line {
        type Error = Infallible;
        fn is_high(&self) -> Result<bool, Infallible> {
            Ok(self.0.get())
        }
        fn is_low(&self) -> Result<bool, Infallible> {
            Ok(!self.0.get())
        }
    }

    /// Simulated sensor: echo goes high `delay` ticks after trigger falls, for `width` ticks.
    fn run_cycle(delay: u32, width: u32) -> Option<u32> {
        let trig = Line::default();
        let echo = Line::default();
        let mut r = EchoRanger::new(trig.clone(), echo.clone());

        let mut since_trigger: Option<u32> = None;
        let mut was_high = false;
        for _ in 0..(CYCLE_US + ECHO_TIMEOUT_US) / PULSE_INTERVAL_US + 10 {
            r.tick();
            let high = trig.0.get();
            if was_high && !high {
                since_trigger = Some(0);
            }
            was_high = high;

            if let Some(t) = since_trigger.as_mut() {
                *t += 1;
                echo.0.set(*t > delay && *t <= delay + width);
            }
            if let Some(us) = r.take_echo() {
                return Some(us);
            }
        }
        None
    }

    #[test]
    fn measures_echo_width() {
        // 600 µs echo is ~10 cm.
        let us = run_cycle(5, 30).unwrap();
        assert!((580..=620).contains(&us));
    }

    #[test]
    fn missing_echo_times_out_silently() {
        assert_eq!(run_cycle(u32::MAX / 2, 0), None);
    }
}
