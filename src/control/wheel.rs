// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Wheel commands and the hand-off to the pulse interrupt.
//!
//! The cooperative loop writes [`WheelCommand`]s; the pulse interrupt reads them at a fixed rate
//! and feeds them to the step generators. A command is two `f32`s per wheel, which cannot be
//! written atomically as a unit, so [`SharedWheelCommands`] keeps two slots and an active index:
//! the loop fills the inactive slot and then flips the index. The interrupt only ever reads the
//! active slot, and since it cannot be interrupted by the loop it always sees a complete pair.
//!
//! Measured speeds travel the other way through [`SharedWheelSpeeds`], one atomic word per wheel.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::config::INITIAL_ACCELERATION;

pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;

/// Command for one wheel's pulse driver.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct WheelCommand {
    /// Ramp rate toward `target_speed` (rad/s²); only the magnitude is used by the driver.
    pub acceleration: f32,
    /// Speed the driver ramps toward (rad/s).
    pub target_speed: f32,
}

impl WheelCommand {
    pub const fn new(acceleration: f32, target_speed: f32) -> Self {
        Self {
            acceleration,
            target_speed,
        }
    }
}

struct Slot {
    acceleration: [AtomicU32; 2],
    target_speed: [AtomicU32; 2],
}

/// Bit pattern of the ramp rate the drivers hold before the first publish.
const INITIAL_ACCELERATION_BITS: u32 = INITIAL_ACCELERATION.to_bits();

impl Slot {
    const fn new() -> Self {
        Self {
            acceleration: [
                AtomicU32::new(INITIAL_ACCELERATION_BITS),
                AtomicU32::new(INITIAL_ACCELERATION_BITS),
            ],
            target_speed: [AtomicU32::new(0), AtomicU32::new(0)],
        }
    }

    fn store(&self, commands: &[WheelCommand; 2]) {
        for (i, c) in commands.iter().enumerate() {
            self.acceleration[i].store(c.acceleration.to_bits(), Ordering::Relaxed);
            self.target_speed[i].store(c.target_speed.to_bits(), Ordering::Relaxed);
        }
    }

    fn load(&self) -> [WheelCommand; 2] {
        let wheel = |i: usize| WheelCommand {
            acceleration: f32::from_bits(self.acceleration[i].load(Ordering::Relaxed)),
            target_speed: f32::from_bits(self.target_speed[i].load(Ordering::Relaxed)),
        };
        [wheel(LEFT), wheel(RIGHT)]
    }
}

/// Double-buffered wheel commands. Single writer (loop), single reader (interrupt).
pub struct SharedWheelCommands {
    slots: [Slot; 2],
    active: AtomicU8,
}

impl SharedWheelCommands {
    pub const fn new() -> Self {
        Self {
            slots: [Slot::new(), Slot::new()],
            active: AtomicU8::new(0),
        }
    }

    /// Publish a new pair of commands. Must only be called from one context.
    pub fn publish(&self, commands: &[WheelCommand; 2]) {
        let next = self.active.load(Ordering::Relaxed) ^ 1;
        self.slots[next as usize].store(commands);
        self.active.store(next, Ordering::Release);
    }

    /// Most recently published pair.
    pub fn latest(&self) -> [WheelCommand; 2] {
        let active = self.active.load(Ordering::Acquire);
        self.slots[active as usize].load()
    }
}

impl Default for SharedWheelCommands {
    fn default() -> Self {
        Self::new()
    }
}

/// Wheel speeds published by the pulse interrupt.
pub struct SharedWheelSpeeds {
    speeds: [AtomicU32; 2],
}

impl SharedWheelSpeeds {
    pub const fn new() -> Self {
        Self {
            speeds: [AtomicU32::new(0), AtomicU32::new(0)],
        }
    }

    #[inline]
    pub fn store(&self, wheel: usize, speed: f32) {
        self.speeds[wheel].store(speed.to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> [f32; 2] {
        [
            f32::from_bits(self.speeds[LEFT].load(Ordering::Relaxed)),
            f32::from_bits(self.speeds[RIGHT].load(Ordering::Relaxed)),
        ]
    }
}

impl Default for SharedWheelSpeeds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_rest_with_the_initial_ramp() {
        let shared = SharedWheelCommands::new();
        assert_eq!(
            shared.latest(),
            [WheelCommand::new(INITIAL_ACCELERATION, 0.0); 2]
        );
    }

    #[test]
    fn latest_returns_last_published_pair() {
        let shared = SharedWheelCommands::new();
        let a = [WheelCommand::new(3.0, -20.0), WheelCommand::new(1.0, -20.0)];
        let b = [WheelCommand::new(-2.0, 20.0), WheelCommand::new(4.0, -20.0)];

        shared.publish(&a);
        assert_eq!(shared.latest(), a);
        shared.publish(&b);
        assert_eq!(shared.latest(), b);
        shared.publish(&a);
        assert_eq!(shared.latest(), a);
    }

    #[test]
    fn speeds_round_trip_per_wheel() {
        let speeds = SharedWheelSpeeds::new();
        speeds.store(LEFT, 1.25);
        speeds.store(RIGHT, -0.5);
        assert_eq!(speeds.load(), [1.25, -0.5]);
    }
}
