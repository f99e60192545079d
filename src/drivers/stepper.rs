// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! STEP/DIR stepper pulse generator.
//!
//! [`Stepper::step`] is called once per pulse-interrupt period. Each call ramps the current speed
//! toward the target at the commanded acceleration, integrates position in fractional steps, and
//! raises STEP for exactly one period whenever a whole step has accumulated. STEP is always low
//! for at least one period between pulses, so the step rate tops out at half the interrupt rate.
//!
//! Speeds and accelerations are in wheel radians.

#[allow(unused_imports)]
use micromath::F32Ext;

use embedded_hal::digital::v2::OutputPin;

use crate::config::{INITIAL_ACCELERATION, PULSE_INTERVAL_US};

/// Full steps per revolution times microstepping.
pub const STEPS_PER_REV: f32 = 200.0 * 16.0;

/// Primitive the pulse interrupt needs from a wheel drive.
pub trait PulseDriver {
    /// Ramp rate in rad/s²; only the magnitude is used.
    fn set_acceleration(&mut self, acceleration: f32);
    /// Speed to ramp toward, in rad/s.
    fn set_target_speed(&mut self, speed: f32);
    /// Current commanded speed, in rad/s.
    fn speed(&self) -> f32;
    /// Advance one interrupt period.
    fn step(&mut self);
}

pub struct Stepper<STEP: OutputPin, DIR: OutputPin> {
    step_pin: STEP,
    dir_pin: DIR,

    dt: f32,
    steps_per_rad: f32,
    acceleration: f32,
    target_speed: f32,
    speed: f32,

    /// Fractional steps not yet emitted.
    phase: f32,
    position: i32,
    pulse_high: bool,
    forward: bool,
}

impl<STEP: OutputPin, DIR: OutputPin> Stepper<STEP, DIR> {
    pub fn new(mut step_pin: STEP, mut dir_pin: DIR) -> Self {
        step_pin.set_low().ok();
        dir_pin.set_high().ok();
        Self {
            step_pin,
            dir_pin,
            dt: PULSE_INTERVAL_US as f32 * 1e-6,
            steps_per_rad: STEPS_PER_REV / core::f32::consts::TAU,
            acceleration: INITIAL_ACCELERATION,
            target_speed: 0.0,
            speed: 0.0,
            phase: 0.0,
            position: 0,
            pulse_high: false,
            forward: true,
        }
    }

    /// Set the interrupt period in microseconds.
    pub fn with_interval_us(mut self, interval_us: u32) -> Self {
        self.dt = interval_us as f32 * 1e-6;
        self
    }

    pub fn with_steps_per_rev(mut self, steps: f32) -> Self {
        self.steps_per_rad = steps / core::f32::consts::TAU;
        self
    }

    /// Net steps emitted since construction.
    #[inline]
    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn free(self) -> (STEP, DIR) {
        (self.step_pin, self.dir_pin)
    }

    fn ramp(&mut self) {
        let delta = self.acceleration * self.dt;
        if self.speed < self.target_speed {
            self.speed = (self.speed + delta).min(self.target_speed);
        } else if self.speed > self.target_speed {
            self.speed = (self.speed - delta).max(self.target_speed);
        }
    }

    fn set_direction(&mut self, forward: bool) {
        if forward != self.forward {
            self.forward = forward;
            if forward {
                self.dir_pin.set_high().ok();
            } else {
                self.dir_pin.set_low().ok();
            }
        }
    }
}

impl<STEP: OutputPin, DIR: OutputPin> PulseDriver for Stepper<STEP, DIR> {
    fn set_acceleration(&mut self, acceleration: f32) {
        self.acceleration = acceleration.abs();
    }

    fn set_target_speed(&mut self, speed: f32) {
        self.target_speed = speed;
    }

    #[inline]
    fn speed(&self) -> f32 {
        self.speed
    }

    fn step(&mut self) {
        self.ramp();
        self.phase += self.speed * self.dt * self.steps_per_rad;

        if self.pulse_high {
            self.step_pin.set_low().ok();
            self.pulse_high = false;
            return;
        }

        if self.phase >= 1.0 {
            self.phase -= 1.0;
            self.position += 1;
            self.set_direction(true);
        } else if self.phase <= -1.0 {
            self.phase += 1.0;
            self.position -= 1;
            self.set_direction(false);
        } else {
            return;
        }
        self.step_pin.set_high().ok();
        self.pulse_high = true;
    }
}
