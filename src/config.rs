// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Tuning constants and loop timing for the balancing robot.
//!
//! Everything that is fixed at build time lives here. Gains that can be changed over the command
//! link at runtime start from [`ControlGains::default`].
//!
//! ## Sign convention
//!
//! Velocities are in wheel-speed units (rad/s as reported by the pulse driver). On this chassis
//! chassis-forward travel shows up as *negative* wheel speed, so a forward command sets
//! `target_velocity = -CRUISE_SPEED`. The lean bias is added to the velocity correction before it
//! reaches the attitude loop.

// ----- Loop periods -----

/// Mode / autonomy dispatch (cadence A).
pub const DISPATCH_INTERVAL_MS: u32 = 100;
/// Fusion + attitude + heading loop (cadence B).
pub const INNER_INTERVAL_MS: u32 = 4;
/// Velocity loop (cadence C). Three inner ticks.
pub const OUTER_INTERVAL_MS: u32 = 12;
/// Diagnostics and telemetry (cadence D).
pub const DIAGNOSTIC_INTERVAL_MS: u32 = 50;
/// Stepper / tone / echo interrupt period.
pub const PULSE_INTERVAL_US: u32 = 20;

/// Gap between two inner ticks that gets reported as an overrun.
pub const INNER_OVERRUN_WARN_MS: u32 = 50;

/// Inner loop period in seconds.
pub const INNER_DT: f32 = INNER_INTERVAL_MS as f32 / 1000.0;

// ----- Sensor fusion -----

/// Complementary filter weight on the integrated gyro pitch.
pub const PITCH_ALPHA: f32 = 0.98;
/// Complementary filter weight on the integrated gyro yaw.
pub const YAW_ALPHA: f32 = 0.98;
/// Yaw wraps into `[-YAW_WRAP, YAW_WRAP]` (one full turn, rad).
pub const YAW_WRAP: f32 = core::f32::consts::TAU;
/// Below this yaw rate (rad/s) the robot is assumed still and drift is learned.
pub const YAW_STILL_RATE: f32 = 0.02;

// ----- Velocity loop -----

/// Low-pass coefficient on the velocity error (weight of the previous filtered error).
pub const VELOCITY_FILTER: f32 = 0.7;
/// Symmetric clamp on the velocity error integral.
pub const VELOCITY_INTEGRAL_MAX: f32 = 0.2;
/// |pitch| above which the velocity integral is reset.
pub const INTEGRAL_RESET_PITCH: f32 = 0.5;

// ----- Safety -----

/// |pitch| above which the fall interlock brakes both wheels.
pub const FALL_PITCH: f32 = 0.6;
/// Acceleration magnitude used while braking after a fall.
pub const BRAKE_ACCELERATION: f32 = 100.0;
/// Saturating wheel speed used as the bang-bang direction cue.
pub const WHEEL_SPEED_LIMIT: f32 = 20.0;
/// Acceleration the pulse drivers start with before the first loop output.
pub const INITIAL_ACCELERATION: f32 = 10.0;

// ----- Motion targets -----

/// Magnitude of the forward / backward cruise speed.
pub const CRUISE_SPEED: f32 = 1.3;
/// Heading step for a manual left / right command (rad).
pub const MANUAL_TURN_STEP: f32 = 1.0;
/// Heading change the autonomy sequencer performs when a target is found (rad).
pub const AUTONOMY_TURN_ANGLE: f32 = core::f32::consts::FRAC_PI_2;

// ----- Audible cues -----

/// One duration unit of a melody note.
pub const NOTE_UNIT_MS: u32 = 150;
/// Length of each emitted tone.
pub const TONE_LENGTH_MS: u32 = 150;
/// Hold time after the last note before a cue reports idle.
pub const CUE_HOLD_MS: u32 = 1000;

// ----- Range sensor -----

/// Stop when an obstacle is closer than this.
pub const RANGE_STOP_CM: f32 = 10.0;
/// Resume once the obstacle is at least this far away.
pub const RANGE_RESUME_CM: f32 = 12.0;

// ----- Telemetry -----

/// `velocity_ki = velocity_kp / VELOCITY_KI_RATIO` when only Kp is set.
pub const VELOCITY_KI_RATIO: f32 = 200.0;

/// Pending telemetry requests kept before the oldest is answered `busy`.
pub const TELEMETRY_QUEUE_DEPTH: usize = 4;

/// Runtime-tunable controller coefficients.
///
/// Field names match the variable names accepted over the command link.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControlGains {
    pub vertical_kp: f32,
    pub vertical_kd: f32,
    pub velocity_kp: f32,
    pub velocity_ki: f32,
    pub turn_kp: f32,
    pub turn_kd: f32,
    pub camera_kp: f32,
    pub camera_kd: f32,
    /// Upright lean bias (rad).
    pub bias: f32,
    /// Constant trim added to the heading-hold output.
    pub yaw_bias: f32,
}

impl ControlGains {
    /// Integral gain that goes with a given proportional velocity gain.
    #[inline]
    pub fn velocity_ki_for(kp: f32) -> f32 {
        kp / VELOCITY_KI_RATIO
    }
}

impl Default for ControlGains {
    fn default() -> Self {
        let velocity_kp = 0.04;
        Self {
            vertical_kp: 200.0,
            vertical_kd: 300.0,
            velocity_kp,
            velocity_ki: Self::velocity_ki_for(velocity_kp),
            turn_kp: -0.5,
            turn_kd: -1.0,
            camera_kp: 0.5,
            camera_kd: 1.0,
            bias: 0.04,
            yaw_bias: 0.0,
        }
    }
}
