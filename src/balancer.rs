// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Top-level control task.
//!
//! [`Balancer`] owns every estimator, loop and state machine, and runs them from
//! [`Balancer::poll`] in the cooperative main loop. Hardware is reached only through the
//! [`Hardware`] trait, so the whole cascade runs against a mock in tests.
//!
//! Order of work inside one inner tick:
//!
//! 1. fusion (a rejected sample holds the previous estimate)
//! 2. heading loop, consuming the vision bearing
//! 3. on outer ticks: range stop, then velocity loop
//! 4. attitude loop on `bias + velocity correction`
//! 5. integral reset past the fall angle, mixer with fall interlock, publish to the wheels

#[allow(unused_imports)]
use micromath::F32Ext;

use log::{debug, info, warn};

use crate::autonomy::{AutonomyState, Dispatcher};
use crate::buzzer::{CuePlayer, ToneSink};
#[cfg(feature = "range-stop")]
use crate::buzzer::Cue;
use crate::config::{FALL_PITCH, INNER_DT};
use crate::control::{
    AttitudeController, HeadingController, MotionMixer, VelocityController, WheelCommand,
};
use crate::protocol::{
    Ack, Command, CommandError, LineParser, Response, TelemetryQueue, TelemetryRecord, VariableId,
    VariablesDoc,
};
use crate::scheduler::LoopScheduler;
#[cfg(feature = "range-stop")]
use crate::sensor::{RangeEvent, RangeGuard};
use crate::sensor::{Estimate, Imu, SensorFusion};
use crate::state::{ControlContext, Mode};

/// Everything the control task needs from the board.
pub trait Hardware: Imu + ToneSink {
    /// Latest measured wheel speeds (rad/s), left then right.
    fn wheel_speeds(&mut self) -> [f32; 2];

    /// Hand new commands to the pulse interrupt.
    fn write_wheels(&mut self, commands: &[WheelCommand; 2]);

    /// Most recent completed echo, if a new one is available.
    fn range_echo_us(&mut self) -> Option<u32>;

    /// Send a response on the command link.
    fn respond(&mut self, response: &Response);

    /// Drive the fault indicator.
    fn fault_indicator(&mut self, _on: bool) {}
}

pub struct Balancer {
    ctx: ControlContext,
    scheduler: LoopScheduler,
    fusion: SensorFusion,
    attitude: AttitudeController,
    velocity: VelocityController,
    heading: HeadingController,
    mixer: MotionMixer,
    dispatcher: Dispatcher,
    cues: CuePlayer,
    parser: LineParser,
    telemetry: TelemetryQueue,
    #[cfg(feature = "range-stop")]
    range: RangeGuard,
    #[cfg(feature = "range-stop")]
    held_velocity: Option<f32>,

    estimate: Estimate,
    wheel_speeds: [f32; 2],
    sensor_fault: bool,
}

impl Balancer {
    pub fn new(now: u32) -> Self {
        Self::with_context(now, ControlContext::default())
    }

    pub fn with_context(now: u32, ctx: ControlContext) -> Self {
        Self {
            ctx,
            scheduler: LoopScheduler::new(now),
            fusion: SensorFusion::new(INNER_DT),
            attitude: AttitudeController::default(),
            velocity: VelocityController::new(),
            heading: HeadingController::new(),
            mixer: MotionMixer::default(),
            dispatcher: Dispatcher::new(),
            cues: CuePlayer::new(),
            parser: LineParser::new(),
            telemetry: TelemetryQueue::new(),
            #[cfg(feature = "range-stop")]
            range: RangeGuard::default(),
            #[cfg(feature = "range-stop")]
            held_velocity: None,
            estimate: Estimate::default(),
            wheel_speeds: [0.0; 2],
            sensor_fault: false,
        }
    }

    /// One pass of the cooperative loop. Never blocks.
    pub fn poll<H: Hardware>(&mut self, now: u32, hw: &mut H) {
        self.cues.update(now, hw);

        let due = self.scheduler.poll(now);

        if due.dispatch {
            self.dispatcher
                .dispatch(&mut self.ctx, self.estimate.yaw, &mut self.cues, now);
        }

        if due.inner {
            self.inner_tick(due.outer, now, hw);
        }

        if due.diagnostic {
            self.diagnostic_tick(hw);
        }
    }

    fn inner_tick<H: Hardware>(&mut self, outer: bool, now: u32, hw: &mut H) {
        self.update_estimate(hw);
        let est = self.estimate;

        let bearing = self.ctx.vision.take();
        let turn = self
            .heading
            .update(&self.ctx.target, est.yaw, est.yaw_rate, bearing, &self.ctx.gains);

        if outer {
            self.wheel_speeds = hw.wheel_speeds();
            #[cfg(feature = "range-stop")]
            self.range_tick(now, hw);
            self.velocity.update(
                self.ctx.target.target_velocity,
                self.wheel_speeds,
                est.pitch,
                &self.ctx.gains,
            );
        }
        #[cfg(not(feature = "range-stop"))]
        let _ = now;

        let lean = self.ctx.gains.bias + self.velocity.output();
        let vertical = self
            .attitude
            .update(lean, est.pitch, est.pitch_rate, &self.ctx.gains);

        if est.pitch.abs() > FALL_PITCH {
            self.velocity.reset_integral();
        }

        let was_braking = self.mixer.is_braking();
        let commands = self.mixer.mix(vertical, turn, est.pitch);
        match (was_braking, self.mixer.is_braking()) {
            (false, true) => warn!("fall interlock engaged at pitch {}", est.pitch),
            (true, false) => info!("fall interlock released"),
            _ => {}
        }

        hw.write_wheels(&commands);
        hw.fault_indicator(self.sensor_fault || self.mixer.is_braking());
    }

    fn update_estimate<H: Hardware>(&mut self, hw: &mut H) {
        let result = hw.read().and_then(|sample| self.fusion.update(&sample));
        match result {
            Ok(est) => {
                if self.sensor_fault {
                    info!("sensor recovered");
                }
                self.sensor_fault = false;
                self.estimate = est;
            }
            Err(e) => {
                if !self.sensor_fault {
                    warn!("sensor fault: {}", e);
                }
                self.sensor_fault = true;
                self.estimate = self.fusion.estimate();
            }
        }
    }

    #[cfg(feature = "range-stop")]
    fn range_tick<H: Hardware>(&mut self, now: u32, hw: &mut H) {
        if let Some(echo) = hw.range_echo_us() {
            match self.range.update(echo) {
                Some(RangeEvent::Blocked) => {
                    info!("range: obstacle, stopping");
                    self.held_velocity = Some(self.ctx.target.target_velocity);
                    self.cues.start(Cue::Alarm, now);
                }
                Some(RangeEvent::Cleared) => {
                    info!("range: clear, resuming");
                    if self.cues.current() == Some(Cue::Alarm) {
                        self.cues.stop();
                    }
                    if let Some(v) = self.held_velocity.take() {
                        self.ctx.target.target_velocity = v;
                    }
                }
                None => {}
            }
        }

        if self.range.is_blocked() {
            self.ctx.target.target_velocity = 0.0;
        }
    }

    /// A newer motion request supersedes the velocity saved by the range stop.
    fn forget_held_velocity(&mut self) {
        #[cfg(feature = "range-stop")]
        if self.held_velocity.take().is_some() {
            debug!("range: held velocity superseded");
        }
    }

    fn diagnostic_tick<H: Hardware>(&mut self, hw: &mut H) {
        if let Some(req) = self.telemetry.pop() {
            debug!("telemetry #{}", req.seq);
            hw.respond(&Response::Telemetry(self.telemetry_record()));
        }
        debug!(
            "pitch={} yaw={} v={} mode={:?}",
            self.estimate.pitch,
            self.estimate.yaw,
            self.velocity.output(),
            self.ctx.mode
        );
    }

    /// Feed one byte from the command link. Responds once a line is complete.
    pub fn receive<H: Hardware>(&mut self, byte: u8, hw: &mut H) {
        let response = match self.parser.push(byte) {
            None => return,
            Some(Ok(cmd)) => self.handle_command(cmd),
            Some(Err(e)) => Some(Response::Error(e)),
        };
        if let Some(r) = response {
            if let Response::Error(e) = r {
                warn!("command rejected: {}", e);
            }
            hw.respond(&r);
        }
    }

    /// Apply one command. Returns the immediate response, if any.
    pub fn handle_command(&mut self, cmd: Command) -> Option<Response> {
        if matches!(
            cmd,
            Command::Set(VariableId::TargetVelocity, _)
                | Command::SwitchToAuto
                | Command::SwitchToManual
                | Command::SwitchToStop
        ) || (matches!(cmd, Command::Manual(_))
            && matches!(self.ctx.mode, Mode::Manual | Mode::AutoToManual))
        {
            self.forget_held_velocity();
        }

        let response = match cmd {
            Command::Set(id, value) => match id.apply(&mut self.ctx, value) {
                Ok(()) => Response::Ok(Ack::Set(id, value)),
                Err(e) => Response::Error(e),
            },
            Command::SwitchToAuto => {
                self.dispatcher.switch_to_auto(&mut self.ctx);
                Response::Ok(Ack::Mode(Mode::Automatic))
            }
            Command::SwitchToManual => {
                self.dispatcher.switch_to_manual(&mut self.ctx);
                Response::Ok(Ack::Mode(Mode::Manual))
            }
            Command::SwitchToStop => {
                self.dispatcher.switch_to_stop(&mut self.ctx);
                Response::Ok(Ack::Mode(Mode::Stop))
            }
            Command::Manual(m) => {
                if matches!(self.ctx.mode, Mode::Manual | Mode::AutoToManual) {
                    self.dispatcher.queue_manual(m);
                    Response::Ok(Ack::Manual(m))
                } else {
                    Response::Error(CommandError::NotManual)
                }
            }
            Command::Camera { rho, theta } => {
                self.ctx.vision.set(rho, theta);
                Response::Ok(Ack::Camera)
            }
            Command::Color(detected) => {
                self.ctx.target_detected = detected;
                Response::Ok(Ack::Color(detected))
            }
            Command::GetVariables => Response::Variables(VariablesDoc::from_context(&self.ctx)),
            Command::Telemetry => {
                // Served later on a diagnostic tick; only a dropped request is answered now.
                let dropped = self.telemetry.push()?;
                debug!("telemetry #{} dropped", dropped.seq);
                Response::Busy
            }
        };
        Some(response)
    }

    fn telemetry_record(&self) -> TelemetryRecord {
        TelemetryRecord {
            pitch: self.estimate.pitch,
            average_wheel_velocity: (self.wheel_speeds[0] + self.wheel_speeds[1]) / 2.0,
            yaw: self.estimate.yaw,
        }
    }

    #[inline]
    pub fn context(&self) -> &ControlContext {
        &self.ctx
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut ControlContext {
        &mut self.ctx
    }

    #[inline]
    pub fn estimate(&self) -> Estimate {
        self.estimate
    }

    #[inline]
    pub fn sensor_fault(&self) -> bool {
        self.sensor_fault
    }

    #[inline]
    pub fn is_braking(&self) -> bool {
        self.mixer.is_braking()
    }

    #[inline]
    pub fn velocity(&self) -> &VelocityController {
        &self.velocity
    }

    #[inline]
    pub fn autonomy_state(&self) -> AutonomyState {
        self.dispatcher.autonomy_state()
    }

    #[inline]
    pub fn cues(&self) -> &CuePlayer {
        &self.cues
    }

    #[inline]
    pub fn overruns(&self) -> u32 {
        self.scheduler.overruns()
    }
}
