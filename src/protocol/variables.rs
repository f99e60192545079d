// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Remotely settable variables.
//!
//! Every name the link may assign is listed once in [`REGISTRY`] together with its setter, so an
//! unknown name can never reach the context.

use serde::Serialize;

use crate::config::{ControlGains, VELOCITY_KI_RATIO};
use crate::protocol::messages::CommandError;
use crate::state::{ControlContext, Mode};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VariableId {
    VerticalKp,
    VerticalKd,
    VelocityKp,
    VelocityKi,
    TurnKp,
    TurnKd,
    CameraKp,
    CameraKd,
    TargetVelocity,
    TargetAngle,
    Bias,
    YawBias,
    Tracking,
    ColorDetected,
}

type Setter = fn(&mut ControlContext, f32);

struct Entry {
    name: &'static str,
    id: VariableId,
    set: Setter,
}

fn flag(value: f32) -> bool {
    value == 1.0
}

static REGISTRY: [Entry; 14] = [
    Entry { name: "vertical_kp", id: VariableId::VerticalKp, set: |c, v| c.gains.vertical_kp = v },
    Entry { name: "vertical_kd", id: VariableId::VerticalKd, set: |c, v| c.gains.vertical_kd = v },
    Entry {
        name: "velocity_kp",
        id: VariableId::VelocityKp,
        set: |c, v| {
            c.gains.velocity_kp = v;
            c.gains.velocity_ki = ControlGains::velocity_ki_for(v);
        },
    },
    Entry { name: "velocity_ki", id: VariableId::VelocityKi, set: |c, v| c.gains.velocity_ki = v },
    Entry { name: "turn_kp", id: VariableId::TurnKp, set: |c, v| c.gains.turn_kp = v },
    Entry { name: "turn_kd", id: VariableId::TurnKd, set: |c, v| c.gains.turn_kd = v },
    Entry { name: "camera_kp", id: VariableId::CameraKp, set: |c, v| c.gains.camera_kp = v },
    Entry { name: "camera_kd", id: VariableId::CameraKd, set: |c, v| c.gains.camera_kd = v },
    Entry {
        name: "target_velocity",
        id: VariableId::TargetVelocity,
        set: |c, v| c.target.target_velocity = v,
    },
    Entry {
        name: "target_angle",
        id: VariableId::TargetAngle,
        set: |c, v| c.target.target_heading = v,
    },
    Entry { name: "bias", id: VariableId::Bias, set: |c, v| c.gains.bias = v },
    Entry { name: "yaw_bias", id: VariableId::YawBias, set: |c, v| c.gains.yaw_bias = v },
    Entry {
        name: "tracking",
        id: VariableId::Tracking,
        set: |c, v| c.target.tracking_enabled = flag(v),
    },
    Entry {
        name: "color_detected",
        id: VariableId::ColorDetected,
        set: |c, v| c.target_detected = flag(v),
    },
];

impl VariableId {
    /// Look up a variable by its exact wire name.
    pub fn from_name(name: &str) -> Result<Self, CommandError> {
        REGISTRY
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.id)
            .ok_or(CommandError::UnknownVariable)
    }

    fn entry(&self) -> &'static Entry {
        // Registry order matches declaration order.
        &REGISTRY[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.entry().name
    }

    /// Validate and write `value`. Nothing changes if the value is rejected.
    pub fn apply(&self, ctx: &mut ControlContext, value: f32) -> Result<(), CommandError> {
        if !value.is_finite() {
            return Err(CommandError::InvalidValue);
        }
        (self.entry().set)(ctx, value);
        Ok(())
    }

    pub fn all() -> impl Iterator<Item = VariableId> {
        REGISTRY.iter().map(|e| e.id)
    }
}

/// Read-back of every variable plus the active mode.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct VariablesDoc {
    pub vertical_kp: f32,
    pub vertical_kd: f32,
    pub velocity_kp: f32,
    pub velocity_ki: f32,
    pub turn_kp: f32,
    pub turn_kd: f32,
    pub camera_kp: f32,
    pub camera_kd: f32,
    pub target_velocity: f32,
    pub target_angle: f32,
    pub bias: f32,
    pub yaw_bias: f32,
    pub tracking: bool,
    pub color_detected: bool,
    pub mode: &'static str,
}

impl VariablesDoc {
    pub fn from_context(ctx: &ControlContext) -> Self {
        let g = &ctx.gains;
        Self {
            vertical_kp: g.vertical_kp,
            vertical_kd: g.vertical_kd,
            velocity_kp: g.velocity_kp,
            velocity_ki: g.velocity_ki,
            turn_kp: g.turn_kp,
            turn_kd: g.turn_kd,
            camera_kp: g.camera_kp,
            camera_kd: g.camera_kd,
            target_velocity: ctx.target.target_velocity,
            target_angle: ctx.target.target_heading,
            bias: g.bias,
            yaw_bias: g.yaw_bias,
            tracking: ctx.target.tracking_enabled,
            color_detected: ctx.target_detected,
            mode: mode_name(ctx.mode),
        }
    }
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Automatic => "auto",
        Mode::Manual => "manual",
        Mode::AutoToManual => "auto_to_manual",
        Mode::Stop => "stop",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_in_declaration_order() {
        for (i, id) in VariableId::all().enumerate() {
            assert_eq!(id as usize, i);
            assert_eq!(VariableId::from_name(id.name()), Ok(id));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(VariableId::from_name("kp"), Err(CommandError::UnknownVariable));
        assert_eq!(VariableId::from_name("Bias"), Err(CommandError::UnknownVariable));
        assert_eq!(VariableId::from_name(""), Err(CommandError::UnknownVariable));
    }

    #[test]
    fn velocity_kp_also_sets_ki() {
        let mut ctx = ControlContext::default();
        VariableId::VelocityKp.apply(&mut ctx, 0.02).unwrap();
        assert_eq!(ctx.gains.velocity_kp, 0.02);
        assert!((ctx.gains.velocity_ki - 0.02 / VELOCITY_KI_RATIO).abs() < 1e-9);

        VariableId::VelocityKi.apply(&mut ctx, 0.5).unwrap();
        assert_eq!(ctx.gains.velocity_ki, 0.5);
        assert_eq!(ctx.gains.velocity_kp, 0.02);
    }

    #[test]
    fn flags_are_true_only_for_one() {
        let mut ctx = ControlContext::default();
        VariableId::Tracking.apply(&mut ctx, 1.0).unwrap();
        assert!(ctx.target.tracking_enabled);
        VariableId::Tracking.apply(&mut ctx, 2.0).unwrap();
        assert!(!ctx.target.tracking_enabled);

        VariableId::ColorDetected.apply(&mut ctx, 1.0).unwrap();
        assert!(ctx.target_detected);
    }

    #[test]
    fn non_finite_values_change_nothing() {
        let mut ctx = ControlContext::default();
        let before = ctx.gains;
        assert_eq!(
            VariableId::VerticalKp.apply(&mut ctx, f32::NAN),
            Err(CommandError::InvalidValue)
        );
        assert_eq!(
            VariableId::Bias.apply(&mut ctx, f32::INFINITY),
            Err(CommandError::InvalidValue)
        );
        assert_eq!(ctx.gains, before);
    }

    #[test]
    fn doc_reflects_context() {
        let mut ctx = ControlContext::new(Mode::Manual);
        ctx.target.target_heading = 1.5;
        ctx.target_detected = true;
        let doc = VariablesDoc::from_context(&ctx);
        assert_eq!(doc.target_angle, 1.5);
        assert!(doc.color_detected);
        assert_eq!(doc.mode, "manual");
        assert_eq!(doc.vertical_kp, ControlGains::default().vertical_kp);
    }
}
