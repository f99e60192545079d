// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Command and response types for the remote link.
//!
//! Requests are ASCII lines (see [`parser`](crate::protocol::parser)). Responses are ASCII lines
//! too, except telemetry, which goes out as a binary frame:
//!
//! | Byte(s) | Content                                   |
//! |---------|-------------------------------------------|
//! | 0       | [`START_BYTE`]                            |
//! | 1       | [`MSG_TELEMETRY`]                         |
//! | 2..14   | pitch, average wheel velocity, yaw (LE f32) |
//! | 14      | wrapping sum of bytes 1..14               |

use core::fmt::{self, Write};

use crate::autonomy::ManualCommand;
use crate::protocol::telemetry::{TelemetryRecord, TELEMETRY_LEN};
use crate::protocol::variables::{VariableId, VariablesDoc};
use crate::state::Mode;

/// Sync byte for binary frames.
pub const START_BYTE: u8 = 0xA5;

// Message IDs
pub const MSG_TELEMETRY: u8 = 0x10;

/// Largest encoded response.
pub const RESPONSE_CAPACITY: usize = 512;

pub type ResponseBuf = heapless::Vec<u8, RESPONSE_CAPACITY>;

/// Parsed request from the link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Set(VariableId, f32),
    SwitchToAuto,
    SwitchToManual,
    SwitchToStop,
    Manual(ManualCommand),
    Camera { rho: f32, theta: f32 },
    Color(bool),
    GetVariables,
    Telemetry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    TooLong,
    Malformed,
    UnknownCommand,
    UnknownVariable,
    InvalidValue,
    NotManual,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandError::Empty => "empty command",
            CommandError::TooLong => "line too long",
            CommandError::Malformed => "malformed command",
            CommandError::UnknownCommand => "unknown command",
            CommandError::UnknownVariable => "unknown variable",
            CommandError::InvalidValue => "invalid value",
            CommandError::NotManual => "not in manual mode",
        })
    }
}

/// What a successful command did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ack {
    Set(VariableId, f32),
    Mode(Mode),
    Manual(ManualCommand),
    Camera,
    Color(bool),
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ack::Set(id, value) => write!(f, "{}={}", id.name(), value),
            Ack::Mode(Mode::Automatic) => f.write_str("switched to auto"),
            Ack::Mode(Mode::Manual | Mode::AutoToManual) => f.write_str("switched to manual"),
            Ack::Mode(Mode::Stop) => f.write_str("switched to stop"),
            Ack::Manual(cmd) => f.write_str(cmd.name()),
            Ack::Camera => f.write_str("camera"),
            Ack::Color(detected) => write!(f, "color {}", detected),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    Ok(Ack),
    Error(CommandError),
    Busy,
    Variables(VariablesDoc),
    Telemetry(TelemetryRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeError;

impl From<fmt::Error> for EncodeError {
    fn from(_: fmt::Error) -> Self {
        EncodeError
    }
}

struct LineWriter<'a>(&'a mut ResponseBuf);

impl Write for LineWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl Response {
    /// Serialize for the wire.
    pub fn encode(&self) -> Result<ResponseBuf, EncodeError> {
        let mut out = ResponseBuf::new();
        match self {
            Response::Ok(ack) => writeln!(LineWriter(&mut out), "ok {}", ack)?,
            Response::Error(err) => writeln!(LineWriter(&mut out), "err {}", err)?,
            Response::Busy => writeln!(LineWriter(&mut out), "busy")?,
            Response::Variables(doc) => {
                out.resize_default(RESPONSE_CAPACITY).map_err(|_| EncodeError)?;
                let n = serde_json_core::to_slice(doc, &mut out).map_err(|_| EncodeError)?;
                out.truncate(n);
                out.push(b'\n').map_err(|_| EncodeError)?;
            }
            Response::Telemetry(record) => {
                let payload = record.to_bytes();
                let checksum = telemetry_checksum(&payload);
                out.push(START_BYTE).map_err(|_| EncodeError)?;
                out.push(MSG_TELEMETRY).map_err(|_| EncodeError)?;
                out.extend_from_slice(&payload).map_err(|_| EncodeError)?;
                out.push(checksum).map_err(|_| EncodeError)?;
            }
        }
        Ok(out)
    }
}

/// Wrapping sum of the message ID and payload.
pub fn telemetry_checksum(payload: &[u8; TELEMETRY_LEN]) -> u8 {
    payload.iter().fold(MSG_TELEMETRY, |sum, b| sum.wrapping_add(*b))
}
