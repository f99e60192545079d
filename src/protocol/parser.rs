// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Line parser for the remote command link.
//!
//! Bytes are fed one at a time as they arrive from the UART. A command is complete at `\n`; `\r`
//! is dropped so either line ending works. Lines longer than [`MAX_LINE`] are discarded up to the
//! next newline and reported once as [`CommandError::TooLong`].
//!
//! | Line                     | Command                     |
//! |--------------------------|-----------------------------|
//! | `<name>=<value>`         | [`Command::Set`]            |
//! | `switch_to_auto`         | [`Command::SwitchToAuto`]   |
//! | `switch_to_manual`       | [`Command::SwitchToManual`] |
//! | `switch_to_stop`         | [`Command::SwitchToStop`]   |
//! | `forward` ... `stop`     | [`Command::Manual`]         |
//! | `camera <rho> <theta>`   | [`Command::Camera`]         |
//! | `color <true\|false>`    | [`Command::Color`]          |
//! | `get`                    | [`Command::GetVariables`]   |
//! | `data`                   | [`Command::Telemetry`]      |

use crate::autonomy::ManualCommand;
use crate::protocol::messages::{Command, CommandError};
use crate::protocol::variables::VariableId;

pub const MAX_LINE: usize = 64;

pub struct LineParser {
    buf: heapless::Vec<u8, MAX_LINE>,
    overflow: bool,
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            overflow: false,
        }
    }

    /// Process a single incoming byte. Returns a result once a non-empty line is complete.
    pub fn push(&mut self, byte: u8) -> Option<Result<Command, CommandError>> {
        match byte {
            b'\r' => None,
            b'\n' => {
                let overflow = core::mem::replace(&mut self.overflow, false);
                let result = if overflow {
                    Some(Err(CommandError::TooLong))
                } else if self.buf.iter().all(u8::is_ascii_whitespace) {
                    None
                } else {
                    Some(match core::str::from_utf8(&self.buf) {
                        Ok(line) => parse_line(line),
                        Err(_) => Err(CommandError::Malformed),
                    })
                };
                self.buf.clear();
                result
            }
            _ => {
                if !self.overflow && self.buf.push(byte).is_err() {
                    self.overflow = true;
                    self.buf.clear();
                }
                None
            }
        }
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_f32(s: &str) -> Result<f32, CommandError> {
    let v: f32 = s.trim().parse().map_err(|_| CommandError::Malformed)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CommandError::InvalidValue)
    }
}

/// Parse one complete line, without its terminator.
pub fn parse_line(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CommandError::Empty);
    }

    if let Some((name, value)) = line.split_once('=') {
        let id = VariableId::from_name(name.trim())?;
        return Ok(Command::Set(id, parse_f32(value)?));
    }

    let mut words = line.split_ascii_whitespace();
    let keyword = words.next().ok_or(CommandError::Empty)?;

    let cmd = match keyword {
        "switch_to_auto" => Command::SwitchToAuto,
        "switch_to_manual" => Command::SwitchToManual,
        "switch_to_stop" => Command::SwitchToStop,
        "get" => Command::GetVariables,
        "data" => Command::Telemetry,
        "camera" => {
            let rho = parse_f32(words.next().ok_or(CommandError::Malformed)?)?;
            let theta = parse_f32(words.next().ok_or(CommandError::Malformed)?)?;
            Command::Camera { rho, theta }
        }
        "color" => match words.next() {
            Some("true") => Command::Color(true),
            Some("false") => Command::Color(false),
            _ => return Err(CommandError::Malformed),
        },
        other => match ManualCommand::from_name(other) {
            Some(m) => Command::Manual(m),
            None => return Err(CommandError::UnknownCommand),
        },
    };

    if words.next().is_some() {
        return Err(CommandError::Malformed);
    }
    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(p: &mut LineParser, s: &str) -> Vec<Result<Command, CommandError>> {
        s.bytes().filter_map(|b| p.push(b)).collect()
    }

    #[test]
    fn assignment() {
        assert_eq!(
            parse_line("vertical_kp=150"),
            Ok(Command::Set(VariableId::VerticalKp, 150.0))
        );
        assert_eq!(
            parse_line(" bias = -0.02 "),
            Ok(Command::Set(VariableId::Bias, -0.02))
        );
        assert_eq!(parse_line("nope=1"), Err(CommandError::UnknownVariable));
        assert_eq!(parse_line("bias=abc"), Err(CommandError::Malformed));
        assert_eq!(parse_line("bias=inf"), Err(CommandError::InvalidValue));
        assert_eq!(parse_line("bias=NaN"), Err(CommandError::InvalidValue));
    }

    #[test]
    fn every_motion_word_selects_one_branch() {
        let words = ["forward", "backward", "left", "right", "stop"];
        let expected = [
            ManualCommand::Forward,
            ManualCommand::Backward,
            ManualCommand::Left,
            ManualCommand::Right,
            ManualCommand::Stop,
        ];
        for (w, e) in words.iter().zip(expected) {
            assert_eq!(parse_line(w), Ok(Command::Manual(e)));
            for other in expected.iter().filter(|o| **o != e) {
                assert_ne!(parse_line(w), Ok(Command::Manual(*other)));
            }
        }
    }

    #[test]
    fn keywords() {
        assert_eq!(parse_line("switch_to_auto"), Ok(Command::SwitchToAuto));
        assert_eq!(parse_line("switch_to_manual"), Ok(Command::SwitchToManual));
        assert_eq!(parse_line("switch_to_stop"), Ok(Command::SwitchToStop));
        assert_eq!(parse_line("get"), Ok(Command::GetVariables));
        assert_eq!(parse_line("data"), Ok(Command::Telemetry));
        assert_eq!(
            parse_line("camera 0.25 -0.5"),
            Ok(Command::Camera { rho: 0.25, theta: -0.5 })
        );
        assert_eq!(parse_line("color true"), Ok(Command::Color(true)));
        assert_eq!(parse_line("color false"), Ok(Command::Color(false)));

        assert_eq!(parse_line("camera 1"), Err(CommandError::Malformed));
        assert_eq!(parse_line("color maybe"), Err(CommandError::Malformed));
        assert_eq!(parse_line("forward now"), Err(CommandError::Malformed));
        assert_eq!(parse_line("jump"), Err(CommandError::UnknownCommand));
        assert_eq!(parse_line("   "), Err(CommandError::Empty));
    }

    #[test]
    fn byte_stream_with_crlf() {
        let mut p = LineParser::new();
        let out = feed(&mut p, "get\r\n\r\nturn_kd=-2\nleft\n");
        assert_eq!(
            out,
            vec![
                Ok(Command::GetVariables),
                Ok(Command::Set(VariableId::TurnKd, -2.0)),
                Ok(Command::Manual(ManualCommand::Left)),
            ]
        );
    }

    #[test]
    fn overlong_line_is_dropped_once() {
        let mut p = LineParser::new();
        let long: String = core::iter::repeat('x').take(MAX_LINE + 10).collect();
        let out = feed(&mut p, &long);
        assert!(out.is_empty());
        let out = feed(&mut p, "\ndata\n");
        assert_eq!(out, vec![Err(CommandError::TooLong), Ok(Command::Telemetry)]);
    }

    #[test]
    fn line_at_capacity_is_accepted() {
        let mut p = LineParser::new();
        let pad = MAX_LINE - "bias=0.5".len();
        let line = format!("{}bias=0.5\n", " ".repeat(pad));
        assert_eq!(feed(&mut p, &line), vec![Ok(Command::Set(VariableId::Bias, 0.5))]);
    }
}
