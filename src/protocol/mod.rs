// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Remote Link Protocol
//!
//! ## Modules
//!
//! - [`parser`] - Byte-at-a-time line parser.
//! - [`messages`] - Commands, errors and response encoding.
//! - [`variables`] - Whitelisted settable variables and the read-back document.
//! - [`telemetry`] - Telemetry record and bounded request queue.

pub mod messages;
pub mod parser;
pub mod telemetry;
pub mod variables;

pub use messages::{Ack, Command, CommandError, Response};
pub use parser::LineParser;
pub use telemetry::{TelemetryQueue, TelemetryRecord};
pub use variables::{VariableId, VariablesDoc};
