//! Protocol gateway between the radio sensor network and the serial host.
//!
//! Two logical tasks share one [`ProtocolContext`]:
//! - radio receive: decode frames, publish JSON lines on the serial link
//! - serial command: assemble lines, turn `SETORDER` commands into CONTROL frames
//!
//! Both run on a single-threaded cooperative loop ([`Gateway::poll_once`]).
//! Malformed input on either side is dropped silently.

pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod line;
pub mod stats;
pub mod telemetry;

pub use command::{parse_command, tokenize, CommandError, SerialCommand, SET_ORDER_KEYWORD};
pub use config::GatewayConfig;
pub use context::{ProtocolContext, SequenceCounter};
pub use error::{GatewayError, Result};
pub use gateway::{CommandOutcome, DropReason, Gateway, RxOutcome};
pub use line::{LineAssembler, LineEvent};
pub use stats::GatewayStats;
pub use telemetry::{format_control, format_measurement, FixedPoint};
