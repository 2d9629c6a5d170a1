use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use cpebridge_frame::{DecodedPayload, FrameError, FrameType, FRAME_LEN};
use cpebridge_transport::{
    Indicator, IndicatorEvent, NullIndicator, RadioTransport, SerialTransport, RADIO_FRAME_LEN,
};
use tracing::{debug, info, warn};

use crate::command::{parse_command, CommandError, SerialCommand};
use crate::config::GatewayConfig;
use crate::context::ProtocolContext;
use crate::error::Result;
use crate::line::{LineAssembler, LineEvent};
use crate::stats::GatewayStats;
use crate::telemetry::{format_control, format_measurement};

const _: () = assert!(FRAME_LEN == RADIO_FRAME_LEN);

/// Upper bound on datagrams pulled from the radio per scheduler turn.
const MAX_DATAGRAMS_PER_TURN: usize = 32;

/// Upper bound on serial bytes consumed per scheduler turn.
const MAX_SERIAL_BYTES_PER_TURN: usize = 512;

/// Why a received datagram was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    BadLength,
    UnknownType,
    AuthFailed,
}

/// What happened to one received datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxOutcome {
    /// Decoded and published on the serial link.
    Forwarded { frame_type: FrameType, device_id: u8 },
    /// Silently discarded.
    Dropped(DropReason),
}

/// What happened to one serial line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A CONTROL frame was handed to the radio.
    Sent { device_id: u8, nonce: u8, ctrl: u8 },
    /// The line was not a valid command. Nothing was transmitted.
    Ignored(CommandError),
    /// The frame was built but the radio refused it.
    SendFailed { device_id: u8, nonce: u8 },
}

/// The bridge between the radio network and the serial host.
///
/// All protocol state lives here and is only touched from `&mut self`, so each
/// handler runs to completion without observing a half-finished other path.
pub struct Gateway<R, S, I = NullIndicator> {
    radio: R,
    serial: S,
    indicator: I,
    context: ProtocolContext,
    config: GatewayConfig,
    assembler: LineAssembler,
    datagrams: VecDeque<Bytes>,
    lines: VecDeque<String>,
    stats: GatewayStats,
}

impl<R, S> Gateway<R, S, NullIndicator>
where
    R: RadioTransport,
    S: SerialTransport,
{
    /// Create a gateway with default configuration and no indicator.
    pub fn new(radio: R, serial: S, context: ProtocolContext) -> Self {
        let config = GatewayConfig::default();
        Self {
            radio,
            serial,
            indicator: NullIndicator,
            context,
            assembler: LineAssembler::new(config.max_line_len),
            config,
            datagrams: VecDeque::new(),
            lines: VecDeque::new(),
            stats: GatewayStats::default(),
        }
    }
}

impl<R, S, I> Gateway<R, S, I>
where
    R: RadioTransport,
    S: SerialTransport,
    I: Indicator,
{
    /// Attach an activity indicator.
    pub fn with_indicator<J: Indicator>(self, indicator: J) -> Gateway<R, S, J> {
        Gateway {
            radio: self.radio,
            serial: self.serial,
            indicator,
            context: self.context,
            config: self.config,
            assembler: self.assembler,
            datagrams: self.datagrams,
            lines: self.lines,
            stats: self.stats,
        }
    }

    /// Override dispatch configuration. Any partially assembled line is dropped.
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.assembler = LineAssembler::new(config.max_line_len);
        self.config = config;
        self
    }

    /// Radio-receive path: validate, decode, publish.
    pub fn on_datagram(&mut self, buffer: &[u8]) -> RxOutcome {
        self.stats.datagrams_received += 1;

        if buffer.len() != FRAME_LEN {
            return self.drop_datagram(DropReason::BadLength, buffer.len());
        }

        let frame = match self.context.decode(buffer) {
            Ok(frame) => frame,
            Err(FrameError::UnknownType(_)) => {
                return self.drop_datagram(DropReason::UnknownType, buffer.len())
            }
            Err(FrameError::AuthFailed) => {
                return self.drop_datagram(DropReason::AuthFailed, buffer.len())
            }
            Err(_) => return self.drop_datagram(DropReason::BadLength, buffer.len()),
        };

        let line = match frame.payload {
            DecodedPayload::Measure(measurement) => {
                self.stats.measurements_forwarded += 1;
                format_measurement(frame.device_id, &measurement)
            }
            DecodedPayload::Control(ctrl) => {
                self.stats.controls_echoed += 1;
                format_control(frame.device_id, ctrl)
            }
        };
        debug!(
            frame_type = frame.frame_type.name(),
            device_id = frame.device_id,
            nonce = frame.nonce,
            "frame forwarded"
        );

        match self.serial.write_line(&line) {
            Ok(()) => self.indicator.signal(IndicatorEvent::ReceiveOk),
            Err(err) => {
                self.stats.serial_write_failures += 1;
                warn!(error = %err, "serial write failed");
            }
        }

        RxOutcome::Forwarded {
            frame_type: frame.frame_type,
            device_id: frame.device_id,
        }
    }

    /// Serial-command path: parse one complete line and act on it.
    pub fn on_line(&mut self, line: &str) -> CommandOutcome {
        self.stats.lines_received += 1;

        let command = match parse_command(line, self.config.strict_device_id) {
            Ok(command) => command,
            Err(err) => {
                self.stats.commands_ignored += 1;
                debug!(error = %err, "serial line ignored");
                return CommandOutcome::Ignored(err);
            }
        };

        match command {
            SerialCommand::SetOrder { device_id, order } => {
                let ctrl = order.to_byte();
                let (nonce, frame) = self.context.next_control_frame(device_id, ctrl);
                match self.transmit(device_id, nonce, &frame) {
                    Ok(()) => CommandOutcome::Sent {
                        device_id,
                        nonce,
                        ctrl,
                    },
                    Err(_) => CommandOutcome::SendFailed { device_id, nonce },
                }
            }
        }
    }

    /// Build and transmit a CONTROL frame. Returns the nonce it carried.
    ///
    /// The sequence counter advances even when the radio rejects the frame.
    pub fn send_order(&mut self, device_id: u8, ctrl: u8) -> Result<u8> {
        let (nonce, frame) = self.context.next_control_frame(device_id, ctrl);
        self.transmit(device_id, nonce, &frame)?;
        Ok(nonce)
    }

    fn transmit(&mut self, device_id: u8, nonce: u8, frame: &[u8; FRAME_LEN]) -> Result<()> {
        if let Err(err) = self.radio.send(frame) {
            self.stats.radio_send_failures += 1;
            warn!(device_id, nonce, error = %err, "radio send failed");
            return Err(err.into());
        }

        self.stats.control_frames_sent += 1;
        info!(device_id, nonce, "control frame sent");
        self.indicator.signal(IndicatorEvent::SendOk);
        Ok(())
    }

    /// Run one scheduler turn.
    ///
    /// Fills the two ready queues (datagram dispatch, line assembly) from the
    /// transports, then drains them. Returns `false` when there was nothing
    /// to do.
    pub fn poll_once(&mut self) -> bool {
        self.collect_datagrams();
        self.collect_lines();

        let busy = !self.datagrams.is_empty() || !self.lines.is_empty();

        while let Some(datagram) = self.datagrams.pop_front() {
            self.on_datagram(&datagram);
        }
        while let Some(line) = self.lines.pop_front() {
            self.on_line(&line);
        }

        busy
    }

    /// Poll until `running` is cleared, sleeping between idle turns.
    pub fn run(&mut self, running: &AtomicBool) {
        info!(
            strict_device_id = self.config.strict_device_id,
            "gateway listening"
        );
        while running.load(Ordering::SeqCst) {
            if !self.poll_once() {
                std::thread::sleep(self.config.idle_sleep);
            }
        }
        info!(
            dropped = self.stats.dropped_total(),
            stats = ?self.stats,
            "gateway stopped"
        );
    }

    fn collect_datagrams(&mut self) {
        for _ in 0..MAX_DATAGRAMS_PER_TURN {
            match self.radio.try_recv() {
                Ok(Some(datagram)) => self.datagrams.push_back(datagram),
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "radio receive failed");
                    break;
                }
            }
        }
    }

    fn collect_lines(&mut self) {
        for _ in 0..MAX_SERIAL_BYTES_PER_TURN {
            let Some(byte) = self.serial.read_byte() else {
                break;
            };
            match self.assembler.push(byte) {
                Some(LineEvent::Line(line)) => self.lines.push_back(line),
                Some(LineEvent::Discarded { len }) => {
                    self.stats.lines_discarded += 1;
                    debug!(len, "overlong serial line discarded");
                }
                None => {}
            }
        }
    }

    fn drop_datagram(&mut self, reason: DropReason, len: usize) -> RxOutcome {
        match reason {
            DropReason::BadLength => self.stats.dropped_bad_length += 1,
            DropReason::UnknownType => self.stats.dropped_unknown_type += 1,
            DropReason::AuthFailed => self.stats.dropped_auth_failed += 1,
        }
        debug!(?reason, len, "datagram dropped");
        RxOutcome::Dropped(reason)
    }

    pub fn stats(&self) -> &GatewayStats {
        &self.stats
    }

    pub fn context(&self) -> &ProtocolContext {
        &self.context
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Borrow the radio transport.
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Mutably borrow the radio transport.
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Borrow the serial transport.
    pub fn serial(&self) -> &S {
        &self.serial
    }

    /// Mutably borrow the serial transport.
    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Consume the gateway and return its transports.
    pub fn into_parts(self) -> (R, S, I) {
        (self.radio, self.serial, self.indicator)
    }
}
