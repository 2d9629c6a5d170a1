use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use cpebridge_frame::{ControlOrder, DecodedFrame, DecodedPayload, FrameType, SensorKind};
use cpebridge_gateway::{format_control, format_measurement, FixedPoint, GatewayStats};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct SlotOutput {
    slot: usize,
    code: u8,
    sensor: SensorKind,
}

#[derive(Serialize)]
struct OrderOutput {
    order: String,
    ctrl: u8,
    ctrl_hex: String,
    slots: Vec<SlotOutput>,
}

impl OrderOutput {
    fn new(order: ControlOrder) -> Self {
        Self {
            order: order.to_string(),
            ctrl: order.to_byte(),
            ctrl_hex: format!("{:02X}", order.to_byte()),
            slots: order
                .slots()
                .iter()
                .enumerate()
                .map(|(slot, kind)| SlotOutput {
                    slot,
                    code: kind.code(),
                    sensor: *kind,
                })
                .collect(),
        }
    }
}

pub fn print_order(order: ControlOrder, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&OrderOutput::new(order)),
        OutputFormat::Table => {
            let mut table = new_table(vec!["SLOT", "CODE", "SENSOR"]);
            for (slot, kind) in order.slots().iter().enumerate() {
                table.add_row(vec![
                    slot.to_string(),
                    kind.code().to_string(),
                    kind.letter().to_string(),
                ]);
            }
            println!("order={} ctrl=0x{:02X}", order, order.to_byte());
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("order={} ctrl=0x{:02X}", order, order.to_byte());
        }
        OutputFormat::Raw => println!("{:02X}", order.to_byte()),
    }
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    frame_type: FrameType,
    device_id: u8,
    nonce: u8,
    frame: &'a str,
}

pub fn print_encoded(
    frame_type: FrameType,
    device_id: u8,
    nonce: u8,
    frame: &[u8],
    format: OutputFormat,
) {
    let frame = hex::encode(frame);
    match format {
        OutputFormat::Json => print_json(&EncodedOutput {
            frame_type,
            device_id,
            nonce,
            frame: &frame,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["TYPE", "DEVICE", "NONCE", "FRAME"]);
            table.add_row(vec![
                frame_type.name().to_string(),
                device_id.to_string(),
                nonce.to_string(),
                frame,
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "type={} device={} nonce={} frame={}",
                frame_type.name(),
                device_id,
                nonce,
                frame
            );
        }
        OutputFormat::Raw => println!("{frame}"),
    }
}

#[derive(Serialize)]
struct DecodedOutput {
    frame_type: FrameType,
    device_id: u8,
    nonce: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    measurement: Option<cpebridge_frame::Measurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ctrl: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<String>,
    telemetry: String,
}

impl DecodedOutput {
    fn new(frame: &DecodedFrame) -> Self {
        let (measurement, ctrl) = match frame.payload {
            DecodedPayload::Measure(m) => (Some(m), None),
            DecodedPayload::Control(ctrl) => (None, Some(ctrl)),
        };
        Self {
            frame_type: frame.frame_type,
            device_id: frame.device_id,
            nonce: frame.nonce,
            measurement,
            ctrl,
            order: ctrl.map(|c| ControlOrder::from_byte(c).to_string()),
            telemetry: telemetry_line(frame),
        }
    }
}

/// The exact line the gateway would publish for this frame.
pub fn telemetry_line(frame: &DecodedFrame) -> String {
    match frame.payload {
        DecodedPayload::Measure(m) => format_measurement(frame.device_id, &m),
        DecodedPayload::Control(ctrl) => format_control(frame.device_id, ctrl),
    }
}

pub fn print_decoded(frame: &DecodedFrame, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&DecodedOutput::new(frame)),
        OutputFormat::Table => {
            let mut table = new_table(vec!["TYPE", "DEVICE", "NONCE", "PAYLOAD"]);
            table.add_row(vec![
                frame.frame_type.name().to_string(),
                frame.device_id.to_string(),
                frame.nonce.to_string(),
                payload_summary(&frame.payload),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "type={} device={} nonce={} {}",
                frame.frame_type.name(),
                frame.device_id,
                frame.nonce,
                payload_summary(&frame.payload)
            );
        }
        OutputFormat::Raw => println!("{}", telemetry_line(frame)),
    }
}

/// Write final counters to `out`. Write errors are ignored: the gateway has
/// already stopped.
pub fn write_stats<W: Write>(out: &mut W, stats: &GatewayStats, format: OutputFormat) {
    let rendered = match format {
        OutputFormat::Json | OutputFormat::Raw => {
            serde_json::to_string(stats).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            let value = serde_json::to_value(stats).unwrap_or_default();
            let mut table = new_table(vec!["COUNTER", "VALUE"]);
            if let Some(map) = value.as_object() {
                for (name, count) in map {
                    table.add_row(vec![name.clone(), count.to_string()]);
                }
            }
            table.to_string()
        }
    };
    let _ = writeln!(out, "{rendered}");
    let _ = out.flush();
}

fn payload_summary(payload: &DecodedPayload) -> String {
    match payload {
        DecodedPayload::Measure(m) => format!(
            "t={} h={} p={} lux={}",
            FixedPoint::centi(i32::from(m.temperature_centi)),
            FixedPoint::centi(i32::from(m.humidity_centi)),
            FixedPoint::deci(i32::from(m.pressure_decihpa)),
            m.lux
        ),
        DecodedPayload::Control(ctrl) => {
            format!("ctrl=0x{ctrl:02X} order={}", ControlOrder::from_byte(*ctrl))
        }
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}
