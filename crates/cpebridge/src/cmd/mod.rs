use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use cpebridge_frame::{ControlOrder, Key};
use cpebridge_gateway::config::DEFAULT_MAX_LINE_LEN;
use cpebridge_transport::UdpRadioConfig;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod node;
pub mod order;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the gateway between the radio link and the serial host.
    Run(RunArgs),
    /// Simulate a remote sensor node.
    Node(NodeArgs),
    /// Encode a single frame and print it as hex.
    Encode(EncodeArgs),
    /// Decode and authenticate a hex-encoded frame.
    Decode(DecodeArgs),
    /// Pack a sensor order string into its control byte.
    Order(OrderArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Node(args) => node::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Order(args) => order::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// Pre-shared network key, 32 hex digits.
    #[arg(long, env = "CPE_KEY", hide_env_values = true)]
    pub key: Key,
}

#[derive(Args, Debug, Clone)]
pub struct RadioArgs {
    /// Local UDP address standing in for the radio receiver.
    #[arg(long, default_value = "0.0.0.0:4242")]
    pub bind: SocketAddr,
    /// Destination for transmitted frames (unicast or broadcast).
    #[arg(long, default_value = "127.0.0.1:4243")]
    pub peer: SocketAddr,
}

impl RadioArgs {
    pub fn config(&self) -> UdpRadioConfig {
        UdpRadioConfig {
            bind: self.bind,
            peer: self.peer,
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub key: KeyArgs,
    #[command(flatten)]
    pub radio: RadioArgs,
    /// Serial device to use instead of stdin/stdout (e.g. /dev/ttyUSB0).
    #[arg(long, value_name = "PATH")]
    pub device: Option<PathBuf>,
    /// Accept non-numeric device ids (read as 0) and truncate to 8 bits.
    #[arg(long)]
    pub lax_ids: bool,
    /// Discard serial lines longer than this many bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LEN)]
    pub max_line_len: usize,
    /// Print final counters when the gateway stops (stderr unless --device is set).
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct NodeArgs {
    #[command(flatten)]
    pub key: KeyArgs,
    /// Local UDP address of the simulated node.
    #[arg(long, default_value = "0.0.0.0:4243")]
    pub bind: SocketAddr,
    /// Gateway address (unicast or broadcast).
    #[arg(long, default_value = "127.0.0.1:4242")]
    pub gateway: SocketAddr,
    #[command(flatten)]
    pub reading: ReadingArgs,
    /// Time between MEASURE frames (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub interval: String,
    /// Exit after sending N MEASURE frames.
    #[arg(long)]
    pub count: Option<usize>,
}

/// One sensor snapshot, in wire units.
#[derive(Args, Debug, Clone)]
pub struct ReadingArgs {
    /// Device id of the node.
    #[arg(long)]
    pub id: u8,
    /// Temperature in hundredths of a degree Celsius.
    #[arg(long, default_value_t = 2150, allow_negative_numbers = true)]
    pub temperature: i16,
    /// Relative humidity in hundredths of a percent.
    #[arg(long, default_value_t = 4500)]
    pub humidity: u16,
    /// Pressure in tenths of a hectopascal.
    #[arg(long, default_value_t = 10132)]
    pub pressure: u16,
    /// Raw illuminance count.
    #[arg(long, default_value_t = 0)]
    pub lux: u16,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub key: KeyArgs,
    #[command(subcommand)]
    pub frame: EncodeFrame,
}

#[derive(Subcommand, Debug)]
pub enum EncodeFrame {
    /// Encode a MEASURE frame.
    Measure {
        #[command(flatten)]
        reading: ReadingArgs,
        /// Sequence number carried in the header.
        #[arg(long, default_value_t = 0)]
        nonce: u8,
    },
    /// Encode a CONTROL frame.
    Control {
        /// Target device id.
        #[arg(long)]
        id: u8,
        /// Sensor order, four letters from T, L, H, P.
        #[arg(long)]
        order: ControlOrder,
        /// Sequence number carried in the header.
        #[arg(long, default_value_t = 0)]
        nonce: u8,
    },
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub key: KeyArgs,
    /// Frame bytes as hex (24 digits; spaces and colons are ignored).
    pub frame: String,
}

#[derive(Args, Debug)]
pub struct OrderArgs {
    /// Sensor order, four letters from T, L, H, P (e.g. TLHP).
    pub order: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}
