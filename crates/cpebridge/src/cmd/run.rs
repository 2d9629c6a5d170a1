use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpebridge_gateway::{Gateway, GatewayConfig, ProtocolContext};
use cpebridge_transport::{LogIndicator, StreamSerial, UdpRadio};
use tracing::info;

use crate::cmd::RunArgs;
use crate::exit::{io_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{write_stats, OutputFormat};

type BoxedSerial = StreamSerial<Box<dyn Write>>;

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    if args.max_line_len == 0 {
        return Err(CliError::new(USAGE, "--max-line-len must be greater than zero"));
    }

    let radio = UdpRadio::bind(&args.radio.config())
        .map_err(|err| transport_error("radio bind failed", err))?;
    let serial = open_serial(args.device.as_deref())?;

    let config = GatewayConfig {
        strict_device_id: !args.lax_ids,
        max_line_len: args.max_line_len,
        ..GatewayConfig::default()
    };
    let mut gateway = Gateway::new(radio, serial, ProtocolContext::new(args.key.key))
        .with_indicator(LogIndicator)
        .with_config(config);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    info!(
        device = ?args.device,
        radio = gateway.radio().transport_name(),
        peer = %gateway.radio().peer(),
        "bridge started"
    );
    gateway.run(&running);

    // Without --device, stdout carries telemetry; counters go to stderr.
    if args.stats {
        match args.device {
            Some(_) => write_stats(&mut std::io::stdout(), gateway.stats(), format),
            None => write_stats(&mut std::io::stderr(), gateway.stats(), format),
        }
    }

    Ok(SUCCESS)
}

/// Serial link on a device file, or stdin/stdout when no device is given.
fn open_serial(device: Option<&Path>) -> CliResult<BoxedSerial> {
    let (reader, writer): (Box<dyn Read + Send>, Box<dyn Write>) = match device {
        Some(path) => {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            let reader = file
                .try_clone()
                .map_err(|err| io_error("failed duplicating serial handle", err))?;
            (Box::new(reader), Box::new(file))
        }
        None => (Box::new(std::io::stdin()), Box::new(std::io::stdout())),
    };

    StreamSerial::spawn(reader, writer).map_err(|err| transport_error("serial setup failed", err))
}

pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
