use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpebridge_frame::{decode_frame, encode_measure, ControlOrder, DecodedPayload, Key};
use cpebridge_gateway::SequenceCounter;
use cpebridge_transport::{RadioTransport, UdpRadio, UdpRadioConfig};
use tracing::{debug, info, warn};

use crate::cmd::run::install_ctrlc_handler;
use crate::cmd::{parse_duration, NodeArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_order, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub fn run(args: NodeArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let key = args.key.key;
    let device_id = args.reading.id;
    let measurement = args.reading.measurement();

    let mut radio = UdpRadio::bind(&UdpRadioConfig {
        bind: args.bind,
        peer: args.gateway,
    })
    .map_err(|err| transport_error("radio bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut counter = SequenceCounter::new();
    let mut sent = 0usize;
    let mut next_send = Instant::now();
    info!(device_id, ?interval, "sensor node started");

    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|count| sent >= count) {
            break;
        }

        if Instant::now() >= next_send {
            let nonce = counter.next();
            let frame = encode_measure(&key, device_id, nonce, &measurement);
            match radio.send(&frame) {
                Ok(()) => debug!(device_id, nonce, "measure sent"),
                Err(err) => warn!(device_id, nonce, error = %err, "measure send failed"),
            }
            sent += 1;
            next_send += interval;
        }

        loop {
            match radio.try_recv() {
                Ok(Some(datagram)) => {
                    if let Some(order) = accept_control(&key, device_id, &datagram) {
                        info!(device_id, %order, "sensor order updated");
                        print_order(order, format);
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "radio receive failed");
                    break;
                }
            }
        }

        std::thread::sleep(POLL_INTERVAL);
    }

    Ok(SUCCESS)
}

/// A CONTROL frame addressed to this node, if `datagram` is one.
fn accept_control(key: &Key, device_id: u8, datagram: &[u8]) -> Option<ControlOrder> {
    let frame = decode_frame(key, datagram).ok()?;
    match frame.payload {
        DecodedPayload::Control(ctrl) if frame.device_id == device_id => {
            Some(ControlOrder::from_byte(ctrl))
        }
        _ => None,
    }
}
