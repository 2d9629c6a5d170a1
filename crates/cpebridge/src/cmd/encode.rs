use cpebridge_frame::{encode_control, encode_measure, FrameType, Measurement};

use crate::cmd::{EncodeArgs, EncodeFrame, ReadingArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let key = &args.key.key;
    match args.frame {
        EncodeFrame::Measure { reading, nonce } => {
            let frame = encode_measure(key, reading.id, nonce, &reading.measurement());
            print_encoded(FrameType::Measure, reading.id, nonce, &frame, format);
        }
        EncodeFrame::Control { id, order, nonce } => {
            let frame = encode_control(key, id, nonce, order.to_byte());
            print_encoded(FrameType::Control, id, nonce, &frame, format);
        }
    }
    Ok(SUCCESS)
}

impl ReadingArgs {
    pub fn measurement(&self) -> Measurement {
        Measurement {
            temperature_centi: self.temperature,
            humidity_centi: self.humidity,
            pressure_decihpa: self.pressure,
            lux: self.lux,
        }
    }
}
