use cpebridge_frame::decode_frame;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.frame)?;
    let frame =
        decode_frame(&args.key.key, &bytes).map_err(|err| frame_error("decode failed", err))?;
    print_decoded(&frame, format);
    Ok(SUCCESS)
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&digits)
        .map_err(|err| CliError::new(USAGE, format!("frame is not valid hex: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_ignores_separators() {
        assert_eq!(
            parse_hex("01 09:00 ff").unwrap(),
            vec![0x01, 0x09, 0x00, 0xFF]
        );
    }

    #[test]
    fn parse_hex_rejects_odd_digits() {
        let err = parse_hex("abc").unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
