//! Serial command surface: `SETORDER,<id>,<order>`.

use cpebridge_frame::{ControlOrder, ParseError};

/// Keyword of the only supported command (matched case-insensitively).
pub const SET_ORDER_KEYWORD: &str = "SETORDER";

const SEPARATORS: &[char] = &[',', ':', '\r', '\n'];

/// A parsed serial command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialCommand {
    /// Reconfigure the sensor reporting order of a remote node.
    SetOrder { device_id: u8, order: ControlOrder },
}

/// Why a serial line was not turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command {0:?}")]
    UnknownKeyword(String),

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid device id {0:?}")]
    InvalidId(String),

    #[error(transparent)]
    InvalidOrder(#[from] ParseError),
}

/// Split a line into tokens.
///
/// Separators are `,` `:` CR and LF; runs of separators collapse, so no
/// token is ever empty.
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.split(SEPARATORS).filter(|token| !token.is_empty())
}

/// Parse one serial line.
///
/// Tokens after the order are ignored. With `strict_ids` unset, the device id
/// is read like C `atoi` and truncated to 8 bits (`"300"` -> 44, `"x"` -> 0).
pub fn parse_command(line: &str, strict_ids: bool) -> Result<SerialCommand, CommandError> {
    let mut tokens = tokenize(line);

    let keyword = tokens.next().ok_or(CommandError::Empty)?;
    if !keyword.eq_ignore_ascii_case(SET_ORDER_KEYWORD) {
        return Err(CommandError::UnknownKeyword(keyword.to_string()));
    }

    let id_token = tokens.next().ok_or(CommandError::MissingField("device id"))?;
    let order_token = tokens.next().ok_or(CommandError::MissingField("order"))?;

    let device_id = if strict_ids {
        id_token
            .trim_matches(|c: char| c.is_ascii_whitespace())
            .parse::<u8>()
            .map_err(|_| CommandError::InvalidId(id_token.to_string()))?
    } else {
        lax_device_id(id_token)
    };
    let order = ControlOrder::parse(order_token)?;

    Ok(SerialCommand::SetOrder { device_id, order })
}

/// `atoi` semantics: optional leading whitespace and sign, then digits up to
/// the first non-digit. Wraps on overflow, then keeps the low byte.
fn lax_device_id(token: &str) -> u8 {
    let trimmed = token.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i32, |acc, d| {
            acc.wrapping_mul(10).wrapping_add(i32::from(d - b'0'))
        });

    let value = if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    };
    value as u8
}
