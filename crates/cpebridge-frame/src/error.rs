/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The buffer is not exactly one frame long.
    #[error("bad frame length ({len} bytes, expected {expected})", expected = crate::codec::FRAME_LEN)]
    BadLength { len: usize },

    /// Byte 0 is not a known frame type tag.
    #[error("unknown frame type tag 0x{0:02X}")]
    UnknownType(u8),

    /// The integrity tag does not match the header and ciphertext.
    #[error("frame authentication failed")]
    AuthFailed,

    /// The plaintext does not fit in the payload region.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Coarse classification used at the gateway boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Wrong length or unrecognized frame type.
    Format,
    /// Integrity tag mismatch.
    Auth,
}

impl FrameError {
    pub fn class(&self) -> ErrorClass {
        match self {
            FrameError::AuthFailed => ErrorClass::Auth,
            FrameError::BadLength { .. }
            | FrameError::UnknownType(_)
            | FrameError::PayloadTooLarge { .. } => ErrorClass::Format,
        }
    }
}

/// Errors from parsing a textual sensor order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Not exactly four letters drawn from T, L, H, P.
    #[error("invalid sensor order {0:?} (expected 4 letters from T, L, H, P)")]
    InvalidOrder(String),
}

/// Errors from loading key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Key material is not exactly 16 bytes.
    #[error("key must be {expected} bytes, got {len}", expected = crate::crypto::KEY_LEN)]
    BadLength { len: usize },

    /// Key text is not valid hexadecimal.
    #[error("key is not valid hex: {0}")]
    InvalidHex(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
