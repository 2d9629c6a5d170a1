//! Authenticated 12-byte radio frames for the CPE sensor network.
//!
//! This is the core of cpebridge. Every frame on the air is exactly 12 bytes:
//! - A 3-byte cleartext header: frame type, device id, nonce
//! - An 8-byte payload encrypted with a keyed keystream
//! - A 1-byte truncated integrity tag
//!
//! Sensor nodes and the gateway share one pre-shared [`Key`] and must agree
//! on this layout byte for byte; there is no version negotiation.

pub mod codec;
pub mod crypto;
pub mod error;
pub mod measurement;
pub mod order;

pub use codec::{
    decode_frame, encode_control, encode_frame, encode_measure, DecodedFrame, DecodedPayload,
    FrameType, CONTROL_PADDING, CONTROL_TAG, FRAME_LEN, HEADER_LEN, MEASURE_TAG, PAYLOAD_LEN,
};
pub use crypto::{Key, KEY_LEN, TAG_LEN};
pub use error::{ErrorClass, FrameError, KeyError, ParseError, Result};
pub use measurement::Measurement;
pub use order::{pack, parse_order, ControlOrder, SensorKind, ORDER_SLOTS};
