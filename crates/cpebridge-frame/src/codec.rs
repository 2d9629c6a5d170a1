use bytes::BufMut;
use serde::Serialize;
use tracing::trace;

use crate::crypto::{self, Key, TAG_LEN};
use crate::error::{FrameError, Result};
use crate::measurement::Measurement;

/// Every frame on the air is exactly this long.
pub const FRAME_LEN: usize = 12;

/// Header: type (1) + device id (1) + nonce (1).
pub const HEADER_LEN: usize = 3;

/// Plaintext/ciphertext payload region.
pub const PAYLOAD_LEN: usize = 8;

/// Fill byte for unused payload bytes (CONTROL frames use 1 of 8).
pub const CONTROL_PADDING: u8 = 0x00;

/// Wire tag for MEASURE frames.
pub const MEASURE_TAG: u8 = 0x01;

/// Wire tag for CONTROL frames.
pub const CONTROL_TAG: u8 = 0x02;

const _: () = assert!(HEADER_LEN + PAYLOAD_LEN + TAG_LEN == FRAME_LEN);

/// The two frame kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrameType {
    /// Sensor readings, node to gateway.
    Measure,
    /// Sensor-order reconfiguration, gateway to node.
    Control,
}

impl FrameType {
    pub fn tag(self) -> u8 {
        match self {
            FrameType::Measure => MEASURE_TAG,
            FrameType::Control => CONTROL_TAG,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            MEASURE_TAG => Some(FrameType::Measure),
            CONTROL_TAG => Some(FrameType::Control),
            _ => None,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            FrameType::Measure => "MEASURE",
            FrameType::Control => "CONTROL",
        }
    }
}

/// Typed payload recovered from a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedPayload {
    Measure(Measurement),
    /// Packed sensor-order control byte.
    Control(u8),
}

/// A successfully authenticated and decrypted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    pub frame_type: FrameType,
    pub device_id: u8,
    pub nonce: u8,
    pub payload: DecodedPayload,
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬────────┬───────┬────────────────────────────┬─────┐
/// │ Type │ Device │ Nonce │ Ciphertext                 │ Tag │
/// │ (1B) │ (1B)   │ (1B)  │ (8B, plaintext ⊕ keystream)│ (1B)│
/// └──────┴────────┴───────┴────────────────────────────┴─────┘
/// ```
///
/// Plaintext shorter than [`PAYLOAD_LEN`] is padded with [`CONTROL_PADDING`].
pub fn encode_frame(
    key: &Key,
    frame_type: FrameType,
    device_id: u8,
    nonce: u8,
    plaintext: &[u8],
) -> Result<[u8; FRAME_LEN]> {
    if plaintext.len() > PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLarge {
            size: plaintext.len(),
            max: PAYLOAD_LEN,
        });
    }

    let mut padded = [CONTROL_PADDING; PAYLOAD_LEN];
    padded[..plaintext.len()].copy_from_slice(plaintext);

    let header = [frame_type.tag(), device_id, nonce];
    Ok(seal_frame(key, header, &padded))
}

/// Encode a MEASURE frame.
pub fn encode_measure(
    key: &Key,
    device_id: u8,
    nonce: u8,
    measurement: &Measurement,
) -> [u8; FRAME_LEN] {
    let header = [MEASURE_TAG, device_id, nonce];
    seal_frame(key, header, &measurement.to_payload())
}

/// Encode a CONTROL frame carrying a packed sensor-order byte.
pub fn encode_control(key: &Key, device_id: u8, nonce: u8, ctrl: u8) -> [u8; FRAME_LEN] {
    let mut payload = [CONTROL_PADDING; PAYLOAD_LEN];
    payload[0] = ctrl;
    let header = [CONTROL_TAG, device_id, nonce];
    seal_frame(key, header, &payload)
}

/// Decode and authenticate a frame.
///
/// Checks, in order: length, type tag, integrity tag. Decryption only
/// happens once the tag matches.
pub fn decode_frame(key: &Key, bytes: &[u8]) -> Result<DecodedFrame> {
    let frame: &[u8; FRAME_LEN] = bytes
        .try_into()
        .map_err(|_| FrameError::BadLength { len: bytes.len() })?;

    let frame_type = FrameType::from_tag(frame[0]).ok_or(FrameError::UnknownType(frame[0]))?;

    let mut header = [0u8; HEADER_LEN];
    header.copy_from_slice(&frame[..HEADER_LEN]);
    let mut ciphertext = [0u8; PAYLOAD_LEN];
    ciphertext.copy_from_slice(&frame[HEADER_LEN..HEADER_LEN + PAYLOAD_LEN]);
    let tag = frame[FRAME_LEN - 1];

    let plaintext = crypto::open(key, &header, &ciphertext, tag)?;

    let payload = match frame_type {
        FrameType::Measure => DecodedPayload::Measure(Measurement::from_payload(&plaintext)),
        FrameType::Control => DecodedPayload::Control(plaintext[0]),
    };

    Ok(DecodedFrame {
        frame_type,
        device_id: header[1],
        nonce: header[2],
        payload,
    })
}

fn seal_frame(
    key: &Key,
    header: [u8; HEADER_LEN],
    plaintext: &[u8; PAYLOAD_LEN],
) -> [u8; FRAME_LEN] {
    let (ciphertext, tag) = crypto::seal(key, &header, plaintext);

    let mut frame = [0u8; FRAME_LEN];
    let mut dst = &mut frame[..];
    dst.put_slice(&header);
    dst.put_slice(&ciphertext);
    dst.put_u8(tag);

    trace!(type_tag = header[0], device_id = header[1], nonce = header[2], "frame sealed");
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::order::parse_order;

    const KEY: Key = Key::new([
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
        0x0F,
    ]);

    fn sample_measurement() -> Measurement {
        Measurement {
            temperature_centi: -512,
            humidity_centi: 4500,
            pressure_decihpa: 10125,
            lux: 120,
        }
    }

    #[test]
    fn test_header_is_cleartext() {
        let frame = encode_control(&KEY, 7, 200, 0x1B);

        assert_eq!(frame.len(), FRAME_LEN);
        assert_eq!(frame[0], CONTROL_TAG);
        assert_eq!(frame[1], 7);
        assert_eq!(frame[2], 200);
    }

    #[test]
    fn test_payload_is_not_cleartext() {
        let m = sample_measurement();
        let frame = encode_measure(&KEY, 9, 0, &m);
        assert_ne!(&frame[HEADER_LEN..HEADER_LEN + PAYLOAD_LEN], &m.to_payload());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(
            encode_control(&KEY, 3, 4, 0xE4),
            encode_control(&KEY, 3, 4, 0xE4)
        );
        assert_ne!(
            encode_control(&KEY, 3, 4, 0xE4),
            encode_control(&KEY, 3, 5, 0xE4)
        );
    }

    #[test]
    fn test_generic_encode_matches_typed_helpers() {
        let m = sample_measurement();
        assert_eq!(
            encode_frame(&KEY, FrameType::Measure, 9, 1, &m.to_payload()).unwrap(),
            encode_measure(&KEY, 9, 1, &m)
        );
        assert_eq!(
            encode_frame(&KEY, FrameType::Control, 2, 3, &[0x1B]).unwrap(),
            encode_control(&KEY, 2, 3, 0x1B)
        );
    }

    #[test]
    fn test_encode_rejects_oversized_plaintext() {
        let err = encode_frame(&KEY, FrameType::Measure, 1, 1, &[0u8; 9]).unwrap_err();
        assert_eq!(err, FrameError::PayloadTooLarge { size: 9, max: 8 });
    }

    #[test]
    fn test_measure_roundtrip() {
        let m = sample_measurement();
        let frame = encode_measure(&KEY, 9, 17, &m);

        let decoded = decode_frame(&KEY, &frame).unwrap();
        assert_eq!(decoded.frame_type, FrameType::Measure);
        assert_eq!(decoded.device_id, 9);
        assert_eq!(decoded.nonce, 17);
        assert_eq!(decoded.payload, DecodedPayload::Measure(m));
    }

    #[test]
    fn test_control_roundtrip_all_ids_and_nonces() {
        for device_id in 0..=u8::MAX {
            for nonce in 0..=u8::MAX {
                let order = device_id.wrapping_mul(31).wrapping_add(nonce.wrapping_mul(7));
                let frame = encode_control(&KEY, device_id, nonce, order);
                let decoded = decode_frame(&KEY, &frame).unwrap();

                assert_eq!(decoded.frame_type, FrameType::Control);
                assert_eq!(decoded.device_id, device_id);
                assert_eq!(decoded.nonce, nonce);
                assert_eq!(decoded.payload, DecodedPayload::Control(order));
            }
        }
    }

    #[test]
    fn test_control_roundtrip_all_orders() {
        for order in 0..=u8::MAX {
            for (device_id, nonce) in [(0u8, 0u8), (7, 1), (255, 255), (128, 64)] {
                let frame = encode_control(&KEY, device_id, nonce, order);
                let decoded = decode_frame(&KEY, &frame).unwrap();
                assert_eq!(decoded.device_id, device_id);
                assert_eq!(decoded.payload, DecodedPayload::Control(order));
            }
        }
    }

    #[test]
    fn test_length_gate() {
        for len in [0usize, 1, 11, 13, 32, 255] {
            let buf = vec![MEASURE_TAG; len];
            let err = decode_frame(&KEY, &buf).unwrap_err();
            assert_eq!(err, FrameError::BadLength { len });
            assert_eq!(err.class(), ErrorClass::Format);
        }
    }

    #[test]
    fn test_unknown_type() {
        let mut frame = encode_control(&KEY, 1, 1, 0x1B);
        for tag in [0x00u8, 0x03, 0x43, 0xFF] {
            frame[0] = tag;
            let err = decode_frame(&KEY, &frame).unwrap_err();
            assert_eq!(err, FrameError::UnknownType(tag));
            assert_eq!(err.class(), ErrorClass::Format);
        }
    }

    #[test]
    fn test_wrong_key_rejected() {
        let frame = encode_measure(&KEY, 9, 0, &sample_measurement());
        let other = Key::new([0x42; 16]);

        // A 1-byte tag lets a wrong key pass with probability 1/256, so
        // check a batch of nonces and require the vast majority to fail.
        let accepted = (0..=u8::MAX)
            .filter(|nonce| {
                let frame = encode_measure(&KEY, 9, *nonce, &sample_measurement());
                decode_frame(&other, &frame).is_ok()
            })
            .count();
        assert!(accepted <= 8, "wrong key accepted {accepted}/256 frames");
        assert!(decode_frame(&KEY, &frame).is_ok());
    }

    #[test]
    fn test_single_bit_tamper_detection() {
        // False-accept bound: a single-byte tag admits a random forgery with
        // probability 1/256. Flips in the type byte always surface as
        // UnknownType and flips in the tag byte always fail, so only the
        // 80 bits of bytes 1..=10 can slip through. Expected accepts here:
        // 64 frames * 80 bits / 256 = 20. Assert well under 3x that.
        let mut flips = 0usize;
        let mut accepted = 0usize;

        for i in 0..64u8 {
            let frame = if i % 2 == 0 {
                encode_control(&KEY, i, i.wrapping_mul(3), i.wrapping_mul(11))
            } else {
                encode_measure(&KEY, i, i, &sample_measurement())
            };

            for bit in 0..FRAME_LEN * 8 {
                let mut tampered = frame;
                tampered[bit / 8] ^= 1 << (bit % 8);
                flips += 1;

                match decode_frame(&KEY, &tampered) {
                    Ok(_) => {
                        assert!(
                            (8..(FRAME_LEN - 1) * 8).contains(&bit),
                            "flip of bit {bit} must never be accepted"
                        );
                        accepted += 1;
                    }
                    Err(FrameError::UnknownType(_)) => assert!(bit < 8),
                    Err(FrameError::AuthFailed) => {}
                    Err(other) => panic!("unexpected error {other:?}"),
                }
            }
        }

        assert_eq!(flips, 64 * 96);
        assert!(accepted < 60, "accepted {accepted} of {flips} tampered frames");
    }

    #[test]
    fn test_control_padding_is_fixed() {
        let a = encode_frame(&KEY, FrameType::Control, 5, 5, &[0x1B]).unwrap();
        let b = encode_frame(
            &KEY,
            FrameType::Control,
            5,
            5,
            &[0x1B, CONTROL_PADDING, CONTROL_PADDING],
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_order_bytes_survive_the_wire() {
        let ctrl = parse_order("THLP").unwrap();
        let frame = encode_control(&KEY, 7, 0, ctrl);
        let decoded = decode_frame(&KEY, &frame).unwrap();
        assert_eq!(decoded.payload, DecodedPayload::Control(ctrl));
    }

    #[test]
    fn test_frame_type_tags() {
        assert_eq!(FrameType::from_tag(MEASURE_TAG), Some(FrameType::Measure));
        assert_eq!(FrameType::from_tag(CONTROL_TAG), Some(FrameType::Control));
        assert_eq!(FrameType::from_tag(0x7F), None);
        assert_eq!(FrameType::Measure.name(), "MEASURE");
        assert_eq!(FrameType::Control.tag(), CONTROL_TAG);
    }
}
