use bytes::{Buf, BufMut};
use serde::Serialize;

use crate::codec::PAYLOAD_LEN;

/// One sensor snapshot carried by a MEASURE frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Measurement {
    /// Temperature in hundredths of a degree Celsius.
    pub temperature_centi: i16,
    /// Relative humidity in hundredths of a percent.
    pub humidity_centi: u16,
    /// Pressure in tenths of a hectopascal.
    pub pressure_decihpa: u16,
    /// Raw illuminance count.
    pub lux: u16,
}

impl Measurement {
    /// Serialize to the 8-byte big-endian plaintext payload.
    pub fn to_payload(&self) -> [u8; PAYLOAD_LEN] {
        let mut out = [0u8; PAYLOAD_LEN];
        let mut dst = &mut out[..];
        dst.put_i16(self.temperature_centi);
        dst.put_u16(self.humidity_centi);
        dst.put_u16(self.pressure_decihpa);
        dst.put_u16(self.lux);
        out
    }

    /// Parse the 8-byte big-endian plaintext payload.
    pub fn from_payload(payload: &[u8; PAYLOAD_LEN]) -> Self {
        let mut src = &payload[..];
        Self {
            temperature_centi: src.get_i16(),
            humidity_centi: src.get_u16(),
            pressure_decihpa: src.get_u16(),
            lux: src.get_u16(),
        }
    }
}
