//! JSON lines published on the serial link.
//!
//! Numbers are rendered as fixed-point text straight from the integer wire
//! units, so no float rounding ever happens.

use std::fmt;

use cpebridge_frame::Measurement;

/// Integer value scaled by `10^decimals`, printed with exactly that many
/// fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoint {
    value: i32,
    decimals: u32,
}

impl FixedPoint {
    pub fn new(value: i32, decimals: u32) -> Self {
        Self { value, decimals }
    }

    /// Hundredths (temperature, humidity).
    pub fn centi(value: i32) -> Self {
        Self::new(value, 2)
    }

    /// Tenths (pressure).
    pub fn deci(value: i32) -> Self {
        Self::new(value, 1)
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10u32.pow(self.decimals);
        let magnitude = self.value.unsigned_abs();
        let sign = if self.value < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:0width$}",
            sign,
            magnitude / scale,
            magnitude % scale,
            width = self.decimals as usize
        )
    }
}

/// `{"id":9,"t":-5.12,"h":45.00,"p":1012.5,"lux":120}`
pub fn format_measurement(device_id: u8, m: &Measurement) -> String {
    format!(
        "{{\"id\":{},\"t\":{},\"h\":{},\"p\":{},\"lux\":{}}}",
        device_id,
        FixedPoint::centi(i32::from(m.temperature_centi)),
        FixedPoint::centi(i32::from(m.humidity_centi)),
        FixedPoint::deci(i32::from(m.pressure_decihpa)),
        m.lux
    )
}

/// `{"ctrl":1B,"id":3}`: two upper-case hex digits, unquoted, as the
/// deployed host tooling expects.
pub fn format_control(device_id: u8, ctrl: u8) -> String {
    format!("{{\"ctrl\":{ctrl:02X},\"id\":{device_id}}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_reference_measurement() {
        let m = Measurement {
            temperature_centi: -512,
            humidity_centi: 4500,
            pressure_decihpa: 10125,
            lux: 120,
        };
        assert_eq!(
            format_measurement(9, &m),
            r#"{"id":9,"t":-5.12,"h":45.00,"p":1012.5,"lux":120}"#
        );
    }

    #[test]
    fn measurement_line_is_valid_json() {
        let m = Measurement {
            temperature_centi: 2157,
            humidity_centi: 3301,
            pressure_decihpa: 9876,
            lux: 65535,
        };
        let line = format_measurement(255, &m);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["id"], 255);
        assert_eq!(value["t"].as_f64(), Some(21.57));
        assert_eq!(value["h"].as_f64(), Some(33.01));
        assert_eq!(value["p"].as_f64(), Some(987.6));
        assert_eq!(value["lux"], 65535);
    }

    #[test]
    fn small_negative_temperatures_keep_their_sign() {
        assert_eq!(FixedPoint::centi(-5).to_string(), "-0.05");
        assert_eq!(FixedPoint::centi(-99).to_string(), "-0.99");
        assert_eq!(FixedPoint::centi(-100).to_string(), "-1.00");
        assert_eq!(FixedPoint::centi(0).to_string(), "0.00");
    }

    #[test]
    fn extremes() {
        assert_eq!(FixedPoint::centi(i32::from(i16::MIN)).to_string(), "-327.68");
        assert_eq!(FixedPoint::centi(i32::from(i16::MAX)).to_string(), "327.67");
        assert_eq!(FixedPoint::centi(i32::from(u16::MAX)).to_string(), "655.35");
        assert_eq!(FixedPoint::deci(i32::from(u16::MAX)).to_string(), "6553.5");
        assert_eq!(FixedPoint::deci(7).to_string(), "0.7");
    }

    #[test]
    fn formats_control_echo() {
        assert_eq!(format_control(3, 0x1B), r#"{"ctrl":1B,"id":3}"#);
        assert_eq!(format_control(200, 0x04), r#"{"ctrl":04,"id":200}"#);
    }
}
