//! Sensor reporting order packed into a single control byte.
//!
//! Four priority slots, two bits each, slot 0 in the most significant pair:
//!
//! ```text
//!  bit  7 6   5 4   3 2   1 0
//!      slot0 slot1 slot2 slot3
//! ```
//!
//! Kinds may repeat across slots.

use std::fmt;

use serde::Serialize;

use crate::error::ParseError;

/// Number of priority slots in an order.
pub const ORDER_SLOTS: usize = 4;

/// A sensor kind a remote node can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature = 0,
    Light = 1,
    Humidity = 2,
    Pressure = 3,
}

impl SensorKind {
    /// The 2-bit wire code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Kind for a 2-bit code. Only the low two bits are considered.
    pub fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0 => SensorKind::Temperature,
            1 => SensorKind::Light,
            2 => SensorKind::Humidity,
            _ => SensorKind::Pressure,
        }
    }

    /// Kind for an order letter, case-insensitive.
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'T' => Some(SensorKind::Temperature),
            'L' => Some(SensorKind::Light),
            'H' => Some(SensorKind::Humidity),
            'P' => Some(SensorKind::Pressure),
            _ => None,
        }
    }

    /// Upper-case order letter.
    pub fn letter(self) -> char {
        match self {
            SensorKind::Temperature => 'T',
            SensorKind::Light => 'L',
            SensorKind::Humidity => 'H',
            SensorKind::Pressure => 'P',
        }
    }
}

/// Pack four kinds into a control byte.
pub fn pack(a: SensorKind, b: SensorKind, c: SensorKind, d: SensorKind) -> u8 {
    (a.code() << 6) | (b.code() << 4) | (c.code() << 2) | d.code()
}

/// Parse a 4-letter order string (`"TLHP"`, case-insensitive) into a control byte.
pub fn parse_order(text: &str) -> Result<u8, ParseError> {
    ControlOrder::parse(text).map(ControlOrder::to_byte)
}

/// An ordered 4-tuple of sensor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlOrder {
    slots: [SensorKind; ORDER_SLOTS],
}

impl ControlOrder {
    pub fn new(slots: [SensorKind; ORDER_SLOTS]) -> Self {
        Self { slots }
    }

    /// Parse a 4-letter order string.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidOrder(text.to_string());

        let mut chars = text.chars();
        let mut slots = [SensorKind::Temperature; ORDER_SLOTS];
        for slot in slots.iter_mut() {
            let c = chars.next().ok_or_else(invalid)?;
            *slot = SensorKind::from_letter(c).ok_or_else(invalid)?;
        }
        if chars.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { slots })
    }

    /// Unpack a control byte. Every byte value is a valid order.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            slots: [
                SensorKind::from_code(byte >> 6),
                SensorKind::from_code(byte >> 4),
                SensorKind::from_code(byte >> 2),
                SensorKind::from_code(byte),
            ],
        }
    }

    pub fn to_byte(self) -> u8 {
        let [a, b, c, d] = self.slots;
        pack(a, b, c, d)
    }

    pub fn slots(&self) -> &[SensorKind; ORDER_SLOTS] {
        &self.slots
    }
}

impl fmt::Display for ControlOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for kind in self.slots {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ControlOrder {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<ControlOrder> for u8 {
    fn from(order: ControlOrder) -> Self {
        order.to_byte()
    }
}
