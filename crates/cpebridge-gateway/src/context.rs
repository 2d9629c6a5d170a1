use cpebridge_frame::{decode_frame, encode_control, DecodedFrame, Key, FRAME_LEN};

/// Per-gateway 8-bit transmission counter.
///
/// Starts at 0, advances by exactly one per CONTROL frame, wraps 255 -> 0.
/// It only varies the keystream; it is not a replay guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceCounter(u8);

impl SequenceCounter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn starting_at(value: u8) -> Self {
        Self(value)
    }

    /// Value the next frame will carry.
    pub fn current(&self) -> u8 {
        self.0
    }

    /// Return the current value and advance.
    pub fn next(&mut self) -> u8 {
        let value = self.0;
        self.0 = self.0.wrapping_add(1);
        value
    }
}

/// Key and sequence state owned by one gateway.
///
/// Encoding takes `&mut self` so that counter advance and frame construction
/// happen as one step.
#[derive(Debug, Clone)]
pub struct ProtocolContext {
    key: Key,
    counter: SequenceCounter,
}

impl ProtocolContext {
    pub fn new(key: Key) -> Self {
        Self::with_counter(key, SequenceCounter::new())
    }

    pub fn with_counter(key: Key, counter: SequenceCounter) -> Self {
        Self { key, counter }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn counter(&self) -> SequenceCounter {
        self.counter
    }

    /// Build the next CONTROL frame, consuming one sequence value.
    ///
    /// Returns the nonce used alongside the encoded frame.
    pub fn next_control_frame(&mut self, device_id: u8, ctrl: u8) -> (u8, [u8; FRAME_LEN]) {
        let nonce = self.counter.next();
        (nonce, encode_control(&self.key, device_id, nonce, ctrl))
    }

    pub fn decode(&self, bytes: &[u8]) -> cpebridge_frame::Result<DecodedFrame> {
        decode_frame(&self.key, bytes)
    }
}

#[cfg(test)]
mod tests {
    use cpebridge_frame::{DecodedPayload, FrameType};

    use super::*;

    fn key() -> Key {
        Key::new([0x11; 16])
    }

    #[test]
    fn counter_increments_by_one_and_wraps() {
        let mut counter = SequenceCounter::new();
        for expected in 0..=u8::MAX {
            assert_eq!(counter.next(), expected);
        }
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.next(), 0);
        assert_eq!(counter.current(), 1);
    }

    #[test]
    fn counter_wraps_from_255() {
        let mut counter = SequenceCounter::starting_at(255);
        assert_eq!(counter.next(), 255);
        assert_eq!(counter.next(), 0);
    }

    #[test]
    fn control_frames_carry_consecutive_nonces() {
        let mut ctx = ProtocolContext::new(key());

        let (n0, f0) = ctx.next_control_frame(7, 0x1B);
        let (n1, f1) = ctx.next_control_frame(7, 0x1B);

        assert_eq!((n0, n1), (0, 1));
        assert_eq!(f0[2], 0);
        assert_eq!(f1[2], 1);
        assert_ne!(f0, f1);
        assert_eq!(ctx.counter().current(), 2);
    }

    #[test]
    fn decode_uses_context_key() {
        let mut ctx = ProtocolContext::new(key());
        let (_, frame) = ctx.next_control_frame(3, 0xE4);

        let decoded = ctx.decode(&frame).unwrap();
        assert_eq!(decoded.frame_type, FrameType::Control);
        assert_eq!(decoded.device_id, 3);
        assert_eq!(decoded.payload, DecodedPayload::Control(0xE4));
    }

    #[test]
    fn independent_contexts_do_not_share_counters() {
        let mut a = ProtocolContext::new(key());
        let b = ProtocolContext::new(key());

        a.next_control_frame(1, 0);
        a.next_control_frame(1, 0);

        assert_eq!(a.counter().current(), 2);
        assert_eq!(b.counter().current(), 0);
    }
}
