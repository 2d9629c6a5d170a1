//! In-memory transports for tests and simulation.

use std::collections::VecDeque;

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::traits::{
    Indicator, IndicatorEvent, RadioTransport, SerialTransport, LINE_TERMINATOR, RADIO_FRAME_LEN,
};

/// A radio link backed by queues.
///
/// Datagrams pushed with [`MemoryRadio::deliver`] are returned by `try_recv`;
/// frames passed to `send` are recorded in order.
#[derive(Debug, Default)]
pub struct MemoryRadio {
    inbound: VecDeque<Bytes>,
    sent: Vec<[u8; RADIO_FRAME_LEN]>,
    fail_sends: bool,
}

impl MemoryRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a datagram as if it had just arrived over the air.
    pub fn deliver(&mut self, datagram: impl Into<Bytes>) {
        self.inbound.push_back(datagram.into());
    }

    /// Frames transmitted so far.
    pub fn sent(&self) -> &[[u8; RADIO_FRAME_LEN]] {
        &self.sent
    }

    /// Remove and return the transmitted frames.
    pub fn take_sent(&mut self) -> Vec<[u8; RADIO_FRAME_LEN]> {
        std::mem::take(&mut self.sent)
    }

    /// Make subsequent sends fail with [`TransportError::Closed`].
    pub fn set_fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }

    /// Number of datagrams still waiting to be received.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }
}

impl RadioTransport for MemoryRadio {
    fn send(&mut self, frame: &[u8; RADIO_FRAME_LEN]) -> Result<()> {
        if self.fail_sends {
            return Err(TransportError::Closed);
        }
        self.sent.push(*frame);
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<Bytes>> {
        Ok(self.inbound.pop_front())
    }
}

/// A serial link backed by a byte queue and a string sink.
#[derive(Debug, Default)]
pub struct MemorySerial {
    input: VecDeque<u8>,
    output: String,
}

impl MemorySerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the host had typed them.
    pub fn push_input(&mut self, bytes: impl AsRef<[u8]>) {
        self.input.extend(bytes.as_ref());
    }

    /// Everything written so far, terminators included.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Written lines with terminators stripped.
    pub fn lines(&self) -> Vec<&str> {
        self.output
            .split_terminator(LINE_TERMINATOR)
            .collect::<Vec<_>>()
    }

    /// Number of input bytes not yet consumed.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}

impl SerialTransport for MemorySerial {
    fn read_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        self.output.push_str(text);
        self.output.push_str(LINE_TERMINATOR);
        Ok(())
    }
}

/// Indicator that records every signal it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingIndicator {
    events: Vec<IndicatorEvent>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[IndicatorEvent] {
        &self.events
    }

    /// Count of recorded occurrences of `event`.
    pub fn count(&self, event: IndicatorEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }
}

impl Indicator for RecordingIndicator {
    fn signal(&mut self, event: IndicatorEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radio_delivers_in_order() {
        let mut radio = MemoryRadio::new();
        radio.deliver(vec![1u8, 2, 3]);
        radio.deliver(vec![4u8]);

        assert_eq!(radio.pending(), 2);
        assert_eq!(radio.try_recv().unwrap().unwrap().as_ref(), &[1, 2, 3]);
        assert_eq!(radio.try_recv().unwrap().unwrap().as_ref(), &[4]);
        assert!(radio.try_recv().unwrap().is_none());
    }

    #[test]
    fn radio_records_sent_frames() {
        let mut radio = MemoryRadio::new();
        radio.send(&[7u8; RADIO_FRAME_LEN]).unwrap();

        assert_eq!(radio.sent(), &[[7u8; RADIO_FRAME_LEN]]);
        assert_eq!(radio.take_sent().len(), 1);
        assert!(radio.sent().is_empty());
    }

    #[test]
    fn radio_send_failure() {
        let mut radio = MemoryRadio::new();
        radio.set_fail_sends(true);

        let err = radio.send(&[0u8; RADIO_FRAME_LEN]).unwrap_err();
        assert!(matches!(err, TransportError::Closed));
        assert!(radio.sent().is_empty());
    }

    #[test]
    fn serial_reads_bytes_and_collects_lines() {
        let mut serial = MemorySerial::new();
        serial.push_input("ab");

        assert_eq!(serial.read_byte(), Some(b'a'));
        assert_eq!(serial.read_byte(), Some(b'b'));
        assert_eq!(serial.read_byte(), None);

        serial.write_line("one").unwrap();
        serial.write_line("two").unwrap();
        assert_eq!(serial.output(), "one\r\ntwo\r\n");
        assert_eq!(serial.lines(), vec!["one", "two"]);
    }

    #[test]
    fn recording_indicator_counts() {
        let mut indicator = RecordingIndicator::new();
        indicator.signal(IndicatorEvent::ReceiveOk);
        indicator.signal(IndicatorEvent::SendOk);
        indicator.signal(IndicatorEvent::ReceiveOk);

        assert_eq!(indicator.count(IndicatorEvent::ReceiveOk), 2);
        assert_eq!(indicator.count(IndicatorEvent::SendOk), 1);
        assert_eq!(indicator.events().len(), 3);
    }
}
