use bytes::Bytes;

use crate::error::Result;

/// Size of every datagram the bridge transmits over the radio link.
pub const RADIO_FRAME_LEN: usize = 12;

/// Terminator appended to every line written on the serial link.
pub const LINE_TERMINATOR: &str = "\r\n";

/// The radio link: fire-and-forget datagrams, no acknowledgement.
///
/// Received datagrams carry no length guarantee. Callers validate them.
pub trait RadioTransport {
    /// Transmit one frame.
    fn send(&mut self, frame: &[u8; RADIO_FRAME_LEN]) -> Result<()>;

    /// Return the next pending datagram, or `None` when nothing has arrived.
    ///
    /// Must not block.
    fn try_recv(&mut self) -> Result<Option<Bytes>>;
}

/// The serial link: byte-at-a-time input, whole lines out.
pub trait SerialTransport {
    /// Return the next available byte without blocking.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write `text` followed by [`LINE_TERMINATOR`].
    fn write_line(&mut self, text: &str) -> Result<()>;
}

/// Activity signals surfaced to the operator (LEDs, display pixels, logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorEvent {
    /// A radio frame was authenticated and forwarded to the serial side.
    ReceiveOk,
    /// A serial command was turned into a radio frame and transmitted.
    SendOk,
}

/// Observability hook. Implementations must never block and never fail.
pub trait Indicator {
    fn signal(&mut self, event: IndicatorEvent);
}

/// Indicator that discards every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndicator;

impl Indicator for NullIndicator {
    fn signal(&mut self, _event: IndicatorEvent) {}
}

/// Indicator that turns signals into trace events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogIndicator;

impl Indicator for LogIndicator {
    fn signal(&mut self, event: IndicatorEvent) {
        tracing::trace!(?event, "indicator");
    }
}

impl<T: RadioTransport + ?Sized> RadioTransport for Box<T> {
    fn send(&mut self, frame: &[u8; RADIO_FRAME_LEN]) -> Result<()> {
        (**self).send(frame)
    }

    fn try_recv(&mut self) -> Result<Option<Bytes>> {
        (**self).try_recv()
    }
}

impl<T: SerialTransport + ?Sized> SerialTransport for Box<T> {
    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        (**self).write_line(text)
    }
}

impl<T: Indicator + ?Sized> Indicator for Box<T> {
    fn signal(&mut self, event: IndicatorEvent) {
        (**self).signal(event)
    }
}
