//! Transport collaborators for the CPE radio bridge.
//!
//! The gateway core never touches hardware directly. It talks to three
//! collaborators defined here:
//! - [`RadioTransport`]: sends and receives opaque radio datagrams
//! - [`SerialTransport`]: byte-oriented input, line-oriented output
//! - [`Indicator`]: optional, non-blocking activity signals
//!
//! This is the lowest layer of cpebridge. Concrete implementations cover a
//! UDP stand-in for the radio link, stream-backed serial ports, and
//! in-memory doubles for tests and simulation.

pub mod error;
pub mod memory;
pub mod stream;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use memory::{MemoryRadio, MemorySerial, RecordingIndicator};
pub use stream::StreamSerial;
pub use traits::{
    Indicator, IndicatorEvent, LogIndicator, NullIndicator, RadioTransport, SerialTransport,
    LINE_TERMINATOR, RADIO_FRAME_LEN,
};
pub use udp::{UdpRadio, UdpRadioConfig, DEFAULT_GATEWAY_PORT, DEFAULT_NODE_PORT};
