//! Gateway bridging an encrypted short-range sensor radio network to a serial host.
//!
//! Remote nodes broadcast 12-byte authenticated MEASURE frames; the gateway
//! republishes them as JSON lines on the serial link and turns `SETORDER`
//! commands from the host into CONTROL frames.
//!
//! # Crate Structure
//!
//! - [`transport`]: Radio, serial and indicator collaborators
//! - [`frame`]: 12-byte frame codec, keyed transform, sensor-order packing
//! - [`gateway`]: Dispatch loop, command parsing, telemetry formatting

/// Re-export transport types.
pub mod transport {
    pub use cpebridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use cpebridge_frame::*;
}

/// Re-export gateway types.
pub mod gateway {
    pub use cpebridge_gateway::*;
}
