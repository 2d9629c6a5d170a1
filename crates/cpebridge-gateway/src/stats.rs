use serde::Serialize;

/// Internal counters. They never influence what is written to the serial link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GatewayStats {
    pub datagrams_received: u64,
    pub measurements_forwarded: u64,
    pub controls_echoed: u64,
    pub dropped_bad_length: u64,
    pub dropped_unknown_type: u64,
    pub dropped_auth_failed: u64,
    pub lines_received: u64,
    pub lines_discarded: u64,
    pub commands_ignored: u64,
    pub control_frames_sent: u64,
    pub radio_send_failures: u64,
    pub serial_write_failures: u64,
}

impl GatewayStats {
    /// Datagrams dropped for any reason.
    pub fn dropped_total(&self) -> u64 {
        self.dropped_bad_length + self.dropped_unknown_type + self.dropped_auth_failed
    }
}
