use std::time::Duration;

/// Default cap on an assembled serial line, in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 128;

/// Default sleep between polls when both queues are idle.
pub const DEFAULT_IDLE_SLEEP: Duration = Duration::from_millis(2);

/// Controls gateway dispatch behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// When true, device ids must be decimal integers in 0..=255; surrounding
    /// blanks are allowed.
    /// When false, ids are read like C `atoi` and truncated to 8 bits.
    pub strict_device_id: bool,
    /// Lines longer than this are discarded whole.
    pub max_line_len: usize,
    /// Sleep between polls when nothing is pending.
    pub idle_sleep: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            strict_device_id: true,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            idle_sleep: DEFAULT_IDLE_SLEEP,
        }
    }
}
