/// Errors surfaced by gateway operations invoked programmatically.
///
/// The dispatch loop itself never returns these; it counts and drops.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Radio or serial transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] cpebridge_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
