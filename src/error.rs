/// Errors surfaced by the link layer.
///
/// Corrupted and misaddressed frames are dropped without a signal to the
/// application; the only failures that cross the interface boundary are
/// interruption of a blocking wait and rejection of an oversized payload.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LinkError {
    /// The interface has been shut down; the blocking wait was interrupted.
    #[error("interface shut down")]
    Shutdown,

    /// Payload exceeds the maximum frame size for this interface.
    #[error("payload of {got} bytes exceeds maximum of {max}")]
    PayloadTooLarge { got: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, LinkError>;
