//! Protocol errors surfaced by commands and event decoding.

use thiserror::Error;

/// Failure of a protocol command or of decoding a pushed event.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The remote end answered a command with an error.
    #[error("{method} failed: {message}")]
    CommandFailed { method: String, message: String },

    /// The transport went away before the command completed. Returned by
    /// every [`MemoryProtocol`](crate::protocol::MemoryProtocol) command
    /// after `disconnect`.
    #[error("protocol connection closed")]
    Disconnected,

    /// A pushed event with a method this crate does not model.
    #[error("unknown protocol event: {0}")]
    UnknownEvent(String),

    /// Event or command parameters did not match the expected shape.
    #[error("invalid params for {method}: {source}")]
    InvalidParams {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    pub fn command_failed(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            method: method.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
