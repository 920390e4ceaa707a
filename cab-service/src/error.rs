//! Service error types
//!
//! Codec failures bubble up unchanged; the HTTP front is expected to turn
//! any of these into a transport-level rejection with no document body.
//! An unknown handler tuple is deliberately *not* an error - the dispatcher
//! answers it with the stub response instead.

use cab_lz77::Lz77Error;
use cab_protocol::{DocumentError, NodeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Envelope header invalid (flag, encoding id, or length field)
    #[error("malformed envelope at offset {offset}: {reason}")]
    MalformedEnvelope { offset: usize, reason: String },

    /// Binary or textual document failed to parse or encode
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Compressed payload failed to inflate
    #[error(transparent)]
    Stream(#[from] Lz77Error),

    /// Tree construction failure while assembling a response
    #[error(transparent)]
    Node(#[from] NodeError),

    /// `model` attribute matches no registered game
    #[error("unknown model {model:?}")]
    UnknownModel { model: String },

    /// Request document is not a well-formed `call`
    #[error("malformed call: {reason}")]
    MalformedCall { reason: String },

    /// Handler accepted the request but failed to produce a reply
    #[error("handler {module}.{method} failed: {message}")]
    Handler {
        module: String,
        method: String,
        message: String,
    },
}

impl ServiceError {
    pub(crate) fn envelope(offset: usize, reason: impl Into<String>) -> Self {
        ServiceError::MalformedEnvelope {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn call(reason: impl Into<String>) -> Self {
        ServiceError::MalformedCall {
            reason: reason.into(),
        }
    }
}
