//! Error types for the relay client.

use thiserror::Error;

/// Errors returned by the relay client.
#[derive(Error, Debug)]
pub enum Error {
    /// The supplied private key was not valid hex or nsec.
    #[error("invalid private key encoding: {0}")]
    InvalidKeyEncoding(String),

    /// Establishing the relay session failed.
    #[error("failed to connect to relay {url}: {reason}")]
    Connection { url: String, reason: String },

    /// An operation requiring a live session was called without one.
    #[error("no relay connected")]
    NotConnected,

    /// The relay rejected the event or the transport failed mid-publish.
    #[error("publish failed: {0}")]
    Publish(String),

    /// Producing a signature over the event id failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A locally signed event failed its own verification. Indicates a
    /// defect in event construction, not bad user input.
    #[error("event failed verification after signing")]
    VerificationFault,

    /// An event field that should be hex could not be decoded.
    #[error("malformed event field: {0}")]
    MalformedEvent(String),

    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
