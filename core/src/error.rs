//! Error types for the quoter client.
//!
//! # Design
//! Local failures (`MissingCredentials`, `InvalidArgument`,
//! `InvalidParameter`) are raised before any request exists, so they never
//! cost a network call. A 404 is only turned into an absent value by the
//! operations that document it (`by_id`, `get_attachment`); everywhere else it
//! stays a `RemoteCall` with the raw status and body.

use std::error::Error as StdError;

use thiserror::Error;

/// Errors returned by `QuoterClient` and `Quoter`.
#[derive(Debug, Error)]
pub enum QuoterError {
    /// A state-mutating call was attempted on a client without an access key.
    #[error("trying to modify quoter without an access key")]
    MissingCredentials,

    /// The caller passed input that violates an operation's contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A non-scalar value was supplied for a query-encoded request.
    #[error("parameter `{name}` is not a scalar and cannot be sent in a query string")]
    InvalidParameter { name: String },

    /// The server returned a non-2xx status that the operation does not tolerate.
    #[error("HTTP {status}: {body}")]
    RemoteCall { status: u16, body: String },

    /// The response could not be interpreted as the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Client configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// No response was obtained.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl QuoterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, QuoterError::RemoteCall { status: 404, .. })
    }
}

/// A failure inside a `Transport` before a response was obtained: malformed
/// URL, DNS, connection refused, I/O while reading the body.
#[derive(Debug, Error)]
#[error("transport failed: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
