//! Error types for tokenkeeper.
//!
//! One error enum covers every failure the session lifecycle can observe,
//! with variants chosen so that callers can tell the recoverable cases
//! (transport hiccups) from the terminal ones (a refresh credential the
//! server no longer accepts).

use std::fmt;
use thiserror::Error;

/// The unified error type for tokenkeeper operations.
///
/// Errors are `Clone` so that the `error` session state can carry its cause
/// and hand a copy to every subscriber.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Network-level failure: unreachable endpoint, timeout, malformed envelope.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server declared the refresh credential unusable.
    ///
    /// Unlike every other failure this one is terminal: the stored refresh
    /// credential is evicted when it is observed during renewal.
    #[error("refresh credential or user id invalid")]
    InvalidCredential,

    /// Any other failure reported by the server.
    #[error("{0}")]
    Server(#[from] ServerError),

    /// A credential could not be decoded into claims.
    #[error("malformed credential: {0}")]
    MalformedCredential(#[from] MalformedCredential),

    /// The operation requires an authenticated session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Input validation errors (endpoint URL format).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true for failures that may succeed if retried unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status and no error body.
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// The response envelope could not be understood.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

/// A failure reported by the authentication endpoint.
///
/// The message is meant to be shown to the user verbatim.
#[derive(Debug, Clone)]
pub struct ServerError {
    /// Human-readable message from the server.
    pub message: String,
    /// Machine-readable error code, when the server sent one.
    pub code: Option<String>,
}

impl ServerError {
    /// Create a new server error.
    pub fn new(message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// Create a server error from a message alone.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(message, None)
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ServerError {}

/// Why a credential could not be decoded.
#[derive(Debug, Clone, Error)]
pub enum MalformedCredential {
    /// The credential is not three dot-separated segments.
    #[error("expected three dot-separated segments")]
    Shape,

    /// The payload segment is not valid base64url.
    #[error("payload is not base64url: {0}")]
    Encoding(String),

    /// The payload is not the expected JSON document.
    #[error("payload is not valid claims JSON: {0}")]
    Payload(String),

    /// The claims namespace is absent from the payload.
    #[error("claims namespace '{0}' is missing")]
    MissingNamespace(String),

    /// The credential contains bytes that cannot be sent in a header.
    #[error("credential cannot be sent as a header value")]
    HeaderValue,
}

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// Invalid endpoint URL.
    #[error("invalid endpoint URL '{value}': {reason}")]
    Endpoint { value: String, reason: String },

    /// Role name that cannot be sent as a header value.
    #[error("invalid role '{value}'")]
    Role { value: String },
}
