//! Error taxonomy for the request path.
//!
//! - [`ValidationError`]: the body could not be turned into a presence
//! - [`TransmissionError`]: the presence sink failed to publish
//! - [`DispatchError`]: either of the above, as seen at the request boundary
//!
//! Every variant is terminal for the request that produced it. Nothing here
//! is retried.

use thiserror::Error;

/// Failure to derive a [`PresenceUpdate`](crate::PresenceUpdate) from a body.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The body is not a JSON object.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    /// A field is present but has the wrong shape.
    #[error("invalid field: {0}")]
    InvalidField(String),
}

/// Failure reported by a [`PresenceSink`](crate::PresenceSink).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransmissionError {
    /// The broadcast channel is not connected.
    #[error("presence channel unavailable: {0}")]
    Unavailable(String),
    /// The remote end answered with an error.
    #[error("presence rejected: {0}")]
    Rejected(String),
    /// The channel broke mid-exchange.
    #[error("presence transport error: {0}")]
    Io(String),
}

/// Anything that ends a `/update_rpc` request with a 500.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Normalization failed; the sink was never called.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The sink was called and failed.
    #[error(transparent)]
    Transmission(#[from] TransmissionError),
}

impl DispatchError {
    /// HTTP status reported to the caller.
    pub fn status_code(&self) -> u16 {
        500
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::MalformedPayload(_)) => "malformed_payload",
            Self::Validation(ValidationError::InvalidField(_)) => "invalid_field",
            Self::Transmission(_) => "transmission",
        }
    }
}
