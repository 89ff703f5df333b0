//! Protocol error types.

use thiserror::Error;

/// Result alias for envelope encoding and decoding.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding or encoding envelopes.
///
/// Decode errors never terminate a connection. The observer logs them and
/// drops the offending frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not valid JSON
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Frame is valid JSON but not an object
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// Envelope has no `type` tag
    #[error("envelope has no type tag")]
    MissingType,

    /// Envelope `type` tag is not a string
    #[error("envelope type tag is not a string")]
    InvalidType,

    /// Known envelope kind with a payload that does not match its shape
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        /// Envelope or game event tag
        kind: String,
        /// Underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// Known envelope kind missing a required field
    #[error("{kind} envelope is missing {field}")]
    MissingField {
        /// Envelope tag
        kind: String,
        /// Name of the missing field
        field: &'static str,
    },

    /// Outbound envelope could not be serialized
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}
