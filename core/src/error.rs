//! Error types for the user API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers distinguish "the
//! record is gone" from "the server returned an unexpected status." All
//! other non-2xx responses land in `Http` with the raw status and body.
//! Errors are `Clone` so query and mutation state can hold on to them.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The host could not complete the round trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}
