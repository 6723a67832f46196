//! Error types for the mite API client.
//!
//! # Design
//! `NotFound` and `Unauthorized` get dedicated variants because callers
//! frequently branch on "the record does not exist" and "the api key was
//! rejected". All other non-2xx responses land in `Http` with the raw status
//! code and body for debugging.
//!
//! A missing envelope key is never an error; see `envelope::unwrap_envelope`.

use thiserror::Error;

/// Errors returned by `MiteClient` build and parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found: {body}")]
    NotFound { body: String },

    /// The server returned 401; the api key is missing or wrong.
    #[error("unauthorized: api key rejected: {body}")]
    Unauthorized { body: String },

    /// The server returned a non-2xx status other than 401 and 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be decoded as JSON or into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request parameters could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A response was neither an array nor an object, so there is no envelope
    /// to look into.
    #[error("cannot unwrap `{key}` from a JSON {found}")]
    InvalidResponseShape { key: String, found: &'static str },

    /// A required environment variable was not set.
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
}
