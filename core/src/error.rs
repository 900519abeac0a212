//! Error types for the hypermedia transport.
//!
//! # Design
//! URL validation failures (`MissingScheme`, `UnsupportedScheme`,
//! `MissingHostname`, `InvalidUrl`) and `InvalidParameters` are raised before
//! any network I/O and depend only on their inputs. `ConnectionFailed` and
//! `Decode` can only happen once a request has been dispatched. None of them
//! are retried.

use thiserror::Error;

/// Errors returned by a transition.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The URL has no scheme component at all (e.g. `example.org`).
    #[error("URL {0:?} is missing a scheme")]
    MissingScheme(String),

    /// No registered transport handles the URL's scheme.
    #[error("unsupported URL scheme {scheme:?} in {url:?}")]
    UnsupportedScheme { scheme: String, url: String },

    /// The URL has a supported scheme but no hostname (e.g. `http://`).
    #[error("URL {0:?} is missing a hostname")]
    MissingHostname(String),

    /// The URL could not be parsed for another reason, such as a bad port.
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The parameters cannot be encoded with the transport's body encoding,
    /// or a header value is not valid HTTP.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The response body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(#[from] DecodeError),
}

/// Reasons a response body could not be turned into a document or value.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported media type {0:?}")]
    UnsupportedMediaType(String),

    #[error("invalid link: {0}")]
    InvalidLink(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
