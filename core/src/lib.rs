//! Transport layer for a hypermedia API client.
//!
//! # Overview
//! Follows a `Link` (URL + action + fields) by issuing one HTTP request with
//! per-host credentials and session headers applied, then decodes the body
//! into a `Document` or plain data.
//!
//! # Design
//! - `Session` is read-only after construction; `default_session()` is a
//!   lazily built process-wide instance safe to share between threads.
//! - `Transport` is a closed enum selected by URL scheme. `HttpTransport`
//!   splits each transition into `build_request` (no I/O), one
//!   `HttpClient::execute` call, and `parse_response`.
//! - URLs are validated before any request is built, so scheme and hostname
//!   errors never touch the network.

pub mod document;
pub mod error;
pub mod headers;
pub mod http;
pub mod link;
pub mod session;
pub mod transport;
pub mod validate;

pub use document::{Decoded, Document, Element};
pub use error::{DecodeError, Result, TransportError};
pub use headers::{resolve_headers, Headers};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, UreqClient};
pub use link::{Action, Field, Link, Location};
pub use session::{default_session, get_session, Session, SessionConfig};
pub use transport::{BodyEncoding, HttpTransport, Params, Transport};
pub use validate::validate_url;
