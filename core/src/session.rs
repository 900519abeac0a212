//! Process-wide configuration: transports, credentials and custom headers.
//!
//! # Design
//! A `Session` is built once and only read afterwards, so it can be shared
//! across threads without locking. The default session is constructed lazily
//! on first use.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::document::Decoded;
use crate::error::{Result, TransportError};
use crate::link::Link;
use crate::transport::{BodyEncoding, HttpTransport, Params, Transport};
use crate::validate::validate_url;

static DEFAULT_SESSION: Lazy<Session> = Lazy::new(Session::default);

/// The session used by callers that do not supply one.
pub fn default_session() -> &'static Session {
    &DEFAULT_SESSION
}

/// Build a session. Omitted transports default to a single HTTP transport.
pub fn get_session(
    credentials: Option<HashMap<String, String>>,
    headers: Option<HashMap<String, String>>,
    transports: Option<Vec<Transport>>,
) -> Session {
    Session {
        transports: transports.unwrap_or_else(default_transports),
        credentials: credentials.unwrap_or_default(),
        headers: headers.unwrap_or_default().into_iter().collect(),
    }
}

fn default_transports() -> Vec<Transport> {
    vec![Transport::Http(HttpTransport::default())]
}

/// Serializable session settings, e.g. loaded from a JSON file.
///
/// ```json
/// {
///   "credentials": {"api.example.org": "Bearer abc"},
///   "headers": {"User-Agent": "Example v1.0"},
///   "body_encoding": "form"
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub credentials: HashMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body_encoding: BodyEncoding,
}

#[derive(Debug, Clone)]
pub struct Session {
    transports: Vec<Transport>,
    credentials: HashMap<String, String>,
    headers: BTreeMap<String, String>,
}

impl Default for Session {
    fn default() -> Self {
        get_session(None, None, None)
    }
}

impl Session {
    pub fn from_config(config: SessionConfig) -> Self {
        Self {
            transports: vec![Transport::Http(HttpTransport::new(config.body_encoding))],
            credentials: config.credentials,
            headers: config.headers,
        }
    }

    pub fn transports(&self) -> &[Transport] {
        &self.transports
    }

    /// Credential registered for exactly this hostname.
    pub fn credential_for(&self, host: &str) -> Option<&str> {
        self.credentials.get(host).map(String::as_str)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// First registered transport that handles the scheme of `url`.
    pub fn determine_transport(&self, url: &str) -> Result<&Transport> {
        let schemes: Vec<&str> = self
            .transports
            .iter()
            .flat_map(|t| t.supported_schemes().iter().map(String::as_str))
            .collect();
        let parsed = validate_url(url, &schemes)?;

        self.transports
            .iter()
            .find(|t| t.supports(parsed.scheme()))
            .ok_or_else(|| TransportError::UnsupportedScheme {
                scheme: parsed.scheme().to_string(),
                url: url.to_string(),
            })
    }

    /// Follow `link` with the transport matching its scheme.
    pub fn transition(&self, link: &Link, params: &Params) -> Result<Option<Decoded>> {
        self.determine_transport(link.url())?
            .transition(link, params, Some(self))
    }
}
