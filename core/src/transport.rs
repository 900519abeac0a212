//! Following links over HTTP.
//!
//! # Design
//! A transition is split the same way the I/O boundary is: `build_request`
//! turns a link and its parameters into an `HttpRequest`, the transport's
//! `HttpClient` executes it, and `parse_response` decodes the result.
//! `transition` runs all three. Nothing here holds mutable state, so one
//! transport can serve concurrent transitions.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::document::{self, Decoded};
use crate::error::{DecodeError, Result, TransportError};
use crate::headers::resolve_headers;
use crate::http::{HttpClient, HttpRequest, HttpResponse, UreqClient};
use crate::link::{Action, Link, Location};
use crate::session::{default_session, Session};
use crate::validate::validate_url;

/// Parameter values keyed by field name.
pub type Params = Map<String, Value>;

/// How `post`/`put`/`patch` parameters are written into the request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    #[default]
    Json,
    Form,
}

impl BodyEncoding {
    pub fn content_type(&self) -> &'static str {
        match self {
            BodyEncoding::Json => "application/json",
            BodyEncoding::Form => "application/x-www-form-urlencoded",
        }
    }
}

/// The transports a session can hold.
#[derive(Debug, Clone)]
pub enum Transport {
    Http(HttpTransport),
}

impl Transport {
    pub fn supported_schemes(&self) -> &[String] {
        match self {
            Transport::Http(http) => http.supported_schemes(),
        }
    }

    pub fn supports(&self, scheme: &str) -> bool {
        self.supported_schemes().iter().any(|s| s == scheme)
    }

    pub fn transition(
        &self,
        link: &Link,
        params: &Params,
        session: Option<&Session>,
    ) -> Result<Option<Decoded>> {
        match self {
            Transport::Http(http) => http.transition(link, params, session),
        }
    }
}

impl From<HttpTransport> for Transport {
    fn from(http: HttpTransport) -> Self {
        Transport::Http(http)
    }
}

/// HTTP/HTTPS transport.
#[derive(Clone)]
pub struct HttpTransport {
    schemes: Vec<String>,
    encoding: BodyEncoding,
    client: Arc<dyn HttpClient>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("schemes", &self.schemes)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(BodyEncoding::default())
    }
}

impl HttpTransport {
    pub fn new(encoding: BodyEncoding) -> Self {
        Self {
            schemes: vec!["http".to_string(), "https".to_string()],
            encoding,
            client: Arc::new(UreqClient::default()),
        }
    }

    /// Replace the client that performs the network call.
    pub fn with_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = client;
        self
    }

    /// Restrict or extend the URL schemes this transport accepts.
    pub fn with_schemes(mut self, schemes: &[&str]) -> Self {
        self.schemes = schemes.iter().map(|s| s.to_ascii_lowercase()).collect();
        self
    }

    pub fn supported_schemes(&self) -> &[String] {
        &self.schemes
    }

    pub fn encoding(&self) -> BodyEncoding {
        self.encoding
    }

    /// Follow `link` with `params`, dispatching exactly one request.
    ///
    /// Without a session the process default session supplies credentials
    /// and headers. Returns `None` when the response body is empty.
    pub fn transition(
        &self,
        link: &Link,
        params: &Params,
        session: Option<&Session>,
    ) -> Result<Option<Decoded>> {
        let session = session.unwrap_or_else(|| default_session());
        let request = self.build_request(link, params, session)?;
        log::debug!("{} {}", request.method, request.url);
        let response = self.client.execute(request)?;
        self.parse_response(response)
    }

    /// Build the request for `link` without performing any I/O.
    pub fn build_request(
        &self,
        link: &Link,
        params: &Params,
        session: &Session,
    ) -> Result<HttpRequest> {
        validate_url(link.url(), &self.schemes)?;
        let parts = partition(link, params);

        let expanded = expand_path(link.url(), &parts.path);
        let mut url = Url::parse(&expanded).map_err(|source| TransportError::InvalidUrl {
            url: expanded.clone(),
            source,
        })?;

        let action = link.action();
        if action == Action::Get {
            let pairs: Vec<(&String, String)> = parts
                .query
                .iter()
                .flat_map(|(name, value)| query_values(value).into_iter().map(move |text| (name, text)))
                .collect();
            if !pairs.is_empty() {
                let mut query = url.query_pairs_mut();
                for (name, text) in &pairs {
                    query.append_pair(name, text);
                }
            }
        }

        let mut headers = resolve_headers(session, &url);
        let body = match action {
            Action::Post | Action::Put | Action::Patch => self.encode_body(parts.body)?,
            Action::Get | Action::Delete => None,
        };
        if body.is_some() {
            headers.insert("content-type", self.encoding.content_type());
        }

        Ok(HttpRequest {
            method: action.method(),
            url: url.to_string(),
            headers: headers.into_vec(),
            body,
        })
    }

    /// Decode a response. An empty body yields `None`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Option<Decoded>> {
        if !(200..300).contains(&response.status) {
            log::debug!("{} responded with status {}", response.url, response.status);
        }
        if response.body.is_empty() {
            return Ok(None);
        }
        if let Some(content_type) = response.header("content-type") {
            if !is_json(content_type) {
                return Err(DecodeError::UnsupportedMediaType(content_type.to_string()).into());
            }
        }
        let value: Value = serde_json::from_slice(&response.body).map_err(DecodeError::from)?;
        Ok(Some(document::decode(value, &response.url)?))
    }

    fn encode_body(&self, body: Option<Value>) -> Result<Option<String>> {
        let Some(value) = body else {
            return Ok(None);
        };
        match self.encoding {
            BodyEncoding::Json => Ok(Some(value.to_string())),
            BodyEncoding::Form => {
                let Value::Object(map) = value else {
                    return Err(TransportError::InvalidParameters(
                        "form encoding needs an object body".to_string(),
                    ));
                };
                let mut form = url::form_urlencoded::Serializer::new(String::new());
                for (name, value) in &map {
                    for text in query_values(value) {
                        form.append_pair(name, &text);
                    }
                }
                Ok(Some(form.finish()))
            }
        }
    }
}

/// Parameters sorted by where they go in the request.
#[derive(Debug, Default)]
struct Parts {
    query: Params,
    path: Params,
    body: Option<Value>,
}

/// A `body` parameter replaces the whole payload; otherwise `form`
/// parameters are collected into an object.
fn partition(link: &Link, params: &Params) -> Parts {
    let mut parts = Parts::default();
    let mut form = Params::new();
    let mut body = None;

    for (name, value) in params {
        match link.location_of(name) {
            Location::Query => {
                parts.query.insert(name.clone(), value.clone());
            }
            Location::Path => {
                parts.path.insert(name.clone(), value.clone());
            }
            Location::Form => {
                form.insert(name.clone(), value.clone());
            }
            Location::Body => body = Some(value.clone()),
        }
    }

    parts.body = body.or_else(|| (!form.is_empty()).then_some(Value::Object(form)));
    parts
}

/// Fill `{name}` placeholders. Unknown placeholders expand to nothing.
fn expand_path(template: &str, path: &Params) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 1..start + len];
        if let Some(value) = path.get(name) {
            // byte_serialize escapes a literal '+', so any '+' left is a space.
            let text = scalar_text(value);
            let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
            out.push_str(&encoded.replace('+', "%20"));
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

/// Query and form values: arrays repeat the key and nulls are dropped.
fn query_values(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(scalar_text)
            .collect(),
        other => vec![scalar_text(other)],
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
