//! HTTP request/response values and the client that dispatches them.
//!
//! # Design
//! Requests and responses are plain data. `HttpTransport::build_request`
//! produces an `HttpRequest` without touching the network and
//! `HttpTransport::parse_response` consumes an `HttpResponse`, so a host that
//! runs its own I/O can drive the transport directly. `HttpClient` is the one
//! seam where I/O happens; `UreqClient` is the blocking default.

use std::fmt;

use ureq::ResponseExt;

use crate::error::{Result, TransportError};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value whose name matches `name` case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// `url` is the effective URL after redirects; decoded documents resolve
/// relative link URLs against it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Executes exactly one HTTP request.
///
/// Implementations must map every network-level failure to
/// `TransportError::ConnectionFailed` and must not retry. A request that
/// cannot be assembled, such as one with an invalid header value, is
/// `TransportError::InvalidParameters`.
pub trait HttpClient: fmt::Debug + Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Blocking client backed by a `ureq` agent.
///
/// HTTP error statuses are returned as responses rather than errors so the
/// decode step sees every body the server sends.
#[derive(Debug, Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl HttpClient for UreqClient {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        // A malformed header is rejected while the request is assembled,
        // before any connection is opened.
        let connection_failed = |source: ureq::Error| match source {
            ureq::Error::Http(err) => TransportError::InvalidParameters(err.to_string()),
            source => TransportError::ConnectionFailed {
                url: url.clone(),
                source: Box::new(source),
            },
        };

        let result = match method {
            HttpMethod::Get => with_headers(self.agent.get(&url), &headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(&url), &headers).call(),
            HttpMethod::Post => send(with_headers(self.agent.post(&url), &headers), body),
            HttpMethod::Put => send(with_headers(self.agent.put(&url), &headers), body),
            HttpMethod::Patch => send(with_headers(self.agent.patch(&url), &headers), body),
        };
        let mut response = result.map_err(connection_failed)?;

        let status = response.status().as_u16();
        let effective_url = response.get_uri().to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response.body_mut().read_to_vec().map_err(connection_failed)?;

        Ok(HttpResponse {
            status,
            url: effective_url,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<String>,
) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://example.org/".to_string(),
            headers: vec![("User-Agent".to_string(), "Example v1.0".to_string())],
            body: None,
        };
        assert_eq!(req.header("user-agent"), Some("Example v1.0"));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn method_names_are_uppercase_verbs() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }

    #[test]
    fn malformed_header_fails_before_connecting() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let req = HttpRequest {
            method: HttpMethod::Get,
            url: format!("http://{addr}/"),
            headers: vec![("authorization".to_string(), "Basic a\nb".to_string())],
            body: None,
        };
        let err = UreqClient::default().execute(req).unwrap_err();
        assert!(matches!(err, TransportError::InvalidParameters(_)), "{err}");
    }

    #[test]
    fn unreachable_host_is_connection_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let req = HttpRequest {
            method: HttpMethod::Get,
            url: format!("http://{addr}/"),
            headers: Vec::new(),
            body: None,
        };
        let err = UreqClient::default().execute(req).unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
    }
}
