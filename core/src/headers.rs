//! Per-host credentials and session-wide custom headers.

use url::Url;

use crate::session::Session;

/// Media types the transport asks for on every request.
pub const ACCEPT: &str =
    "application/coreapi+json, application/vnd.coreapi+json, application/json, */*";

/// Ordered header set with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing any existing header that matches it
    /// case-insensitively. The new spelling of the name wins.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.0.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.0.push((name.to_string(), value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.0
    }
}

/// Headers for a request to `url` under `session`.
///
/// `authorization` is only present when the URL's hostname exactly matches a
/// credentials entry. Session headers apply to every host and override the
/// transport defaults.
pub fn resolve_headers(session: &Session, url: &Url) -> Headers {
    let mut headers = Headers::new();
    headers.insert("accept", ACCEPT);

    if let Some(credential) = url.host_str().and_then(|host| session.credential_for(host)) {
        headers.insert("authorization", credential);
    }
    for (name, value) in session.headers() {
        headers.insert(name, value);
    }
    headers
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::session::get_session;

    const CREDENTIAL: &str = "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn credentials_only_for_matching_host() {
        let credentials = HashMap::from([("example.org".to_string(), CREDENTIAL.to_string())]);
        let session = get_session(Some(credentials), None, None);

        let headers = resolve_headers(&session, &url("http://example.org/123"));
        assert_eq!(headers.get("authorization"), Some(CREDENTIAL));

        let headers = resolve_headers(&session, &url("http://other.org/123"));
        assert_eq!(headers.get("authorization"), None);

        let headers = resolve_headers(&session, &url("http://api.example.org/123"));
        assert_eq!(headers.get("authorization"), None);
    }

    #[test]
    fn custom_headers_apply_to_every_host() {
        let headers = HashMap::from([("User-Agent".to_string(), "Example v1.0".to_string())]);
        let session = get_session(None, Some(headers), None);

        for target in ["http://example.org/123", "https://other.org/"] {
            let resolved = resolve_headers(&session, &url(target));
            assert_eq!(resolved.get("user-agent"), Some("Example v1.0"));
        }
    }

    #[test]
    fn session_headers_override_defaults_case_insensitively() {
        let headers = HashMap::from([("Accept".to_string(), "application/json".to_string())]);
        let session = get_session(None, Some(headers), None);

        let resolved = resolve_headers(&session, &url("http://example.org/"));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get("accept"), Some("application/json"));
    }

    #[test]
    fn defaults_only_without_configuration() {
        let session = get_session(None, None, None);
        let resolved = resolve_headers(&session, &url("http://example.org/"));
        assert_eq!(resolved.into_vec(), vec![("accept".to_string(), ACCEPT.to_string())]);
    }
}
