//! URL scheme and hostname checks run before any request is dispatched.

use url::Url;

use crate::error::{Result, TransportError};

/// Parse `url` and check it can be dispatched by a transport handling
/// `supported_schemes`. Pure; performs no I/O.
pub fn validate_url<S: AsRef<str>>(url: &str, supported_schemes: &[S]) -> Result<Url> {
    let supports = |scheme: &str| supported_schemes.iter().any(|s| s.as_ref() == scheme);

    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Err(TransportError::MissingScheme(url.to_string()));
        }
        // `ftp://` fails to parse for lack of a host, but the scheme is the
        // more useful complaint.
        Err(url::ParseError::EmptyHost) => {
            return match raw_scheme(url) {
                Some(scheme) if !supports(&scheme) => Err(TransportError::UnsupportedScheme {
                    scheme,
                    url: url.to_string(),
                }),
                _ => Err(TransportError::MissingHostname(url.to_string())),
            };
        }
        Err(source) => {
            return Err(TransportError::InvalidUrl {
                url: url.to_string(),
                source,
            });
        }
    };

    if !supports(parsed.scheme()) {
        return Err(TransportError::UnsupportedScheme {
            scheme: parsed.scheme().to_string(),
            url: url.to_string(),
        });
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(TransportError::MissingHostname(url.to_string())),
    }
}

fn raw_scheme(url: &str) -> Option<String> {
    let (scheme, _) = url.split_once(':')?;
    let mut chars = scheme.chars();
    let valid = chars.next()?.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTTP: &[&str] = &["http", "https"];

    #[test]
    fn accepts_http_and_https() {
        let url = validate_url("http://example.org/123", HTTP).unwrap();
        assert_eq!(url.host_str(), Some("example.org"));
        assert!(validate_url("https://example.org", HTTP).is_ok());
    }

    #[test]
    fn missing_scheme() {
        for url in ["example.org", "/relative/path", ""] {
            let err = validate_url(url, HTTP).unwrap_err();
            assert!(matches!(err, TransportError::MissingScheme(_)), "{url}: {err}");
        }
    }

    #[test]
    fn unsupported_scheme() {
        for url in ["ftp://example.org", "ftp://", "mailto:someone@example.org"] {
            let err = validate_url(url, HTTP).unwrap_err();
            assert!(matches!(err, TransportError::UnsupportedScheme { .. }), "{url}: {err}");
        }
    }

    #[test]
    fn missing_hostname() {
        let err = validate_url("http://", HTTP).unwrap_err();
        assert!(matches!(err, TransportError::MissingHostname(_)));
    }

    #[test]
    fn bad_port_is_invalid_url() {
        let err = validate_url("http://example.org:99999/", HTTP).unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl { .. }));
    }

    #[test]
    fn scheme_set_is_configurable() {
        assert!(validate_url("http://example.org", &["https"]).is_err());
        assert!(validate_url("https://example.org", &["https".to_string()]).is_ok());
    }
}
