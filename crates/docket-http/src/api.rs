//! Per-service request builder.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::error::TransportError;
use crate::request::{Method, Request, Response};
use crate::transport::Transport;

/// Characters escaped when an identifier is placed in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode an identifier for use as one URL path segment.
#[must_use]
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// `Authorization` header value for HTTP basic authentication.
#[must_use]
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Base URL, credentials and transport for one remote service.
pub struct ApiClient {
    transport: Box<dyn Transport>,
    base_url: String,
    authorization: String,
}

impl ApiClient {
    /// Create an API client. Trailing slashes are removed from `base_url`.
    #[must_use]
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_owned(),
            authorization: basic_auth_header(username, password),
        }
    }

    /// Service base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request to `path` with authentication and JSON accept headers.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> Request {
        let url = if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };
        Request::new(method, url)
            .header("Authorization", self.authorization.as_str())
            .header("Accept", "application/json")
    }

    /// Send a request through the transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response could be obtained.
    pub fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        self.transport.send(request)
    }

    /// Release the transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the transport fails to close.
    pub fn close(&self) -> Result<(), TransportError> {
        self.transport.close()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::MockTransport;

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(
            basic_auth_header("alice", "s3cret"),
            "Basic YWxpY2U6czNjcmV0"
        );
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("PROJ-1"), "PROJ-1");
        assert_eq!(encode_path_segment("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn test_request_joins_base_url_and_sets_headers() {
        let api = ApiClient::new(
            "https://wiki.example.com/",
            "alice",
            "s3cret",
            Box::new(MockTransport::new()),
        );
        let request = api.request(Method::Get, "/rest/api/content/1");

        assert_eq!(request.url, "https://wiki.example.com/rest/api/content/1");
        assert_eq!(request.header_value("accept"), Some("application/json"));
        assert_eq!(
            request.header_value("authorization"),
            Some("Basic YWxpY2U6czNjcmV0")
        );
    }

    #[test]
    fn test_request_accepts_relative_path() {
        let api = ApiClient::new("https://x", "u", "p", Box::new(MockTransport::new()));
        assert_eq!(api.request(Method::Get, "rest/api/space").url, "https://x/rest/api/space");
    }
}
