//! Transport trait and the ureq-backed implementation.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use ureq::{Agent, RequestBuilder};

use crate::error::TransportError;
use crate::request::{Method, Request, Response};

/// Default ceiling on a response body, in bytes. Larger bodies fail as a
/// transport error.
pub const MAX_BODY_BYTES: u64 = 100 * 1024 * 1024;

/// Sends a fully-built [`Request`] and returns the response with its body read.
pub trait Transport {
    /// Perform one HTTP exchange.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network failure. Error statuses are
    /// returned as a normal [`Response`].
    fn send(&self, request: &Request) -> Result<Response, TransportError>;

    /// Release held connections.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the transport cannot be shut down cleanly.
    fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }

    fn close(&self) -> Result<(), TransportError> {
        (**self).close()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }

    fn close(&self) -> Result<(), TransportError> {
        (**self).close()
    }
}

/// Blocking transport over a ureq [`Agent`].
///
/// The timeout applies uniformly to every call made through this transport.
pub struct UreqTransport {
    agent: Agent,
    body_limit: u64,
}

impl UreqTransport {
    /// Create a transport with a global per-request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            body_limit: MAX_BODY_BYTES,
        }
    }

    /// Replace the response body ceiling.
    #[must_use]
    pub fn with_body_limit(mut self, bytes: u64) -> Self {
        self.body_limit = bytes;
        self
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        debug!(method = request.method.as_str(), url = %request.url, "Sending request");

        let mut response = match request.method {
            Method::Get => decorate(self.agent.get(&request.url), request).call()?,
            Method::Post => {
                decorate(self.agent.post(&request.url), request).send(body_of(request))?
            }
            Method::Put => decorate(self.agent.put(&request.url), request).send(body_of(request))?,
        };

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_string()?;
        Ok(Response { status, body })
    }
}

fn decorate<B>(mut builder: RequestBuilder<B>, request: &Request) -> RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn body_of(request: &Request) -> &[u8] {
    request.body.as_deref().unwrap_or_default()
}
