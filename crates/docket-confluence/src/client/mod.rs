//! Confluence REST API client.
//!
//! Sync client for Confluence Server/Data Center with basic authentication.
//! Every call goes through a [`Transport`], so tests can script responses.

mod pages;

pub use pages::{DEFAULT_PAGE_SIZE, Failure};

use docket_config::ServiceSettings;
use docket_http::{ApiClient, Method, Request, Response, Transport, UreqTransport};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::ConfluenceError;

/// Confluence REST API client.
pub struct ConfluenceClient {
    api: ApiClient,
}

impl ConfluenceClient {
    /// Create a client over HTTP using the settings' timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfluenceError::Config`] if base URL, username or password is empty.
    pub fn new(settings: &ServiceSettings) -> Result<Self, ConfluenceError> {
        Self::with_transport(settings, Box::new(UreqTransport::new(settings.timeout)))
    }

    /// Create a client over an explicit transport.
    ///
    /// # Errors
    ///
    /// Returns [`ConfluenceError::Config`] if base URL, username or password is empty.
    pub fn with_transport(
        settings: &ServiceSettings,
        transport: Box<dyn Transport>,
    ) -> Result<Self, ConfluenceError> {
        settings.validate()?;
        Ok(Self {
            api: ApiClient::new(
                &settings.base_url,
                &settings.username,
                &settings.password,
                transport,
            ),
        })
    }

    /// Server base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Verify that the base URL and credentials work.
    ///
    /// # Errors
    ///
    /// Returns [`ConfluenceError::Connect`] on network failure or a non-2xx status.
    pub fn connect(&self) -> Result<(), ConfluenceError> {
        info!(base_url = %self.base_url(), "Connecting to Confluence");
        let request = self.api.request(Method::Get, "/rest/api/space").query("limit", 1);
        self.send(&request)
            .map(drop)
            .map_err(|e| ConfluenceError::Connect(e.to_string()))
    }

    /// Release the transport. Failures are logged, not returned.
    pub fn close(self) {
        if let Err(e) = self.api.close() {
            warn!(error = %e, "Failed to close Confluence connection");
        }
    }

    /// Connect, run `body`, and close on every exit path.
    ///
    /// # Errors
    ///
    /// Returns the connection error, or whatever `body` returns.
    pub fn scoped<T, E, F>(self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<ConfluenceError>,
    {
        if let Err(e) = self.connect() {
            self.close();
            return Err(e.into());
        }
        let result = body(&self);
        self.close();
        result
    }

    /// Send a request, turning network failures and error statuses into
    /// [`ConfluenceError::Request`].
    fn send(&self, request: &Request) -> Result<Response, ConfluenceError> {
        let response = self
            .api
            .execute(request)
            .map_err(|e| ConfluenceError::Request {
                status: None,
                message: format!("Confluence request failed: {e}"),
            })?;

        if !response.is_success() {
            return Err(ConfluenceError::Request {
                status: Some(response.status),
                message: error_message(&response),
            });
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, request: &Request) -> Result<T, ConfluenceError> {
        Ok(self.send(request)?.json()?)
    }
}

/// Build a client from settings and run `body` inside [`ConfluenceClient::scoped`].
///
/// # Errors
///
/// Returns configuration and connection errors, or whatever `body` returns.
pub fn with_confluence<T, E, F>(settings: &ServiceSettings, body: F) -> Result<T, E>
where
    F: FnOnce(&ConfluenceClient) -> Result<T, E>,
    E: From<ConfluenceError>,
{
    ConfluenceClient::new(settings)?.scoped(body)
}

/// Upstream `message` or `reason`, else a generic description.
fn error_message(response: &Response) -> String {
    serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|payload| {
            ["message", "reason"].iter().find_map(|key| {
                payload
                    .get(key)
                    .and_then(serde_json::Value::as_str)
                    .filter(|text| !text.is_empty())
                    .map(str::to_owned)
            })
        })
        .unwrap_or_else(|| format!("Confluence API call failed ({})", response.status))
}
