//! Jira REST API client.
//!
//! Sync client for Jira Server/Data Center (REST API v2 and the Service Desk
//! API) with basic authentication. The client owns a display-name → field id
//! cache filled from one field listing on the first unresolved lookup.

mod fields;
mod issues;
mod listing;
mod service_desk;

pub use issues::TransitionOutcome;
pub use listing::{Failure, IssueFields, ListOptions, issue_url};
pub use service_desk::SERVICE_DESK_PAGE_LIMIT;

use std::cell::RefCell;
use std::collections::HashMap;

use docket_config::ServiceSettings;
use docket_http::{ApiClient, Method, Request, Response, Transport, UreqTransport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::JiraError;

/// Field ids by lower-cased display name.
#[derive(Debug, Default)]
struct FieldCache {
    ids: HashMap<String, String>,
    loaded: bool,
}

/// Jira REST API client.
pub struct JiraClient {
    api: ApiClient,
    field_cache: RefCell<FieldCache>,
}

impl JiraClient {
    /// Create a client over HTTP using the settings' timeout.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Config`] if base URL, username or password is empty.
    pub fn new(settings: &ServiceSettings) -> Result<Self, JiraError> {
        Self::with_transport(settings, Box::new(UreqTransport::new(settings.timeout)))
    }

    /// Create a client over an explicit transport.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Config`] if base URL, username or password is empty.
    pub fn with_transport(
        settings: &ServiceSettings,
        transport: Box<dyn Transport>,
    ) -> Result<Self, JiraError> {
        settings.validate()?;
        Ok(Self {
            api: ApiClient::new(
                &settings.base_url,
                &settings.username,
                &settings.password,
                transport,
            ),
            field_cache: RefCell::new(FieldCache::default()),
        })
    }

    /// Server base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Verify credentials with the current-user endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Connect`] on network failure or a non-2xx status.
    pub fn connect(&self) -> Result<(), JiraError> {
        info!(base_url = %self.base_url(), "Connecting to Jira");
        let request = self.api.request(Method::Get, "/rest/api/2/myself");
        self.send(&request)
            .map(drop)
            .map_err(|e| JiraError::Connect(e.to_string()))
    }

    /// Release the transport. Failures are logged, not returned.
    pub fn close(self) {
        if let Err(e) = self.api.close() {
            warn!(error = %e, "Failed to close Jira connection");
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
        E: From<JiraError>,
    {
        if let Err(e) = self.connect() {
            self.close();
            return Err(e.into());
        }
        let result = body(&self);
        self.close();
        result
    }

    fn send(&self, request: &Request) -> Result<Response, JiraError> {
        let response = self
            .api
            .execute(request)
            .map_err(|e| JiraError::Request {
                status: None,
                message: format!("Jira request failed: {e}"),
            })?;

        if !response.is_success() {
            return Err(JiraError::Request {
                status: Some(response.status),
                message: error_message(&response),
            });
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, request: &Request) -> Result<T, JiraError> {
        Ok(self.send(request)?.json()?)
    }

    /// Send `payload` as the JSON body of a PUT or POST.
    fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        payload: &B,
    ) -> Result<Response, JiraError> {
        let request = self.api.request(method, path).json(payload)?;
        self.send(&request)
    }
}

/// Build a client from settings and run `body` inside [`JiraClient::scoped`].
///
/// # Errors
///
/// Returns configuration and connection errors, or whatever `body` returns.
pub fn with_jira<T, E, F>(settings: &ServiceSettings, body: F) -> Result<T, E>
where
    F: FnOnce(&JiraClient) -> Result<T, E>,
    E: From<JiraError>,
{
    JiraClient::new(settings)?.scoped(body)
}

/// `errorMessages` joined, else `errors` as `field: message` pairs, else a
/// generic description.
fn error_message(response: &Response) -> String {
    let payload = serde_json::from_str::<Value>(&response.body).unwrap_or(Value::Null);

    let joined = match payload.get("errorMessages") {
        Some(Value::Array(messages)) if !messages.is_empty() => {
            Some(messages.iter().map(value_text).collect::<Vec<_>>().join("; "))
        }
        _ => match payload.get("errors") {
            Some(Value::Object(errors)) if !errors.is_empty() => Some(
                errors
                    .iter()
                    .map(|(field, message)| format!("{field}: {}", value_text(message)))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => payload
                .get("errorMessage")
                .and_then(Value::as_str)
                .map(str::to_owned),
        },
    };

    joined
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("Jira API call failed ({})", response.status))
}

fn value_text(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_owned)
}
