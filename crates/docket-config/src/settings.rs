//! Resolved connection settings for one remote service.

use std::time::Duration;

use crate::ConfigError;

/// Timeout used when neither environment nor file sets one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Which remote service a set of settings belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Ticket tracker.
    Jira,
    /// Wiki content platform.
    Confluence,
}

impl Service {
    /// Environment variable prefix (`JIRA`, `CONFLUENCE`).
    #[must_use]
    pub fn env_prefix(self) -> &'static str {
        match self {
            Self::Jira => "JIRA",
            Self::Confluence => "CONFLUENCE",
        }
    }
}

/// Base URL, credentials and per-request timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Service the settings were resolved for.
    pub service: Service,
    /// Server base URL.
    pub base_url: String,
    /// Login name.
    pub username: String,
    /// Password or API token.
    pub password: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl ServiceSettings {
    /// Create settings with the default timeout.
    #[must_use]
    pub fn new(
        service: Service,
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            service,
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Replace the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Require base URL, username and password to be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the required variables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty()
            || self.username.trim().is_empty()
            || self.password.is_empty()
        {
            let prefix = self.service.env_prefix();
            return Err(ConfigError::Validation(format!(
                "{prefix}_BASE_URL, {prefix}_USERNAME, and {prefix}_PASSWORD are required."
            )));
        }
        Ok(())
    }
}
