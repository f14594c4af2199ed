//! Error types for Jira integration.

use docket_config::ConfigError;

/// Error from Jira and Service Desk API operations.
#[derive(Debug, thiserror::Error)]
pub enum JiraError {
    /// Missing or invalid connection settings.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The connection check failed.
    #[error("Failed to connect to Jira: {0}")]
    Connect(String),

    /// A call after the connection check failed.
    #[error("{message}")]
    Request {
        /// HTTP status, absent for network failures.
        status: Option<u16>,
        /// Upstream message or a generic description.
        message: String,
    },

    /// A display name resolved to nothing present on the issue.
    #[error("Field '{field}' not found on issue {key}.")]
    FieldNotFound {
        /// Requested field name.
        field: String,
        /// Issue key.
        key: String,
    },

    /// Every field name in an update was blank.
    #[error("No valid fields to update.")]
    NoValidFields,

    /// No available transition leads to the target status.
    #[error("No transition to '{target}' found for issue {key}.")]
    NoSuchTransition {
        /// Issue key.
        key: String,
        /// Requested status.
        target: String,
    },

    /// A service desk or queue lookup found nothing.
    #[error("{0}")]
    NotFound(String),

    /// The caller supplied nothing to send.
    #[error("{0}")]
    InvalidRequest(&'static str),

    /// Response body did not match the expected shape.
    #[error("invalid JSON in Jira response")]
    Json(#[from] serde_json::Error),
}

impl JiraError {
    /// Errors a batch may skip over without treating the item as failed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::FieldNotFound { .. })
    }

    /// HTTP status of a failed request.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }
}
