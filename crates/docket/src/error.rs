//! CLI error types.

use docket_config::ConfigError;
use docket_confluence::ConfluenceError;
use docket_jira::JiraError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Confluence(#[from] ConfluenceError),

    #[error(transparent)]
    Jira(#[from] JiraError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    /// The command ran but produced nothing or had per-item failures; the
    /// details were already printed.
    #[error("{0}")]
    Incomplete(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_only_connect_failures_mention_connecting() {
        let connect = CliError::from(JiraError::Connect("Jira API call failed (401)".to_owned()));
        let request = CliError::from(JiraError::Request {
            status: Some(500),
            message: "Internal error".to_owned(),
        });
        let page = CliError::from(ConfluenceError::Request {
            status: Some(404),
            message: "No content found".to_owned(),
        });

        assert_eq!(connect.to_string(), "Failed to connect to Jira: Jira API call failed (401)");
        assert_eq!(request.to_string(), "Internal error");
        assert_eq!(page.to_string(), "No content found");
    }
}
