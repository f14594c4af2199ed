//! Error types for Confluence integration.

use docket_config::ConfigError;

/// Failure while building a tree from storage markup.
///
/// Never escapes the extraction API, which degrades to empty results.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageParseError {
    /// XML syntax error, including mismatched end tags.
    #[error("XML parse error")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error.
    #[error("XML attribute error")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// Encoding error during XML parsing.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// Input ended inside an element.
    #[error("unclosed element <{0}>")]
    Unclosed(String),

    /// Content after the fragment's closing wrapper.
    #[error("unexpected content after fragment")]
    TrailingContent,
}

/// Error from Confluence API operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfluenceError {
    /// Missing or invalid connection settings.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The connection check failed.
    #[error("Failed to connect to Confluence: {0}")]
    Connect(String),

    /// A call after the connection check failed.
    #[error("{message}")]
    Request {
        /// HTTP status, absent for network failures.
        status: Option<u16>,
        /// Upstream message or a generic description.
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("invalid JSON in Confluence response")]
    Json(#[from] serde_json::Error),
}

impl ConfluenceError {
    /// HTTP status of a failed request.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }
}
