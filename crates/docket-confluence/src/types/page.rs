//! Confluence page types.
//!
//! Every field except `id` is optional: which parts are present depends on
//! the `expand` list the page was fetched with.

use serde::{Deserialize, Serialize};

/// Confluence page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Page {
    /// Page ID.
    pub id: String,
    /// Content type ("page").
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Version information (`expand=version`).
    #[serde(default)]
    pub version: Option<Version>,
    /// Page body content (`expand=body.storage`).
    #[serde(default)]
    pub body: Option<Body>,
    /// Parent chain from the space root (`expand=ancestors`).
    #[serde(default)]
    pub ancestors: Vec<Ancestor>,
    /// Hypermedia links.
    #[serde(rename = "_links", default)]
    pub links: Option<Links>,
}

impl Page {
    /// Storage-format body, when expanded.
    #[must_use]
    pub fn storage(&self) -> Option<&str> {
        self.body
            .as_ref()?
            .storage
            .as_ref()
            .map(|storage| storage.value.as_str())
    }

    /// Version number, when expanded.
    #[must_use]
    pub fn version_number(&self) -> Option<u32> {
        self.version.as_ref().map(|v| v.number)
    }

    /// Last-modified timestamp, when expanded.
    #[must_use]
    pub fn updated_at(&self) -> Option<&str> {
        self.version.as_ref()?.when.as_deref()
    }

    /// Web UI path relative to the base URL.
    #[must_use]
    pub fn webui(&self) -> Option<&str> {
        self.links.as_ref()?.webui.as_deref()
    }
}

/// Page version.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Version {
    /// Version number.
    #[serde(default)]
    pub number: u32,
    /// Timestamp of this version.
    #[serde(default)]
    pub when: Option<String>,
    /// Version message/comment.
    #[serde(default)]
    pub message: Option<String>,
}

/// Page body content.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Body {
    /// Storage format content.
    #[serde(default)]
    pub storage: Option<Storage>,
}

/// Storage format representation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Storage {
    /// XHTML in Confluence storage format.
    #[serde(default)]
    pub value: String,
    /// Content representation ("storage").
    #[serde(default)]
    pub representation: Option<String>,
}

/// One entry of the ancestor chain.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Ancestor {
    /// Page ID.
    pub id: String,
    /// Page title.
    #[serde(default)]
    pub title: String,
}

/// Hypermedia links.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Links {
    /// Web UI link.
    #[serde(default)]
    pub webui: Option<String>,
    /// API self link.
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,
    /// Next page of a paginated listing.
    #[serde(default)]
    pub next: Option<String>,
}

/// One page of `GET /content/{id}/child/page`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChildPages {
    /// Child pages in this batch.
    #[serde(default)]
    pub results: Vec<Page>,
    /// Pagination links.
    #[serde(rename = "_links", default)]
    pub links: Option<Links>,
}

impl ChildPages {
    /// True when the server advertises another batch.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.links
            .as_ref()
            .and_then(|links| links.next.as_deref())
            .is_some_and(|next| !next.is_empty())
    }
}
