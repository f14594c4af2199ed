//! Service Desk API types.

use serde::{Deserialize, Serialize};

use super::id_string;

/// One page of a Service Desk listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Entries on this page.
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    /// Upstream end-of-listing signal.
    #[serde(default)]
    pub is_last_page: bool,
}

/// Entry of `GET /rest/servicedeskapi/servicedesk`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDesk {
    /// Service desk id.
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,
    /// Key of the backing project.
    #[serde(default)]
    pub project_key: String,
}

/// Entry of `GET /rest/servicedeskapi/servicedesk/{id}/queue`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    /// Queue id.
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,
    /// Alternate id some servers report alongside `id`.
    #[serde(default, deserialize_with = "id_string")]
    pub queue_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Saved query backing the queue.
    #[serde(default)]
    pub jql: Option<String>,
}

/// Entry of `GET /rest/servicedeskapi/servicedesk/{id}/queue/{queueId}/issue`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueIssue {
    /// Issue key.
    #[serde(default, alias = "key")]
    pub issue_key: Option<String>,
}

/// A resolved queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueInfo {
    /// Queue id as listed.
    pub id: String,
    /// Id used for the issue listing (`queueId`, else `id`).
    pub queue_id: String,
    /// Display name.
    pub name: String,
    /// Saved query, when the queue has one.
    pub jql: Option<String>,
    /// Service desk the queue belongs to.
    pub service_desk_id: String,
}
