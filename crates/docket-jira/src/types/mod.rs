//! Jira and Service Desk API response types.

mod issue;
mod service_desk;

pub use issue::{
    FieldDef, FieldResolver, Issue, SearchResults, Transition, TransitionList, display_value,
    same_name,
};
pub use service_desk::{Page, Queue, QueueIssue, QueueInfo, ServiceDesk};

use serde::{Deserialize, Deserializer};

/// Identifiers arrive as strings from some endpoints and numbers from others.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
