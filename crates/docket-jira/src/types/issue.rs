//! Issue, field and transition types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id_string;
use crate::error::JiraError;

/// Maps a field display name to its internal id.
pub trait FieldResolver {
    /// Field id for `name`, or `None` when the name is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the field list cannot be fetched.
    fn resolve_field_id(&self, name: &str) -> Result<Option<String>, JiraError>;
}

/// Jira issue with its raw field mapping keyed by field id.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Issue {
    /// Issue key (`OPS-1`).
    #[serde(default)]
    pub key: String,
    /// Field values keyed by field id.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Issue {
    /// Status name.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.named_field("status")
    }

    /// Issue type name.
    #[must_use]
    pub fn issue_type(&self) -> Option<&str> {
        self.named_field("issuetype")
    }

    /// Summary line.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.fields.get("summary")?.as_str()
    }

    /// Labels, empty when unset.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.fields
            .get("labels")
            .and_then(Value::as_array)
            .map(|labels| labels.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Field value by literal key or display name.
    ///
    /// The issue's own mapping is checked first; otherwise `name` is
    /// resolved to a field id through `resolver`.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::FieldNotFound`] when neither the name nor its
    /// resolved id is present, or the resolver's error.
    pub fn get<R>(&self, name: &str, resolver: &R) -> Result<&Value, JiraError>
    where
        R: FieldResolver + ?Sized,
    {
        if let Some(value) = self.fields.get(name) {
            return Ok(value);
        }
        resolver
            .resolve_field_id(name)?
            .and_then(|id| self.fields.get(&id))
            .ok_or_else(|| JiraError::FieldNotFound {
                field: name.to_owned(),
                key: self.key.clone(),
            })
    }

    /// `fields.<field>.name`, used by status and issue type.
    fn named_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field)?.get("name")?.as_str()
    }
}

/// Display text for a field value: `value` or `name` of an object,
/// the string itself, or the JSON rendering of anything else.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_owned(),
        Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("name"))
            .map_or_else(|| value.to_string(), display_value),
        other => other.to_string(),
    }
}

/// `GET /rest/api/2/search` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// Matching issues.
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Total matches upstream.
    #[serde(default)]
    pub total: Option<u64>,
}

/// One entry of `GET /rest/api/2/field`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FieldDef {
    /// Field id (`customfield_10010`, `summary`).
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// True for custom fields.
    #[serde(default)]
    pub custom: bool,
}

/// Status and transition names compare trimmed and lower-cased.
#[must_use]
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// `GET /rest/api/2/issue/{key}/transitions` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransitionList {
    /// Transitions available from the current status.
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl TransitionList {
    /// First transition whose name or destination status matches `target`,
    /// ignoring case.
    #[must_use]
    pub fn find(&self, target: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| {
            same_name(&t.name, target) || t.destination().is_some_and(|to| same_name(to, target))
        })
    }
}

/// An available workflow transition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Transition {
    /// Transition id.
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,
    /// Transition name ("Start Progress").
    #[serde(default)]
    pub name: String,
    /// Destination status.
    #[serde(default)]
    pub to: Option<Value>,
}

impl Transition {
    /// Destination status name.
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        self.to.as_ref()?.get("name")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    struct StaticResolver(HashMap<&'static str, &'static str>);

    impl FieldResolver for StaticResolver {
        fn resolve_field_id(&self, name: &str) -> Result<Option<String>, JiraError> {
            Ok(self.0.get(name.to_lowercase().as_str()).map(|id| (*id).to_owned()))
        }
    }

    fn issue() -> Issue {
        serde_json::from_value(json!({
            "key": "OPS-1",
            "fields": {
                "summary": "Disk full",
                "status": {"name": "In Progress"},
                "issuetype": {"name": "Task"},
                "labels": ["infra", "p1"],
                "customfield_100": {"value": "Payments"},
                "Reporter Note": "kept by display name"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_accessors() {
        let issue = issue();
        assert_eq!(issue.status(), Some("In Progress"));
        assert_eq!(issue.issue_type(), Some("Task"));
        assert_eq!(issue.summary(), Some("Disk full"));
        assert_eq!(issue.labels(), vec!["infra", "p1"]);
    }

    #[test]
    fn test_accessors_tolerate_missing_fields() {
        let issue: Issue = serde_json::from_value(json!({"key": "OPS-2"})).unwrap();
        assert_eq!(issue.status(), None);
        assert_eq!(issue.issue_type(), None);
        assert!(issue.labels().is_empty());
    }

    #[test]
    fn test_get_by_resolved_display_name() {
        let resolver = StaticResolver(HashMap::from([("team", "customfield_100")]));
        let value = issue().get("Team", &resolver).unwrap().clone();
        assert_eq!(value, json!({"value": "Payments"}));
    }

    #[test]
    fn test_get_prefers_literal_key() {
        let resolver = StaticResolver(HashMap::new());
        let issue = issue();
        assert_eq!(issue.get("Reporter Note", &resolver).unwrap(), "kept by display name");
    }

    #[test]
    fn test_get_field_not_found() {
        let resolver = StaticResolver(HashMap::from([("sprint", "customfield_999")]));
        let issue = issue();

        let err = issue.get("Sprint", &resolver).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Field 'Sprint' not found on issue OPS-1.");
        assert!(issue.get("Unknown", &resolver).is_err());
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!({"value": " Payments "})), "Payments");
        assert_eq!(display_value(&json!({"name": "Alice"})), "Alice");
        assert_eq!(display_value(&json!(null)), "");
        assert_eq!(display_value(&json!(3)), "3");
        assert_eq!(display_value(&json!(" x ")), "x");
    }

    #[test]
    fn test_transition_matches_name_or_destination() {
        let list: TransitionList = serde_json::from_value(json!({
            "transitions": [
                {"id": 11, "name": "Start Progress", "to": {"name": "In Progress"}},
                {"id": "21", "name": "Resolve", "to": {"name": "Done"}}
            ]
        }))
        .unwrap();

        assert_eq!(list.find("in progress").map(|t| t.id.as_str()), Some("11"));
        assert_eq!(list.find("RESOLVE").map(|t| t.id.as_str()), Some("21"));
        assert_eq!(list.find("done").map(|t| t.id.as_str()), Some("21"));
        assert!(list.find("Closed").is_none());
    }
}
