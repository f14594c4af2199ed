//! Issue reads, edits and workflow transitions.

use docket_http::{Method, encode_path_segment};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use super::JiraClient;
use crate::error::JiraError;
use crate::types::{Issue, SearchResults, TransitionList, same_name};

/// Result of [`JiraClient::transition_issue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Status before the call (empty when the issue reports none).
    pub before: String,
    /// Status after the call.
    pub after: String,
    /// True when a transition was issued.
    pub changed: bool,
    /// True when the required status did not match.
    pub skipped: bool,
}

impl TransitionOutcome {
    fn unchanged(before: String, skipped: bool) -> Self {
        Self {
            after: before.clone(),
            before,
            changed: false,
            skipped,
        }
    }
}

fn issue_path(key: &str) -> String {
    format!("/rest/api/2/issue/{}", encode_path_segment(key))
}

impl JiraClient {
    /// Get one issue with every field.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Request`] on failure.
    pub fn get_issue(&self, key: &str) -> Result<Issue, JiraError> {
        info!(key, "Getting Jira issue");
        let request = self
            .api
            .request(Method::Get, &issue_path(key))
            .query("fields", "*all");
        self.get_json(&request)
    }

    /// Run a JQL search returning at most `max_results` issues.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Request`] on failure.
    pub fn search_issues(&self, jql: &str, max_results: usize) -> Result<Vec<Issue>, JiraError> {
        info!(jql, max_results, "Searching Jira issues");
        let request = self
            .api
            .request(Method::Get, "/rest/api/2/search")
            .query("jql", jql)
            .query("maxResults", max_results)
            .query("fields", "*all");
        let results: SearchResults = self.get_json(&request)?;
        debug!(count = results.issues.len(), total = ?results.total, "Search returned");
        Ok(results.issues)
    }

    /// Keys of the issues matching `jql`, in result order.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Request`] on failure.
    pub fn search_issue_keys(&self, jql: &str, max_results: usize) -> Result<Vec<String>, JiraError> {
        Ok(self
            .search_issues(jql, max_results)?
            .into_iter()
            .map(|issue| issue.key)
            .filter(|key| !key.is_empty())
            .collect())
    }

    /// Edit an issue with a `{fields, update}` envelope.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::InvalidRequest`] when both parts are absent, or
    /// [`JiraError::Request`] on failure.
    pub fn update_issue(
        &self,
        key: &str,
        fields: Option<Map<String, Value>>,
        update: Option<Map<String, Value>>,
    ) -> Result<(), JiraError> {
        if fields.is_none() && update.is_none() {
            return Err(JiraError::InvalidRequest("No updates provided for issue edit."));
        }
        info!(key, "Updating Jira issue");

        let mut payload = Map::new();
        if let Some(fields) = fields {
            payload.insert("fields".to_owned(), Value::Object(fields));
        }
        if let Some(update) = update {
            payload.insert("update".to_owned(), Value::Object(update));
        }
        self.send_json(Method::Put, &issue_path(key), &payload)
            .map(drop)
    }

    /// Set fields addressed by display name or id.
    ///
    /// Names that do not resolve are sent as given. Blank names are
    /// dropped; an empty `values` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::NoValidFields`] when every name is blank, or the
    /// resolution and request errors.
    pub fn update_fields(&self, key: &str, values: &[(String, Value)]) -> Result<(), JiraError> {
        if values.is_empty() {
            return Ok(());
        }

        let mut fields = Map::new();
        for (name, value) in values {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let id = self.field_id(name)?.unwrap_or_else(|| name.to_owned());
            fields.insert(id, value.clone());
        }
        if fields.is_empty() {
            return Err(JiraError::NoValidFields);
        }
        self.update_issue(key, Some(fields), None)
    }

    /// Add and remove labels in one request. Blank labels are ignored; no
    /// request is made when nothing is left.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Request`] on failure.
    pub fn update_labels<S: AsRef<str>>(
        &self,
        key: &str,
        add: &[S],
        remove: &[S],
    ) -> Result<(), JiraError> {
        let operations: Vec<Value> = label_ops("add", add)
            .chain(label_ops("remove", remove))
            .collect();
        if operations.is_empty() {
            return Ok(());
        }

        let mut update = Map::new();
        update.insert("labels".to_owned(), Value::Array(operations));
        self.update_issue(key, None, Some(update))
    }

    /// Assign an issue to a user account.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::InvalidRequest`] for a blank account id, or
    /// [`JiraError::Request`] on failure.
    pub fn assign_issue(&self, key: &str, account_id: &str) -> Result<(), JiraError> {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(JiraError::InvalidRequest("Assignee account id is required."));
        }
        info!(key, account_id, "Assigning Jira issue");
        let path = format!("{}/assignee", issue_path(key));
        self.send_json(Method::Put, &path, &json!({ "accountId": account_id }))
            .map(drop)
    }

    /// Move an issue to `target`, optionally only from `required`.
    ///
    /// Nothing is sent when the current status differs from `required` or
    /// already equals `target` (both compared ignoring case). Otherwise the
    /// first transition whose name or destination matches `target` is
    /// issued and the issue is read again for the new status.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::NoSuchTransition`] when no transition leads to
    /// `target`, or [`JiraError::Request`] on failure.
    pub fn transition_issue(
        &self,
        key: &str,
        required: Option<&str>,
        target: &str,
    ) -> Result<TransitionOutcome, JiraError> {
        let before = self.get_issue(key)?.status().unwrap_or_default().to_owned();

        if let Some(required) = required.map(str::trim).filter(|s| !s.is_empty())
            && !same_name(&before, required)
        {
            debug!(key, status = %before, required, "Skipping transition");
            return Ok(TransitionOutcome::unchanged(before, true));
        }
        if same_name(&before, target) {
            return Ok(TransitionOutcome::unchanged(before, false));
        }

        let path = format!("{}/transitions", issue_path(key));
        let transitions: TransitionList = self.get_json(&self.api.request(Method::Get, &path))?;
        let transition = transitions
            .find(target)
            .ok_or_else(|| JiraError::NoSuchTransition {
                key: key.to_owned(),
                target: target.to_owned(),
            })?;

        info!(key, from = %before, to = target, transition = %transition.name, "Transitioning Jira issue");
        self.send_json(
            Method::Post,
            &path,
            &json!({ "transition": { "id": transition.id } }),
        )?;

        let after = self
            .get_issue(key)?
            .status()
            .map_or_else(|| target.to_owned(), str::to_owned);
        Ok(TransitionOutcome {
            before,
            after,
            changed: true,
            skipped: false,
        })
    }
}

fn label_ops<'a, S: AsRef<str>>(
    op: &'static str,
    labels: &'a [S],
) -> impl Iterator<Item = Value> + 'a {
    labels
        .iter()
        .map(|label| label.as_ref().trim())
        .filter(|label| !label.is_empty())
        .map(move |label| {
            let mut operation = Map::new();
            operation.insert(op.to_owned(), Value::from(label));
            Value::Object(operation)
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docket_http::{MockTransport, Response};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::client::tests::client;

    const ISSUE: &str = "/rest/api/2/issue/OPS-1";
    const TRANSITIONS: &str = "/rest/api/2/issue/OPS-1/transitions";

    fn issue_with_status(status: &str) -> String {
        format!(r#"{{"key":"OPS-1","fields":{{"status":{{"name":"{status}"}}}}}}"#)
    }

    #[test]
    fn test_get_issue_requests_all_fields() {
        let mock = Arc::new(MockTransport::new().with_json(Method::Get, ISSUE, &issue_with_status("Open")));
        let issue = client(&mock).get_issue("OPS-1").unwrap();

        assert_eq!(issue.status(), Some("Open"));
        let requests = mock.requests_to(Method::Get, ISSUE);
        assert_eq!(requests[0].query_value("fields"), Some("*all"));
    }

    #[test]
    fn test_search_issue_keys() {
        let mock = Arc::new(MockTransport::new().with_json(
            Method::Get,
            "/rest/api/2/search",
            r#"{"issues":[{"key":"OPS-1"},{"key":"OPS-2"}],"total":2}"#,
        ));
        let keys = client(&mock).search_issue_keys("project = OPS", 200).unwrap();

        assert_eq!(keys, vec!["OPS-1", "OPS-2"]);
        let request = &mock.requests_to(Method::Get, "/rest/api/2/search")[0];
        assert_eq!(request.query_value("jql"), Some("project = OPS"));
        assert_eq!(request.query_value("maxResults"), Some("200"));
    }

    #[test]
    fn test_required_status_mismatch_skips_without_transition_call() {
        let mock = Arc::new(MockTransport::new().with_json(Method::Get, ISSUE, &issue_with_status("In Progress")));

        let outcome = client(&mock)
            .transition_issue("OPS-1", Some("Open"), "Done")
            .unwrap();

        assert_eq!(
            outcome,
            TransitionOutcome {
                before: "In Progress".to_owned(),
                after: "In Progress".to_owned(),
                changed: false,
                skipped: true,
            }
        );
        assert!(mock.requests_to(Method::Get, TRANSITIONS).is_empty());
        assert!(mock.requests_to(Method::Post, TRANSITIONS).is_empty());
    }

    #[test]
    fn test_already_at_target_is_unchanged() {
        let mock = Arc::new(MockTransport::new().with_json(Method::Get, ISSUE, &issue_with_status("Done")));

        let outcome = client(&mock).transition_issue("OPS-1", None, "done").unwrap();

        assert!(!outcome.changed);
        assert!(!outcome.skipped);
        assert!(mock.requests_to(Method::Get, TRANSITIONS).is_empty());
    }

    #[test]
    fn test_status_comparison_is_unicode_case_insensitive() {
        let mock = Arc::new(MockTransport::new().with_json(Method::Get, ISSUE, &issue_with_status("étude")));

        let at_target = client(&mock).transition_issue("OPS-1", None, "ÉTUDE").unwrap();
        let required_met = client(&mock)
            .transition_issue("OPS-1", Some("ÉTUDE"), "Étude")
            .unwrap();

        assert_eq!(at_target, TransitionOutcome::unchanged("étude".to_owned(), false));
        assert_eq!(required_met, TransitionOutcome::unchanged("étude".to_owned(), false));
        assert!(mock.requests_to(Method::Get, TRANSITIONS).is_empty());
    }

    #[test]
    fn test_transition_posts_matching_id_and_refetches() {
        let mock = Arc::new(
            MockTransport::new()
                .with_json(Method::Get, ISSUE, &issue_with_status("Open"))
                .with_json(Method::Get, ISSUE, &issue_with_status("In Progress"))
                .with_json(
                    Method::Get,
                    TRANSITIONS,
                    r#"{"transitions":[{"id":"11","name":"Start Progress","to":{"name":"In Progress"}}]}"#,
                )
                .with_response(Method::Post, TRANSITIONS, Response::new(204, "")),
        );

        let outcome = client(&mock)
            .transition_issue("OPS-1", Some("open"), "In Progress")
            .unwrap();

        assert_eq!(outcome.before, "Open");
        assert_eq!(outcome.after, "In Progress");
        assert!(outcome.changed);
        let post = &mock.requests_to(Method::Post, TRANSITIONS)[0];
        assert_eq!(post.body_json(), Some(json!({"transition": {"id": "11"}})));
    }

    #[test]
    fn test_no_such_transition() {
        let mock = Arc::new(
            MockTransport::new()
                .with_json(Method::Get, ISSUE, &issue_with_status("Open"))
                .with_json(Method::Get, TRANSITIONS, r#"{"transitions":[]}"#),
        );

        let err = client(&mock).transition_issue("OPS-1", None, "Closed").unwrap_err();

        assert_eq!(err.to_string(), "No transition to 'Closed' found for issue OPS-1.");
        assert!(mock.requests_to(Method::Post, TRANSITIONS).is_empty());
    }

    #[test]
    fn test_update_fields_resolves_names() {
        let mock = Arc::new(
            MockTransport::new()
                .with_json(
                    Method::Get,
                    "/rest/api/2/field",
                    r#"[{"id":"customfield_100","name":"Report Related Team"}]"#,
                )
                .with_response(Method::Put, ISSUE, Response::new(204, "")),
        );

        client(&mock)
            .update_fields(
                "OPS-1",
                &[
                    ("Report Related Team".to_owned(), json!({"value": "Payments"})),
                    ("Unknown Field".to_owned(), json!("x")),
                    (" ".to_owned(), json!("ignored")),
                ],
            )
            .unwrap();

        let put = &mock.requests_to(Method::Put, ISSUE)[0];
        assert_eq!(
            put.body_json(),
            Some(json!({"fields": {
                "customfield_100": {"value": "Payments"},
                "Unknown Field": "x"
            }}))
        );
    }

    #[test]
    fn test_update_fields_all_blank() {
        let mock = Arc::new(MockTransport::new());
        let err = client(&mock)
            .update_fields("OPS-1", &[("  ".to_owned(), json!("x"))])
            .unwrap_err();

        assert!(matches!(err, JiraError::NoValidFields));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_update_labels_single_request() {
        let mock = Arc::new(MockTransport::new().with_response(Method::Put, ISSUE, Response::new(204, "")));

        client(&mock)
            .update_labels("OPS-1", &["infra", " "], &["stale"])
            .unwrap();

        let puts = mock.requests_to(Method::Put, ISSUE);
        assert_eq!(puts.len(), 1);
        assert_eq!(
            puts[0].body_json(),
            Some(json!({"update": {"labels": [{"add": "infra"}, {"remove": "stale"}]}}))
        );
    }

    #[test]
    fn test_update_labels_empty_is_noop() {
        let mock = Arc::new(MockTransport::new());
        client(&mock).update_labels::<&str>("OPS-1", &[], &[" "]).unwrap();
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_update_issue_requires_content() {
        let mock = Arc::new(MockTransport::new());
        let err = client(&mock).update_issue("OPS-1", None, None).unwrap_err();
        assert_eq!(err.to_string(), "No updates provided for issue edit.");
    }

    #[test]
    fn test_assign_issue() {
        let path = "/rest/api/2/issue/OPS-1/assignee";
        let mock = Arc::new(MockTransport::new().with_response(Method::Put, path, Response::new(204, "")));
        let client = client(&mock);

        client.assign_issue("OPS-1", "abc-123").unwrap();
        assert_eq!(
            mock.requests_to(Method::Put, path)[0].body_json(),
            Some(json!({"accountId": "abc-123"}))
        );
        assert_eq!(
            client.assign_issue("OPS-1", " ").unwrap_err().to_string(),
            "Assignee account id is required."
        );
    }
}
