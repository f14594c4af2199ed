//! Open-issue listing and per-issue field reports.

use serde_json::Value;
use tracing::info;

use super::JiraClient;
use crate::error::JiraError;
use crate::types::{Issue, QueueInfo};

/// Browse URL of an issue.
#[must_use]
pub fn issue_url(base_url: &str, key: &str) -> String {
    format!("{}/browse/{key}", base_url.trim_end_matches('/'))
}

/// Parameters of [`JiraClient::list_open_issues`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Project key.
    pub project: String,
    /// Result cap.
    pub max_results: usize,
    /// Service desk queue to list instead of the project query.
    pub queue_id: Option<String>,
    /// Service desk id; looked up from the project when absent.
    pub service_desk_id: Option<String>,
    /// Run the project query even when a queue is given.
    pub use_jql: bool,
    /// Keep only these statuses (case-insensitive); empty keeps all.
    pub statuses: Vec<String>,
}

impl ListOptions {
    fn project_jql(&self) -> String {
        format!(
            r#"project = "{}" AND statusCategory != Done ORDER BY created DESC"#,
            self.project
        )
    }
}

/// An issue that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Issue key.
    pub key: String,
    /// Error message.
    pub reason: String,
}

/// Requested field values of one issue.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueFields {
    /// Issue key.
    pub key: String,
    /// Browse URL.
    pub url: String,
    /// Status name.
    pub status: Option<String>,
    /// Values in request order; `None` when the issue lacks the field.
    pub fields: Vec<(String, Option<Value>)>,
}

impl JiraClient {
    /// Open issues of a project, or of a service desk queue.
    ///
    /// The queue path is taken when `queue_id` is set and `use_jql` is not;
    /// its resolved [`QueueInfo`] is returned alongside the issues.
    ///
    /// # Errors
    ///
    /// Returns the search, desk or queue lookup error.
    pub fn list_open_issues(
        &self,
        options: &ListOptions,
    ) -> Result<(Vec<Issue>, Option<QueueInfo>), JiraError> {
        let queue_id = options
            .queue_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        let (issues, queue) = match queue_id {
            Some(queue_id) if !options.use_jql => {
                let (issues, queue) = self.queue_issues(
                    &options.project,
                    queue_id,
                    options.service_desk_id.as_deref(),
                    options.max_results,
                )?;
                (issues, Some(queue))
            }
            _ => (
                self.search_issues(&options.project_jql(), options.max_results)?,
                None,
            ),
        };

        let issues = filter_by_status(issues, &options.statuses);
        info!(project = %options.project, count = issues.len(), "Listed open issues");
        Ok((issues, queue))
    }

    /// Read `names` from each issue.
    ///
    /// Fields missing from an issue are reported as `None`; any other error
    /// moves the issue to the failure list.
    pub fn fetch_issue_fields<K, N>(&self, keys: &[K], names: &[N]) -> (Vec<IssueFields>, Vec<Failure>)
    where
        K: AsRef<str>,
        N: AsRef<str>,
    {
        let names: Vec<&str> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !name.is_empty())
            .collect();
        let mut results = Vec::new();
        let mut failures = Vec::new();

        for key in keys.iter().map(AsRef::as_ref) {
            match self.issue_fields(key, &names) {
                Ok(entry) => results.push(entry),
                Err(e) => failures.push(Failure {
                    key: key.to_owned(),
                    reason: e.to_string(),
                }),
            }
        }
        (results, failures)
    }

    fn issue_fields(&self, key: &str, names: &[&str]) -> Result<IssueFields, JiraError> {
        let issue = self.get_issue(key)?;
        let mut fields = Vec::with_capacity(names.len());
        for name in names {
            let value = match issue.get(name, self) {
                Ok(value) => Some(value.clone()),
                Err(e) if e.is_recoverable() => None,
                Err(e) => return Err(e),
            };
            fields.push(((*name).to_owned(), value));
        }
        Ok(IssueFields {
            url: issue_url(self.base_url(), &issue.key),
            status: issue.status().map(str::to_owned),
            key: issue.key,
            fields,
        })
    }
}

fn filter_by_status(issues: Vec<Issue>, statuses: &[String]) -> Vec<Issue> {
    if statuses.is_empty() {
        return issues;
    }
    let wanted: Vec<String> = statuses.iter().map(|s| s.trim().to_lowercase()).collect();
    issues
        .into_iter()
        .filter(|issue| {
            issue
                .status()
                .is_some_and(|status| wanted.contains(&status.to_lowercase()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docket_http::{Method, MockTransport};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::client::tests::client;

    const SEARCH: &str = "/rest/api/2/search";

    #[test]
    fn test_issue_url() {
        assert_eq!(
            issue_url("https://jira.example.com/", "OPS-1"),
            "https://jira.example.com/browse/OPS-1"
        );
    }

    #[test]
    fn test_list_open_issues_by_project_query() {
        let mock = Arc::new(MockTransport::new().with_json(
            Method::Get,
            SEARCH,
            r#"{"issues":[
                {"key":"OPS-1","fields":{"status":{"name":"Open"}}},
                {"key":"OPS-2","fields":{"status":{"name":"Waiting"}}},
                {"key":"OPS-3","fields":{}}
            ]}"#,
        ));
        let options = ListOptions {
            project: "OPS".to_owned(),
            max_results: 25,
            queue_id: Some("31".to_owned()),
            use_jql: true,
            statuses: vec!["OPEN".to_owned()],
            ..ListOptions::default()
        };

        let (issues, queue) = client(&mock).list_open_issues(&options).unwrap();

        assert_eq!(issues.iter().map(|i| i.key.as_str()).collect::<Vec<_>>(), vec!["OPS-1"]);
        assert!(queue.is_none());
        let request = &mock.requests_to(Method::Get, SEARCH)[0];
        assert_eq!(
            request.query_value("jql"),
            Some(r#"project = "OPS" AND statusCategory != Done ORDER BY created DESC"#)
        );
        assert_eq!(request.query_value("maxResults"), Some("25"));
    }

    #[test]
    fn test_list_open_issues_by_queue() {
        let mock = Arc::new(
            MockTransport::new()
                .with_json(
                    Method::Get,
                    "/rest/servicedeskapi/servicedesk/7/queue",
                    r#"{"values":[{"id":"31","name":"Triage","jql":"project = OPS"}],"isLastPage":true}"#,
                )
                .with_json(Method::Get, SEARCH, r#"{"issues":[{"key":"OPS-4"}]}"#),
        );
        let options = ListOptions {
            project: "OPS".to_owned(),
            max_results: 10,
            queue_id: Some("custom/31".to_owned()),
            service_desk_id: Some("7".to_owned()),
            ..ListOptions::default()
        };

        let (issues, queue) = client(&mock).list_open_issues(&options).unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(queue.map(|q| q.name), Some("Triage".to_owned()));
    }

    #[test]
    fn test_fetch_issue_fields_tolerates_missing_fields() {
        let mock = Arc::new(
            MockTransport::new()
                .with_json(
                    Method::Get,
                    "/rest/api/2/issue/OPS-1",
                    r#"{"key":"OPS-1","fields":{"status":{"name":"Open"},"customfield_100":{"value":"Payments"}}}"#,
                )
                .with_json(
                    Method::Get,
                    "/rest/api/2/field",
                    r#"[{"id":"customfield_100","name":"Team"},{"id":"customfield_200","name":"Sprint"}]"#,
                ),
        );

        let (results, failures) = client(&mock).fetch_issue_fields(&["OPS-1", "OPS-2"], &["Team", "Sprint", ""]);

        assert_eq!(
            results,
            vec![IssueFields {
                key: "OPS-1".to_owned(),
                url: "https://jira.example.com/browse/OPS-1".to_owned(),
                status: Some("Open".to_owned()),
                fields: vec![
                    ("Team".to_owned(), Some(json!({"value": "Payments"}))),
                    ("Sprint".to_owned(), None),
                ],
            }]
        );
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].key, "OPS-2");
    }
}
