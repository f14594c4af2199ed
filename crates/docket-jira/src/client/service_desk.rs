//! Service Desk API: desk lookup, queue resolution and queue listing.

use std::collections::HashSet;

use docket_http::{MAX_PAGES, Method, Request, encode_path_segment};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::JiraClient;
use crate::error::JiraError;
use crate::types::{Issue, Page, Queue, QueueInfo, QueueIssue, ServiceDesk};

/// Entries requested per Service Desk page.
pub const SERVICE_DESK_PAGE_LIMIT: usize = 50;

const API_BASE: &str = "/rest/servicedeskapi/servicedesk";

impl JiraClient {
    /// Id of the service desk backing `project_key`.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::NotFound`] when no desk matches, or
    /// [`JiraError::Request`] on failure.
    pub fn find_service_desk_id(&self, project_key: &str) -> Result<String, JiraError> {
        info!(project_key, "Looking up service desk");
        let found = self.scan_pages(API_BASE, |desk: &ServiceDesk| {
            (desk.project_key == project_key && !desk.id.is_empty()).then(|| desk.id.clone())
        })?;
        found.ok_or_else(|| {
            JiraError::NotFound(format!(
                "Unable to locate service desk for project {project_key}."
            ))
        })
    }

    /// Resolve a queue by id, `custom/<id>`, `queue/<id>` or display name.
    ///
    /// Matching is case-insensitive and succeeds when any form of the
    /// identifier equals any form of a queue's id or name.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::NotFound`] when no queue matches, or
    /// [`JiraError::Request`] on failure.
    pub fn find_queue(&self, service_desk_id: &str, identifier: &str) -> Result<QueueInfo, JiraError> {
        info!(service_desk_id, identifier, "Resolving service desk queue");
        let wanted = identifier_tokens(identifier);
        let path = format!("{API_BASE}/{}/queue", encode_path_segment(service_desk_id));

        let found = self.scan_pages(&path, |queue: &Queue| {
            let info = queue_info(queue, service_desk_id);
            queue_tokens(&info)
                .iter()
                .any(|token| wanted.contains(token))
                .then_some(info)
        })?;
        found.ok_or_else(|| {
            JiraError::NotFound(format!(
                "Queue '{identifier}' not found in service desk {service_desk_id}."
            ))
        })
    }

    /// Up to `limit` issue keys listed in a queue.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Request`] on failure.
    pub fn queue_issue_keys(
        &self,
        service_desk_id: &str,
        queue_id: &str,
        limit: usize,
    ) -> Result<Vec<String>, JiraError> {
        let path = format!(
            "{API_BASE}/{}/queue/{}/issue",
            encode_path_segment(service_desk_id),
            encode_path_segment(queue_id)
        );
        let mut keys = Vec::new();
        let mut start = 0;

        for _ in 0..MAX_PAGES {
            if keys.len() >= limit {
                break;
            }
            let page_limit = SERVICE_DESK_PAGE_LIMIT.min(limit - keys.len());
            let page: Page<QueueIssue> = self.desk_page(&path, start, page_limit)?;
            let count = page.values.len();
            keys.extend(
                page.values
                    .into_iter()
                    .filter_map(|entry| entry.issue_key)
                    .filter(|key| !key.is_empty()),
            );
            debug!(queue_id, start, count, "Fetched queue issue page");

            if page.is_last_page || count == 0 {
                break;
            }
            start += count;
        }

        keys.truncate(limit);
        Ok(keys)
    }

    /// Issues in a service desk queue, at most `limit`.
    ///
    /// The desk comes from `service_desk_id` or is looked up from
    /// `project_key`. A queue backed by JQL is searched directly; when that
    /// yields nothing (or the queue has no JQL) its issue keys are listed
    /// and each issue is fetched, skipping any that fail.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::InvalidRequest`] for a blank identifier,
    /// [`JiraError::NotFound`] when the desk or queue cannot be resolved, or
    /// [`JiraError::Request`] on failure.
    pub fn queue_issues(
        &self,
        project_key: &str,
        identifier: &str,
        service_desk_id: Option<&str>,
        limit: usize,
    ) -> Result<(Vec<Issue>, QueueInfo), JiraError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(JiraError::InvalidRequest(
                "Queue ID is required to fetch queue issues.",
            ));
        }

        let desk_id = match service_desk_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => id.to_owned(),
            None => self.find_service_desk_id(project_key)?,
        };
        let queue = self.find_queue(&desk_id, identifier)?;

        let mut issues = match queue.jql.as_deref().filter(|jql| !jql.trim().is_empty()) {
            Some(jql) => self.search_issues(jql, limit)?,
            None => Vec::new(),
        };
        if issues.is_empty() {
            for key in self.queue_issue_keys(&desk_id, &queue.queue_id, limit)? {
                match self.get_issue(&key) {
                    Ok(issue) => issues.push(issue),
                    Err(e) => debug!(key, error = %e, "Skipping queue issue that failed to load"),
                }
            }
        }
        Ok((issues, queue))
    }

    /// Walk a paginated Service Desk listing until `pick` returns a value.
    fn scan_pages<T, R, F>(&self, path: &str, mut pick: F) -> Result<Option<R>, JiraError>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> Option<R>,
    {
        let mut start = 0;
        for _ in 0..MAX_PAGES {
            let page: Page<T> = self.desk_page(path, start, SERVICE_DESK_PAGE_LIMIT)?;
            if let Some(found) = page.values.iter().find_map(&mut pick) {
                return Ok(Some(found));
            }
            if page.is_last_page || page.values.is_empty() {
                break;
            }
            start += page.values.len();
        }
        Ok(None)
    }

    fn desk_page<T: DeserializeOwned>(
        &self,
        path: &str,
        start: usize,
        limit: usize,
    ) -> Result<Page<T>, JiraError> {
        self.get_json(&self.desk_request(path).query("start", start).query("limit", limit))
    }

    fn desk_request(&self, path: &str) -> Request {
        self.api
            .request(Method::Get, path)
            .header("X-ExperimentalApi", "opt-in")
    }
}

fn queue_info(queue: &Queue, service_desk_id: &str) -> QueueInfo {
    let queue_id = if queue.queue_id.is_empty() {
        queue.id.clone()
    } else {
        queue.queue_id.clone()
    };
    QueueInfo {
        id: queue.id.clone(),
        queue_id,
        name: queue.name.trim().to_owned(),
        jql: queue.jql.clone(),
        service_desk_id: service_desk_id.to_owned(),
    }
}

/// Lower-cased forms a caller may use for a queue.
fn identifier_tokens(identifier: &str) -> HashSet<String> {
    let raw = identifier.trim();
    let lowered = raw.to_lowercase();
    let mut tokens = HashSet::from([lowered.clone(), format!("custom/{lowered}")]);
    if let Some((_, last)) = lowered.rsplit_once('/') {
        tokens.insert(last.to_owned());
    }
    if let Some(rest) = lowered.strip_prefix("custom/") {
        tokens.insert(rest.to_owned());
    }
    tokens
}

/// Lower-cased forms under which a queue can be addressed.
fn queue_tokens(queue: &QueueInfo) -> [String; 5] {
    let queue_id = queue.queue_id.to_lowercase();
    [
        queue.id.to_lowercase(),
        queue.name.to_lowercase(),
        format!("custom/{queue_id}"),
        format!("queue/{queue_id}"),
        queue_id,
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docket_http::MockTransport;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::client::tests::client;

    const DESKS: &str = "/rest/servicedeskapi/servicedesk";
    const QUEUES: &str = "/rest/servicedeskapi/servicedesk/7/queue";
    const QUEUE_ISSUES: &str = "/rest/servicedeskapi/servicedesk/7/queue/31/issue";

    fn queues() -> &'static str {
        r#"{"values":[
            {"id":"30","name":"All open"},
            {"id":"31","name":"Triage","jql":null}
        ],"isLastPage":true}"#
    }

    #[test]
    fn test_find_service_desk_paginates() {
        let mock = Arc::new(
            MockTransport::new()
                .with_json(Method::Get, DESKS, r#"{"values":[{"id":1,"projectKey":"HR"}],"isLastPage":false}"#)
                .with_json(Method::Get, DESKS, r#"{"values":[{"id":7,"projectKey":"OPS"}],"isLastPage":true}"#),
        );

        assert_eq!(client(&mock).find_service_desk_id("OPS").unwrap(), "7");

        let requests = mock.requests_to(Method::Get, DESKS);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].query_value("start"), Some("1"));
        assert_eq!(requests[1].header_value("X-ExperimentalApi"), Some("opt-in"));
    }

    #[test]
    fn test_find_service_desk_not_found() {
        let mock = Arc::new(MockTransport::new().with_json(Method::Get, DESKS, r#"{"values":[],"isLastPage":false}"#));
        let err = client(&mock).find_service_desk_id("OPS").unwrap_err();
        assert_eq!(err.to_string(), "Unable to locate service desk for project OPS.");
    }

    #[test]
    fn test_find_queue_by_identifier_forms() {
        let mock = Arc::new(MockTransport::new().with_json(Method::Get, QUEUES, queues()));
        let client = client(&mock);

        for identifier in ["31", "custom/31", "queue/31", "TRIAGE", "project/ops/queue/31"] {
            let queue = client.find_queue("7", identifier).unwrap();
            assert_eq!(queue.queue_id, "31", "identifier {identifier}");
            assert_eq!(queue.service_desk_id, "7");
        }
    }

    #[test]
    fn test_find_queue_not_found() {
        let mock = Arc::new(MockTransport::new().with_json(Method::Get, QUEUES, queues()));
        let err = client(&mock).find_queue("7", "99").unwrap_err();
        assert_eq!(err.to_string(), "Queue '99' not found in service desk 7.");
    }

    #[test]
    fn test_queue_issue_keys_respects_limit() {
        let mock = Arc::new(MockTransport::new().with_json(
            Method::Get,
            QUEUE_ISSUES,
            r#"{"values":[{"issueKey":"OPS-1"},{"issueKey":"OPS-2"},{"issueKey":"OPS-3"}],"isLastPage":false}"#,
        ));

        let keys = client(&mock).queue_issue_keys("7", "31", 2).unwrap();

        assert_eq!(keys, vec!["OPS-1", "OPS-2"]);
        let request = &mock.requests_to(Method::Get, QUEUE_ISSUES)[0];
        assert_eq!(request.query_value("limit"), Some("2"));
    }

    #[test]
    fn test_queue_issues_skips_failed_fetches() {
        let mock = Arc::new(
            MockTransport::new()
                .with_json(Method::Get, QUEUES, queues())
                .with_json(
                    Method::Get,
                    QUEUE_ISSUES,
                    r#"{"values":[{"issueKey":"OPS-1"},{"issueKey":"OPS-2"}],"isLastPage":true}"#,
                )
                .with_json(Method::Get, "/rest/api/2/issue/OPS-1", r#"{"key":"OPS-1","fields":{}}"#),
        );

        let (issues, queue) = client(&mock).queue_issues("OPS", "Triage", Some("7"), 50).unwrap();

        assert_eq!(queue.name, "Triage");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "OPS-1");
        assert!(mock.requests_to(Method::Get, DESKS).is_empty());
    }

    #[test]
    fn test_queue_issues_uses_queue_jql() {
        let mock = Arc::new(
            MockTransport::new()
                .with_json(
                    Method::Get,
                    QUEUES,
                    r#"{"values":[{"id":"31","name":"Triage","jql":"project = OPS"}],"isLastPage":true}"#,
                )
                .with_json(Method::Get, "/rest/api/2/search", r#"{"issues":[{"key":"OPS-9"}]}"#),
        );

        let (issues, _) = client(&mock).queue_issues("OPS", "31", Some("7"), 10).unwrap();

        assert_eq!(issues[0].key, "OPS-9");
        assert!(mock.requests_to(Method::Get, QUEUE_ISSUES).is_empty());
    }

    #[test]
    fn test_queue_issues_requires_identifier() {
        let mock = Arc::new(MockTransport::new());
        let err = client(&mock).queue_issues("OPS", " ", None, 10).unwrap_err();
        assert_eq!(err.to_string(), "Queue ID is required to fetch queue issues.");
    }
}
