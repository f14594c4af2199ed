//! Page operations for Confluence API.

use docket_http::{MAX_PAGES, Method, encode_path_segment};
use serde::Serialize;
use tracing::{debug, info};

use super::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::types::{ChildPages, Page};

/// Child pages requested per call unless the caller says otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// A page reference that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Page id as given.
    pub id: String,
    /// Error message.
    pub reason: String,
}

impl ConfluenceClient {
    /// Get one page, expanding the listed sub-resources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfluenceError::Request`] on failure.
    pub fn get_page(&self, page_id: &str, expand: &[&str]) -> Result<Page, ConfluenceError> {
        info!(page_id, "Getting Confluence page");
        let request = self
            .api
            .request(
                Method::Get,
                &format!("/rest/api/content/{}", encode_path_segment(page_id)),
            )
            .query_opt("expand", expand_param(expand));
        self.get_json(&request)
    }

    /// Get the children of `parent_id`, at most `limit` of them.
    ///
    /// Follows `start` offsets while the server returns results and a
    /// `_links.next` link. Each call asks for no more than the entries
    /// still needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfluenceError::Request`] if any batch fails.
    pub fn get_child_pages(
        &self,
        parent_id: &str,
        expand: &[&str],
        limit: Option<usize>,
        page_size: usize,
    ) -> Result<Vec<Page>, ConfluenceError> {
        info!(parent_id, ?limit, "Getting Confluence child pages");
        let path = format!("/rest/api/content/{}/child/page", encode_path_segment(parent_id));
        let page_size = page_size.max(1);
        let mut pages = Vec::new();
        let mut start = 0;

        for _ in 0..MAX_PAGES {
            let wanted = limit.map_or(page_size, |limit| limit.saturating_sub(pages.len()));
            if wanted == 0 {
                break;
            }

            let request = self
                .api
                .request(Method::Get, &path)
                .query("start", start)
                .query("limit", page_size.min(wanted))
                .query_opt("expand", expand_param(expand));
            let batch: ChildPages = self.get_json(&request)?;

            let count = batch.results.len();
            let has_next = batch.has_next();
            pages.extend(batch.results);
            debug!(parent_id, start, count, has_next, "Fetched child page batch");

            if count == 0 || !has_next {
                break;
            }
            start += count;
        }

        if let Some(limit) = limit {
            pages.truncate(limit);
        }
        Ok(pages)
    }

    /// The root page, or its children when `is_parent` is set.
    ///
    /// Errors are collected as [`Failure`]s against `root_id` instead of
    /// being returned.
    pub fn fetch_targets(
        &self,
        root_id: &str,
        is_parent: bool,
        expand: &[&str],
        max_children: Option<usize>,
    ) -> (Vec<Page>, Vec<Failure>) {
        let result = if is_parent {
            self.get_child_pages(root_id, expand, max_children, DEFAULT_PAGE_SIZE)
        } else {
            self.get_page(root_id, expand).map(|page| vec![page])
        };

        match result {
            Ok(pages) => (pages, Vec::new()),
            Err(e) => (
                Vec::new(),
                vec![Failure {
                    id: root_id.to_owned(),
                    reason: e.to_string(),
                }],
            ),
        }
    }
}

fn expand_param(expand: &[&str]) -> Option<String> {
    (!expand.is_empty()).then(|| expand.join(","))
}
