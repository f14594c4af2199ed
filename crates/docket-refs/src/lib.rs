//! Ticket references embedded in wiki macros and command-line input.
//!
//! A ticket key is a project code followed by a hyphen and a number
//! (`PROJ-42`). Matching is case-insensitive; keys are returned upper-cased.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static TICKET_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[A-Z][A-Z0-9]+-\d+").expect("invalid ticket key regex"));

/// Macro parameters that hold ticket keys.
const KEY_PARAMS: &[&str] = &["key", "issuekey", "issuekeys", "issues"];

/// Macro parameters that hold a query.
const QUERY_PARAMS: &[&str] = &["jql", "jqlquery"];

/// First ticket key found in `raw` (a bare key or a browse URL), upper-cased.
#[must_use]
pub fn extract_issue_key(raw: &str) -> Option<String> {
    TICKET_KEY
        .find(raw.trim())
        .map(|m| m.as_str().to_uppercase())
}

/// Normalize and deduplicate keys from free-form input lines, keeping first-seen order.
///
/// Lines without a recognizable key are dropped.
pub fn collect_issue_keys<'a, I>(refs: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    refs.into_iter()
        .filter_map(extract_issue_key)
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// Ticket keys and raw queries referenced by one macro.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueReferences {
    /// Upper-cased keys, deduplicated in encounter order.
    pub issue_keys: Vec<String>,
    /// Trimmed, non-empty query strings.
    pub queries: Vec<String>,
}

impl IssueReferences {
    /// True when neither keys nor queries were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issue_keys.is_empty() && self.queries.is_empty()
    }
}

/// Resolve references from a macro parameter map.
///
/// Parameter names are expected lower-cased (as produced by macro
/// extraction). Key parameters are split on `,`, `;` and newlines and each
/// token contributes its first key match; tokens without one are skipped.
#[must_use]
pub fn resolve_references(params: &BTreeMap<String, String>) -> IssueReferences {
    let mut seen = HashSet::new();
    let issue_keys = KEY_PARAMS
        .iter()
        .filter_map(|name| params.get(*name))
        .flat_map(|raw| raw.split([',', ';', '\n']))
        .filter_map(extract_issue_key)
        .filter(|key| seen.insert(key.clone()))
        .collect();

    let queries = QUERY_PARAMS
        .iter()
        .filter_map(|name| params.get(*name))
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(str::to_owned)
        .collect();

    IssueReferences {
        issue_keys,
        queries,
    }
}
