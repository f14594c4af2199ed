//! `docket confluence label` command implementation.

use std::collections::BTreeSet;

use clap::Args;
use docket_config::{Config, merge_lists, process_env, resolve_string};
use docket_confluence::PageObjects;
use docket_jira::{JiraClient, with_jira};

use super::PageArgs;
use crate::error::CliError;
use crate::output::Output;

const DEFAULT_MACRO: &str = "jira";

/// Upper bound on keys taken from each macro query.
const QUERY_MAX_RESULTS: usize = 200;

/// Arguments for the confluence label command.
#[derive(Args)]
pub(crate) struct LabelArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Macro scanned for ticket keys and JQL (env: `CONFLUENCE_LABEL_MACRO`; default: jira).
    #[arg(long = "macro")]
    macro_name: Option<String>,

    /// Label to add (repeatable; env: `CONFLUENCE_LABEL_ADD`).
    #[arg(long = "add-label", value_name = "LABEL")]
    add_labels: Vec<String>,

    /// Label to remove (repeatable; env: `CONFLUENCE_LABEL_REMOVE`).
    #[arg(long = "remove-label", value_name = "LABEL")]
    remove_labels: Vec<String>,

    /// Only label tickets of this issue type (env: `CONFLUENCE_LABEL_ISSUE_TYPE`).
    #[arg(long)]
    issue_type: Option<String>,

    /// Override Confluence connection timeout in seconds.
    #[arg(long)]
    confluence_timeout: Option<u64>,

    /// Override Jira connection timeout in seconds.
    #[arg(long)]
    jira_timeout: Option<u64>,
}

/// Outcome of labelling one batch of tickets.
#[derive(Debug, Default)]
struct LabelReport {
    updated: Vec<String>,
    skipped: Vec<String>,
    failed: Vec<(String, String)>,
}

impl LabelArgs {
    /// Execute the label command.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        let labeler = &config.labeler;
        let macro_name = self
            .macro_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| resolve_string(&process_env, "CONFLUENCE_LABEL_MACRO", labeler.macro_name.as_deref()))
            .unwrap_or_else(|| DEFAULT_MACRO.to_owned());
        let add = merge_lists(&process_env, "CONFLUENCE_LABEL_ADD", &labeler.add_labels, &self.add_labels);
        let remove = merge_lists(
            &process_env,
            "CONFLUENCE_LABEL_REMOVE",
            &labeler.remove_labels,
            &self.remove_labels,
        );
        let issue_type = self
            .issue_type
            .clone()
            .or_else(|| resolve_string(&process_env, "CONFLUENCE_LABEL_ISSUE_TYPE", labeler.issue_type.as_deref()));

        if add.is_empty() && remove.is_empty() {
            return Err(CliError::Validation(
                "No label changes specified. Use --add-label/--remove-label or set defaults.".to_owned(),
            ));
        }

        let settings = config.confluence_settings(&process_env, self.confluence_timeout);
        let fetched = self
            .page
            .fetch(config, &settings, &["body.storage"], false, output)?;

        let mut keys = BTreeSet::new();
        let mut queries = BTreeSet::new();
        for page in &fetched.pages {
            let objects = PageObjects::from_page(&fetched.base_url, page);
            keys.extend(objects.issue_keys(&macro_name));
            queries.extend(objects.queries(&macro_name));
        }
        if keys.is_empty() && queries.is_empty() {
            return Err(CliError::Incomplete(
                "No issue keys or JQL queries found in macros.".to_owned(),
            ));
        }

        let jira_settings = config.jira_settings(&process_env, self.jira_timeout);
        let report = with_jira(&jira_settings, |client| {
            expand_queries(client, &queries, &mut keys, output);
            Ok::<_, CliError>(apply_labels(client, &keys, &add, &remove, issue_type.as_deref(), output))
        })?;

        print_report(output, &report, issue_type.as_deref());
        if report.failed.is_empty() {
            Ok(())
        } else {
            Err(CliError::Incomplete(format!(
                "{} issue(s) could not be labelled.",
                report.failed.len()
            )))
        }
    }
}

/// Add the keys matched by each query; a failing query is reported and skipped.
fn expand_queries(
    client: &JiraClient,
    queries: &BTreeSet<String>,
    keys: &mut BTreeSet<String>,
    output: &Output,
) {
    for query in queries {
        match client.search_issue_keys(query, QUERY_MAX_RESULTS) {
            Ok(found) => keys.extend(found),
            Err(e) => output.error(&format!("Failed JQL '{query}': {e}")),
        }
    }
}

fn apply_labels(
    client: &JiraClient,
    keys: &BTreeSet<String>,
    add: &[String],
    remove: &[String],
    issue_type: Option<&str>,
    output: &Output,
) -> LabelReport {
    let wanted_type = issue_type.map(str::to_lowercase);
    let detail = change_detail(add, remove);
    let mut report = LabelReport::default();

    for key in keys {
        let issue = match client.get_issue(key) {
            Ok(issue) => issue,
            Err(e) => {
                output.error(&format!("[fail] {key}: {e}"));
                report.failed.push((key.clone(), e.to_string()));
                continue;
            }
        };

        let current_type = issue.issue_type().unwrap_or_default();
        if wanted_type
            .as_deref()
            .is_some_and(|wanted| current_type.to_lowercase() != wanted)
        {
            let shown = if current_type.is_empty() { "unknown" } else { current_type };
            output.print(&format!("[skip] {key} (type: {shown})"));
            report.skipped.push(key.clone());
            continue;
        }

        match client.update_labels(key, add, remove) {
            Ok(()) => {
                output.success(&format!("[ok] {key}{detail}"));
                report.updated.push(key.clone());
            }
            Err(e) => {
                output.error(&format!("[fail] {key}: {e}"));
                report.failed.push((key.clone(), e.to_string()));
            }
        }
    }
    report
}

/// ` (add=a,b; remove=c)`, or empty when there is nothing to show.
fn change_detail(add: &[String], remove: &[String]) -> String {
    let mut applied = Vec::new();
    if !add.is_empty() {
        applied.push(format!("add={}", add.join(",")));
    }
    if !remove.is_empty() {
        applied.push(format!("remove={}", remove.join(",")));
    }
    if applied.is_empty() {
        String::new()
    } else {
        format!(" ({})", applied.join("; "))
    }
}

fn print_report(output: &Output, report: &LabelReport, issue_type: Option<&str>) {
    if !report.updated.is_empty() {
        output.print(&format!(
            "Updated labels on {} issue(s): {}",
            report.updated.len(),
            report.updated.join(", ")
        ));
    }
    if !report.skipped.is_empty() {
        let reason = issue_type.map_or_else(
            || "issue type filter".to_owned(),
            |t| format!("issue type != {t}"),
        );
        output.print(&format!(
            "Skipped {} issue(s) due to {reason}: {}",
            report.skipped.len(),
            report.skipped.join(", ")
        ));
    }
    output.failures(
        "Failed updates:",
        report.failed.iter().map(|(k, r)| (k.as_str(), r.as_str())),
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_change_detail() {
        assert_eq!(
            change_detail(&["a".to_owned(), "b".to_owned()], &["c".to_owned()]),
            " (add=a,b; remove=c)"
        );
        assert_eq!(change_detail(&[], &["c".to_owned()]), " (remove=c)");
        assert_eq!(change_detail(&[], &[]), "");
    }
}
