//! `docket confluence team-sync` command implementation.

use clap::Args;
use docket_config::{Config, process_env};
use docket_confluence::storage::find_table_value;
use docket_confluence::{PAGE_EXPAND, PageObjects};
use docket_jira::{JiraClient, display_value, with_jira};
use serde_json::Value;

use super::PageArgs;
use crate::error::CliError;
use crate::output::Output;

/// Macro whose references receive the table value.
const TICKET_MACRO: &str = "jira";

/// Arguments for the confluence team-sync command.
#[derive(Args)]
pub(crate) struct TeamSyncArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Table key to read from each page.
    #[arg(long, default_value = "Related Team/Vertical")]
    table_key: String,

    /// Jira field name or id to update.
    #[arg(long, default_value = "Report Related Team")]
    jira_field: String,

    /// Only update issues of this issue type.
    #[arg(long, default_value = "Task")]
    issue_type: String,

    /// Print updates without sending changes to Jira.
    #[arg(long)]
    dry_run: bool,

    /// Override Confluence connection timeout in seconds.
    #[arg(long)]
    confluence_timeout: Option<u64>,

    /// Override Jira connection timeout in seconds.
    #[arg(long)]
    jira_timeout: Option<u64>,
}

/// Table value and referenced tickets of one page.
struct SyncTarget {
    value: String,
    issue_keys: Vec<String>,
}

#[derive(Debug, Default)]
struct SyncReport {
    updated: Vec<String>,
    skipped_type: Vec<String>,
    skipped_same: Vec<String>,
    failed: Vec<(String, String)>,
}

impl TeamSyncArgs {
    /// Execute the team-sync command.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        let settings = config.confluence_settings(&process_env, self.confluence_timeout);
        let fetched = self.page.fetch(config, &settings, PAGE_EXPAND, true, output)?;

        let targets: Vec<SyncTarget> = fetched
            .pages
            .iter()
            .filter_map(|page| {
                let objects = PageObjects::from_page(&fetched.base_url, page);
                let value = find_table_value(&objects.tables, &self.table_key)?.to_owned();
                let issue_keys = objects.issue_keys(TICKET_MACRO);
                (!issue_keys.is_empty()).then_some(SyncTarget { value, issue_keys })
            })
            .collect();

        let jira_settings = config.jira_settings(&process_env, self.jira_timeout);
        let report = with_jira(&jira_settings, |client| {
            Ok::<_, CliError>(self.sync(client, &targets, output))
        })?;

        self.print_report(output, &report);
        if report.failed.is_empty() {
            Ok(())
        } else {
            Err(CliError::Incomplete(format!(
                "{} issue(s) could not be updated.",
                report.failed.len()
            )))
        }
    }

    fn sync(&self, client: &JiraClient, targets: &[SyncTarget], output: &Output) -> SyncReport {
        let wanted_type = normalize_issue_type(&self.issue_type);
        let mut report = SyncReport::default();

        for target in targets {
            for key in &target.issue_keys {
                let issue = match client.get_issue(key) {
                    Ok(issue) => issue,
                    Err(e) => {
                        report.failed.push((key.clone(), e.to_string()));
                        continue;
                    }
                };
                if normalize_issue_type(issue.issue_type().unwrap_or_default()) != wanted_type {
                    report.skipped_type.push(key.clone());
                    continue;
                }
                let current = match issue.get(&self.jira_field, client) {
                    Ok(value) => display_value(value),
                    Err(e) if e.is_recoverable() => String::new(),
                    Err(e) => {
                        report.failed.push((key.clone(), e.to_string()));
                        continue;
                    }
                };
                if current == target.value.trim() {
                    report.skipped_same.push(key.clone());
                    continue;
                }

                let change = format!("{key} -> {}='{}'", self.jira_field, target.value);
                if self.dry_run {
                    output.print(&format!("[dry-run] {change}"));
                    report.updated.push(key.clone());
                    continue;
                }
                let values = [(self.jira_field.clone(), Value::String(target.value.clone()))];
                match client.update_fields(key, &values) {
                    Ok(()) => {
                        output.success(&change);
                        report.updated.push(key.clone());
                    }
                    Err(e) => report.failed.push((key.clone(), e.to_string())),
                }
            }
        }
        report
    }

    fn print_report(&self, output: &Output, report: &SyncReport) {
        if report.updated.is_empty() && report.failed.is_empty() {
            output.print("No matching Jira issues found to update.");
            return;
        }
        output.print(&format!("Updated {} issue(s).", report.updated.len()));
        if self.dry_run {
            output.warning("Dry-run enabled. No changes were sent to Jira.");
        }
        if !report.skipped_type.is_empty() {
            output.print(&format!(
                "Skipped (issue type mismatch): {}",
                report.skipped_type.len()
            ));
        }
        if !report.skipped_same.is_empty() {
            output.print(&format!(
                "Skipped (already set): {}",
                report.skipped_same.len()
            ));
        }
        output.failures(
            "Failures:",
            report.failed.iter().map(|(k, r)| (k.as_str(), r.as_str())),
        );
    }
}

/// Lower-cased with hyphens and spaces removed, so "Sub-task" matches "subtask".
fn normalize_issue_type(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '-' && *c != ' ')
        .collect()
}
