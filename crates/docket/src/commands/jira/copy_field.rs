//! `docket jira copy-field` command implementation.

use clap::Args;
use docket_config::{Config, process_env, resolve_string};
use docket_jira::types::same_name;
use docket_jira::{Issue, JiraClient, JiraError, with_jira};
use serde_json::Value;

use crate::error::CliError;
use crate::output::Output;

const DEFAULT_ISSUE_TYPE: &str = "Sub-task";

/// Object keys tried, in order, for the text of a field value.
const TEXT_KEYS: &[&str] = &["name", "value", "displayName", "key", "id"];

/// Arguments for the jira copy-field command.
#[derive(Args)]
pub(crate) struct CopyFieldArgs {
    /// Field name or id to copy from.
    #[arg(long, required = true)]
    source_field: String,

    /// Field name or id to copy to.
    #[arg(long, required = true)]
    target_field: String,

    /// Jira project key (env: `JIRA_PROJECT`).
    #[arg(long)]
    project: Option<String>,

    /// Only copy on tickets of this issue type; an empty value disables the
    /// filter (env: `JIRA_COPY_ISSUE_TYPE`; default: Sub-task).
    #[arg(long)]
    issue_type: Option<String>,

    /// Additional JQL combined with the project and type filters.
    #[arg(long)]
    jql: Option<String>,

    /// Maximum number of issues to fetch.
    #[arg(long, default_value_t = 200)]
    max_results: usize,

    /// Print updates without sending changes to Jira.
    #[arg(long)]
    dry_run: bool,

    /// Override Jira connection timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

/// What to copy and where.
#[derive(Debug, PartialEq)]
struct CopyPlan {
    source: String,
    target: String,
    issue_type: Option<String>,
    dry_run: bool,
}

#[derive(Debug, Default, PartialEq)]
struct CopyReport {
    updated: Vec<String>,
    skipped_type: Vec<String>,
    skipped_empty: Vec<String>,
    skipped_same: Vec<String>,
    failed: Vec<(String, String)>,
}

impl CopyFieldArgs {
    /// Execute the copy-field command.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        let (plan, jql) = self.plan(&process_env, config)?;

        let settings = config.jira_settings(&process_env, self.timeout);
        let report = with_jira(&settings, |client| {
            let keys = client.search_issue_keys(&jql, self.max_results)?;
            if keys.is_empty() {
                return Ok::<_, CliError>(None);
            }
            Ok(Some(copy_values(client, &plan, &keys, output)))
        })?;

        let Some(report) = report else {
            output.print("No matching Jira issues found.");
            return Ok(());
        };
        print_report(output, &report);
        if !report.failed.is_empty() {
            return Err(CliError::Incomplete(format!(
                "{} issue(s) could not be updated.",
                report.failed.len()
            )));
        }
        if plan.dry_run {
            output.warning("Dry-run enabled. No changes were sent to Jira.");
        }
        Ok(())
    }

    /// Resolve the copy plan and the search query.
    fn plan<E>(&self, env: &E, config: &Config) -> Result<(CopyPlan, String), CliError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let source = self.source_field.trim();
        let target = self.target_field.trim();
        if source.is_empty() || target.is_empty() {
            return Err(CliError::Validation(
                "Both --source-field and --target-field are required.".to_owned(),
            ));
        }

        let defaults = &config.defaults;
        let project = self
            .project
            .clone()
            .filter(|p| !p.trim().is_empty())
            .or_else(|| resolve_string(env, "JIRA_PROJECT", defaults.project.as_deref()));
        let issue_type = match &self.issue_type {
            Some(flag) => Some(flag.clone()),
            None => Some(
                resolve_string(
                    env,
                    "JIRA_COPY_ISSUE_TYPE",
                    defaults.copy_field.issue_type.as_deref(),
                )
                .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_owned()),
            ),
        }
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty());

        let jql = build_jql(project.as_deref(), issue_type.as_deref(), self.jql.as_deref());
        if jql.is_empty() {
            return Err(CliError::Validation(
                "Project or JQL filter is required.".to_owned(),
            ));
        }
        let plan = CopyPlan {
            source: source.to_owned(),
            target: target.to_owned(),
            issue_type,
            dry_run: self.dry_run,
        };
        Ok((plan, jql))
    }
}

/// `project` and `issuetype` clauses joined with `AND`, then combined with
/// `extra` when both are present.
fn build_jql(project: Option<&str>, issue_type: Option<&str>, extra: Option<&str>) -> String {
    let mut parts = Vec::new();
    if let Some(project) = project.map(str::trim).filter(|p| !p.is_empty()) {
        parts.push(format!("project = \"{project}\""));
    }
    if let Some(issue_type) = issue_type.map(str::trim).filter(|t| !t.is_empty()) {
        parts.push(format!("issuetype = \"{issue_type}\""));
    }
    let base = parts.join(" AND ");
    match extra.map(str::trim).filter(|e| !e.is_empty()) {
        Some(extra) if base.is_empty() => extra.to_owned(),
        Some(extra) => format!("({base}) AND ({extra})"),
        None => base,
    }
}

/// Text compared and written for a field value.
///
/// Objects use their first scalar among [`TEXT_KEYS`]; arrays join the
/// non-empty texts of their items with `, `.
fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_owned(),
        Value::Array(items) => items
            .iter()
            .map(field_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => TEXT_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|candidate| match candidate {
                Value::String(s) => Some(s.trim().to_owned()),
                Value::Number(_) | Value::Bool(_) => Some(candidate.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

/// Text of `field` on `issue`; a missing field is reported as `role field 'name' not found`.
fn read_field(
    client: &JiraClient,
    issue: &Issue,
    field: &str,
    role: &str,
) -> Result<String, String> {
    match issue.get(field, client) {
        Ok(value) => Ok(field_text(value)),
        Err(JiraError::FieldNotFound { .. }) => Err(format!("{role} field '{field}' not found")),
        Err(e) => Err(e.to_string()),
    }
}

fn copy_values(
    client: &JiraClient,
    plan: &CopyPlan,
    keys: &[String],
    output: &Output,
) -> CopyReport {
    let mut report = CopyReport::default();

    for key in keys {
        let issue = match client.get_issue(key) {
            Ok(issue) => issue,
            Err(e) => {
                output.error(&format!("[fail] {key}: {e}"));
                report.failed.push((key.clone(), e.to_string()));
                continue;
            }
        };
        if plan
            .issue_type
            .as_deref()
            .is_some_and(|wanted| !same_name(issue.issue_type().unwrap_or_default(), wanted))
        {
            report.skipped_type.push(key.clone());
            continue;
        }

        let source = match read_field(client, &issue, &plan.source, "source") {
            Ok(text) if text.is_empty() => {
                report.skipped_empty.push(key.clone());
                continue;
            }
            Ok(text) => text,
            Err(reason) => {
                report.failed.push((key.clone(), reason));
                continue;
            }
        };
        match read_field(client, &issue, &plan.target, "target") {
            Ok(current) if current == source => {
                report.skipped_same.push(key.clone());
                continue;
            }
            Ok(_) => {}
            Err(reason) => {
                report.failed.push((key.clone(), reason));
                continue;
            }
        }

        if plan.dry_run {
            output.print(&format!("[dry-run] {key} -> {}", plan.target));
            report.updated.push(key.clone());
            continue;
        }
        match client.update_fields(key, &[(plan.target.clone(), Value::String(source))]) {
            Ok(()) => {
                output.success(&format!("[ok] {key}"));
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

fn print_report(output: &Output, report: &CopyReport) {
    if !report.updated.is_empty() {
        output.print(&format!(
            "Updated {} issue(s): {}",
            report.updated.len(),
            report.updated.join(", ")
        ));
    }
    for (label, keys) in [
        ("issue type mismatch", &report.skipped_type),
        ("empty source field", &report.skipped_empty),
        ("same value", &report.skipped_same),
    ] {
        if !keys.is_empty() {
            output.print(&format!("Skipped ({label}): {}", keys.len()));
        }
    }
    output.failures(
        "Failed updates:",
        report.failed.iter().map(|(k, r)| (k.as_str(), r.as_str())),
    );
}
