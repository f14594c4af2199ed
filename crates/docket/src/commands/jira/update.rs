//! `docket jira update` command implementation.

use clap::Args;
use docket_config::{
    Config, UpdateConfig, merge_lists, parse_assignments, process_env, resolve_string, split_list,
};
use docket_jira::{JiraClient, JiraError, with_jira};
use serde_json::Value;

use super::IssueArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the jira update command.
#[derive(Args)]
pub(crate) struct UpdateArgs {
    #[command(flatten)]
    issues: IssueArgs,

    /// Label to add (repeatable; env: `JIRA_UPDATE_ADD_LABELS`).
    #[arg(long = "add-label", value_name = "LABEL")]
    add_labels: Vec<String>,

    /// Label to remove (repeatable; env: `JIRA_UPDATE_REMOVE_LABELS`).
    #[arg(long = "remove-label", value_name = "LABEL")]
    remove_labels: Vec<String>,

    /// New summary (env: `JIRA_UPDATE_SUMMARY`).
    #[arg(long = "set-summary", value_name = "TEXT")]
    summary: Option<String>,

    /// Field assignment by display name or id (repeatable; env: `JIRA_UPDATE_FIELDS`).
    #[arg(long = "set-field", value_name = "NAME=VALUE")]
    fields: Vec<String>,

    /// Assignee account id (env: `JIRA_UPDATE_ASSIGNEE`).
    #[arg(long)]
    assignee: Option<String>,

    /// Only update tickets of this issue type (env: `JIRA_UPDATE_ISSUE_TYPE`).
    #[arg(long)]
    issue_type: Option<String>,

    /// Override Jira connection timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

/// Edits applied to every selected ticket.
#[derive(Debug, Default, PartialEq)]
struct UpdatePlan {
    add_labels: Vec<String>,
    remove_labels: Vec<String>,
    fields: Vec<(String, String)>,
    summary: Option<String>,
    assignee: Option<String>,
    issue_type: Option<String>,
}

impl UpdatePlan {
    fn is_empty(&self) -> bool {
        self.add_labels.is_empty()
            && self.remove_labels.is_empty()
            && self.fields.is_empty()
            && self.summary.is_none()
            && self.assignee.is_none()
    }

    fn apply(&self, client: &JiraClient, key: &str) -> Result<(), JiraError> {
        let fields: Vec<(String, Value)> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        client.update_fields(key, &fields)?;
        if let Some(summary) = &self.summary {
            client.update_fields(key, &[("summary".to_owned(), Value::String(summary.clone()))])?;
        }
        client.update_labels(key, &self.add_labels, &self.remove_labels)?;
        if let Some(assignee) = &self.assignee {
            client.assign_issue(key, assignee)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct UpdateReport {
    updated: Vec<String>,
    skipped: Vec<String>,
    failed: Vec<(String, String)>,
}

impl UpdateArgs {
    /// Execute the update command.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        let plan = self.plan(&process_env, &config.update);
        if plan.is_empty() {
            return Err(CliError::Validation(
                "No updates specified. Use config/defaults or flags: \
                 --add-label/--remove-label/--set-summary/--set-field/--assignee."
                    .to_owned(),
            ));
        }
        let keys = self.issues.keys()?;

        let settings = config.jira_settings(&process_env, self.timeout);
        let report = with_jira(&settings, |client| Ok::<_, CliError>(run(client, &plan, &keys)))?;

        if !report.updated.is_empty() {
            output.success(&format!(
                "Updated {} issue(s): {}",
                report.updated.len(),
                report.updated.join(", ")
            ));
        }
        if !report.skipped.is_empty() {
            output.print(&format!(
                "Skipped {} issue(s) that did not match type '{}': {}",
                report.skipped.len(),
                plan.issue_type.as_deref().unwrap_or_default(),
                report.skipped.join(", ")
            ));
        }
        output.failures(
            "Failed updates:",
            report.failed.iter().map(|(k, r)| (k.as_str(), r.as_str())),
        );
        if report.failed.is_empty() {
            Ok(())
        } else {
            Err(CliError::Incomplete(format!(
                "{} issue(s) could not be updated.",
                report.failed.len()
            )))
        }
    }

    /// Merge file, environment and flag values.
    ///
    /// Label lists concatenate. Field assignments apply in the same order so
    /// a later source overrides an earlier one for the same name. Scalars
    /// take the flag, then the environment, then the file.
    fn plan<E>(&self, env: &E, defaults: &UpdateConfig) -> UpdatePlan
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut fields: Vec<(String, String)> = defaults
            .fields
            .iter()
            .filter(|(name, _)| !name.trim().is_empty())
            .map(|(name, value)| (name.trim().to_owned(), value.clone()))
            .collect();
        let env_fields = env("JIRA_UPDATE_FIELDS")
            .map(|raw| parse_assignments(&split_list(&raw)))
            .unwrap_or_default();
        for (name, value) in env_fields.into_iter().chain(parse_assignments(&self.fields)) {
            match fields.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = value,
                None => fields.push((name, value)),
            }
        }

        let scalar = |flag: &Option<String>, name: &str, file: &Option<String>| {
            flag.clone()
                .filter(|value| !value.trim().is_empty())
                .or_else(|| resolve_string(env, name, file.as_deref()))
                .map(|value| value.trim().to_owned())
        };

        UpdatePlan {
            add_labels: merge_lists(env, "JIRA_UPDATE_ADD_LABELS", &defaults.add_labels, &self.add_labels),
            remove_labels: merge_lists(
                env,
                "JIRA_UPDATE_REMOVE_LABELS",
                &defaults.remove_labels,
                &self.remove_labels,
            ),
            fields,
            summary: scalar(&self.summary, "JIRA_UPDATE_SUMMARY", &defaults.summary),
            assignee: scalar(&self.assignee, "JIRA_UPDATE_ASSIGNEE", &defaults.assignee),
            issue_type: scalar(&self.issue_type, "JIRA_UPDATE_ISSUE_TYPE", &defaults.issue_type),
        }
    }
}

fn run(client: &JiraClient, plan: &UpdatePlan, keys: &[String]) -> UpdateReport {
    let wanted_type = plan.issue_type.as_deref().map(str::to_lowercase);
    let mut report = UpdateReport::default();

    for key in keys {
        if let Some(wanted) = &wanted_type {
            match client.get_issue(key) {
                Ok(issue) if issue.issue_type().unwrap_or_default().to_lowercase() != *wanted => {
                    report.skipped.push(key.clone());
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    report.failed.push((key.clone(), e.to_string()));
                    continue;
                }
            }
        }
        match plan.apply(client, key) {
            Ok(()) => report.updated.push(key.clone()),
            Err(e) => report.failed.push((key.clone(), e.to_string())),
        }
    }
    report
}
