//! `docket jira fields` command implementation.

use clap::Args;
use docket_config::{Config, process_env};
use docket_jira::{IssueFields, display_value, with_jira};

use super::IssueArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the jira fields command.
#[derive(Args)]
pub(crate) struct FieldsArgs {
    #[command(flatten)]
    issues: IssueArgs,

    /// Field display name or id to print (repeatable).
    #[arg(long = "field", value_name = "NAME", required = true)]
    fields: Vec<String>,

    /// Override Jira connection timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

impl FieldsArgs {
    /// Execute the fields command.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        let keys = self.issues.keys()?;
        let settings = config.jira_settings(&process_env, self.timeout);
        let (records, failures) = with_jira(&settings, |client| {
            Ok::<_, CliError>(client.fetch_issue_fields(&keys, &self.fields))
        })?;

        output.failures(
            "Failed to fetch some issues:",
            failures.iter().map(|f| (f.key.as_str(), f.reason.as_str())),
        );
        if records.is_empty() {
            return Err(CliError::Incomplete("No issue details fetched.".to_owned()));
        }

        output.print(&format!("Fetched {} issue(s).", records.len()));
        for record in &records {
            for line in record_lines(record) {
                output.print(&line);
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CliError::Incomplete(format!(
                "{} issue(s) could not be fetched.",
                failures.len()
            )))
        }
    }
}

fn record_lines(record: &IssueFields) -> Vec<String> {
    let mut lines = vec![
        format!(
            "\n{} [{}]",
            record.key,
            record.status.as_deref().unwrap_or("unknown")
        ),
        record.url.clone(),
    ];
    for (name, value) in &record.fields {
        let text = value
            .as_ref()
            .map(display_value)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "<no value>".to_owned());
        lines.push(format!("  {name}: {text}"));
    }
    lines
}
