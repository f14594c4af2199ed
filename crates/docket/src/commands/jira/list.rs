//! `docket jira list` command implementation.

use clap::Args;
use docket_config::{Config, process_env, resolve_parsed, resolve_string};
use docket_jira::{ListOptions, issue_url, with_jira};

use crate::error::CliError;
use crate::output::Output;

/// Number of blocks the URL list is split into.
const URL_GROUPS: usize = 5;

/// Arguments for the jira list command.
#[derive(Args)]
pub(crate) struct ListArgs {
    /// Jira project key (env: `JIRA_PROJECT`).
    #[arg(long)]
    project: Option<String>,

    /// Maximum number of issues to fetch.
    #[arg(long, default_value_t = 200)]
    max_results: usize,

    /// Queue id or name; accepts `custom/123`, a numeric id or a name (env: `JIRA_QUEUE_ID`).
    #[arg(long)]
    queue_id: Option<String>,

    /// Explicit service desk id, looked up from the project if omitted
    /// (env: `JIRA_SERVICE_DESK_ID`).
    #[arg(long)]
    service_desk_id: Option<u64>,

    /// Use the project JQL search instead of the service desk queue.
    #[arg(long)]
    use_jql: bool,

    /// Keep only issues in this status (repeat for OR).
    #[arg(long = "status")]
    statuses: Vec<String>,

    /// Override Jira connection timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

impl ListArgs {
    /// Execute the list command.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        let defaults = &config.defaults;
        let project = self
            .project
            .clone()
            .or_else(|| resolve_string(&process_env, "JIRA_PROJECT", defaults.project.as_deref()))
            .ok_or_else(|| {
                CliError::Validation(
                    "Project key is required. Pass --project or set JIRA_PROJECT.".to_owned(),
                )
            })?;
        let statuses = if self.statuses.is_empty() {
            defaults.statuses.clone()
        } else {
            self.statuses.clone()
        };
        let options = ListOptions {
            project: project.clone(),
            max_results: self.max_results,
            queue_id: self
                .queue_id
                .clone()
                .or_else(|| resolve_string(&process_env, "JIRA_QUEUE_ID", defaults.queue_id.as_deref())),
            service_desk_id: self
                .service_desk_id
                .or_else(|| resolve_parsed(&process_env, "JIRA_SERVICE_DESK_ID", defaults.service_desk_id))
                .map(|id| id.to_string()),
            use_jql: self.use_jql,
            statuses,
        };

        let settings = config.jira_settings(&process_env, self.timeout);
        let (base_url, issues, queue) = with_jira(&settings, |client| {
            let (issues, queue) = client.list_open_issues(&options)?;
            Ok::<_, CliError>((client.base_url().to_owned(), issues, queue))
        })?;

        if issues.is_empty() {
            output.print(&format!("No open issues found in project {project}."));
            return Ok(());
        }
        if let Some(queue) = queue {
            let name = if queue.name.is_empty() {
                options.queue_id.as_deref().unwrap_or_default()
            } else {
                queue.name.as_str()
            };
            output.highlight(&format!(
                "Queue '{name}' (ID {}, Service Desk {})",
                queue.queue_id, queue.service_desk_id
            ));
        }

        output.print(&format!(
            "Found {} open issues in project {project}:",
            issues.len()
        ));
        let urls: Vec<String> = issues.iter().map(|i| issue_url(&base_url, &i.key)).collect();
        for line in grouped_lines(&urls, URL_GROUPS) {
            output.print(&line);
        }
        Ok(())
    }
}

/// `items` with a `-----` separator after every `ceil(len / groups)` entries.
fn grouped_lines(items: &[String], groups: usize) -> Vec<String> {
    let chunk = items.len().div_ceil(groups.max(1)).max(1);
    let mut lines = Vec::with_capacity(items.len() + groups);
    for (idx, item) in items.iter().enumerate() {
        lines.push(item.clone());
        let position = idx + 1;
        if position % chunk == 0 && position != items.len() {
            lines.push("-----".to_owned());
        }
    }
    lines
}
