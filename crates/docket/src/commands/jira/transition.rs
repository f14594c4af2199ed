//! `docket jira transition` command implementation.

use clap::Args;
use docket_config::{Config, process_env, resolve_string};
use docket_jira::{TransitionOutcome, issue_url, with_jira};

use super::IssueArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the jira transition command.
#[derive(Args)]
pub(crate) struct TransitionArgs {
    #[command(flatten)]
    issues: IssueArgs,

    /// Only transition tickets currently in this status (env: `JIRA_ONLY_STATUS`).
    #[arg(long)]
    only_status: Option<String>,

    /// Status to transition to (env: `JIRA_TARGET_STATUS`).
    #[arg(long)]
    target_status: Option<String>,

    /// Override Jira connection timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

impl TransitionArgs {
    /// Execute the transition command.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        let defaults = &config.defaults;
        let target = self
            .target_status
            .clone()
            .or_else(|| resolve_string(&process_env, "JIRA_TARGET_STATUS", defaults.target_status.as_deref()))
            .ok_or_else(|| {
                CliError::Validation(
                    "Target status is required. Pass --target-status or set JIRA_TARGET_STATUS."
                        .to_owned(),
                )
            })?;
        let only_status = self
            .only_status
            .clone()
            .or_else(|| resolve_string(&process_env, "JIRA_ONLY_STATUS", defaults.only_status.as_deref()));
        let keys = self.issues.keys()?;

        let settings = config.jira_settings(&process_env, self.timeout);
        let updated = with_jira(&settings, |client| {
            let mut updated = 0;
            for key in &keys {
                output.print(&format!(
                    "\nProcessing {key} ({}):",
                    issue_url(client.base_url(), key)
                ));
                match client.transition_issue(key, only_status.as_deref(), &target) {
                    Ok(outcome) => {
                        output.print(&describe(&outcome, only_status.as_deref()));
                        if outcome.changed {
                            updated += 1;
                        }
                    }
                    Err(e) => output.error(&format!("- Failed: {e}")),
                }
            }
            Ok::<_, CliError>(updated)
        })?;

        if updated == 0 {
            return Err(CliError::Incomplete("No tickets were updated.".to_owned()));
        }
        output.success(&format!("\nDone. Updated {updated} ticket(s)."));
        Ok(())
    }
}

fn describe(outcome: &TransitionOutcome, only_status: Option<&str>) -> String {
    if outcome.changed {
        format!("- Status: {} -> {}", outcome.before, outcome.after)
    } else if outcome.skipped {
        format!(
            "- Skipped: status is '{}', needed '{}'.",
            outcome.before,
            only_status.unwrap_or_default()
        )
    } else {
        format!("- Skipped: already in '{}'.", outcome.before)
    }
}
