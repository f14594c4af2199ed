//! `docket jira field-id` command implementation.

use clap::Args;
use docket_config::{Config, process_env};
use docket_jira::with_jira;
use docket_jira::types::FieldDef;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the jira field-id command.
#[derive(Args)]
pub(crate) struct FieldIdArgs {
    /// Field display name to look up.
    name: String,

    /// Match names containing the value instead of equal to it.
    #[arg(long)]
    contains: bool,

    /// Override Jira connection timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

impl FieldIdArgs {
    /// Execute the field-id command.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        let target = self.name.trim().to_lowercase();
        if target.is_empty() {
            return Err(CliError::Validation("Field name is required.".to_owned()));
        }

        let settings = config.jira_settings(&process_env, self.timeout);
        let fields = with_jira(&settings, |client| Ok::<_, CliError>(client.list_fields()?))?;

        let matches = matching_fields(&fields, &target, self.contains);
        if matches.is_empty() {
            return Err(CliError::Incomplete("No fields matched.".to_owned()));
        }
        for field in matches {
            output.print(&format!("FOUND: {}  ->  {}", field.id, field.name));
        }
        Ok(())
    }
}

/// Fields whose trimmed, lower-cased name equals (or contains) `target`.
fn matching_fields<'a>(fields: &'a [FieldDef], target: &str, contains: bool) -> Vec<&'a FieldDef> {
    fields
        .iter()
        .filter(|field| {
            let name = field.name.trim().to_lowercase();
            !name.is_empty() && if contains { name.contains(target) } else { name == target }
        })
        .collect()
}
