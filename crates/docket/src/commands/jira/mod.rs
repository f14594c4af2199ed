//! `docket jira` subcommand group.

mod copy_field;
mod field_id;
mod fields;
mod list;
mod transition;
mod update;

use std::path::PathBuf;

use clap::{Args, Subcommand};

use copy_field::CopyFieldArgs;
use field_id::FieldIdArgs;
use fields::FieldsArgs;
use list::ListArgs;
use transition::TransitionArgs;
use update::UpdateArgs;

use docket_config::Config;

use crate::error::CliError;
use crate::input::read_issue_keys;
use crate::output::Output;

/// Jira commands.
#[derive(Subcommand)]
pub(crate) enum JiraCommand {
    /// List open tickets of a project or service desk queue.
    List(ListArgs),
    /// Move tickets to a target status.
    Transition(TransitionArgs),
    /// Edit labels, fields, summary or assignee of tickets.
    Update(UpdateArgs),
    /// Find field ids by display name.
    FieldId(FieldIdArgs),
    /// Print field values of tickets.
    Fields(FieldsArgs),
    /// Copy one field into another across tickets matched by a query.
    CopyField(CopyFieldArgs),
}

impl JiraCommand {
    /// Execute the jira subcommand.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        match self {
            Self::List(args) => args.execute(config, output),
            Self::Transition(args) => args.execute(config, output),
            Self::Update(args) => args.execute(config, output),
            Self::FieldId(args) => args.execute(config, output),
            Self::Fields(args) => args.execute(config, output),
            Self::CopyField(args) => args.execute(config, output),
        }
    }
}

/// Ticket selection shared by the batch commands.
#[derive(Args)]
pub(crate) struct IssueArgs {
    /// Issue keys or browse URLs (e.g. <https://jira.example.com/browse/PROJ-123>).
    issues: Vec<String>,

    /// File with issue keys or URLs, one per line.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl IssueArgs {
    /// Keys from the file, the arguments, or piped stdin.
    pub(crate) fn keys(&self) -> Result<Vec<String>, CliError> {
        read_issue_keys(&self.issues, self.file.as_deref())
    }
}
