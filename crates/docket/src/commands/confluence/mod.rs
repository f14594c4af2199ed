//! `docket confluence` subcommand group.

mod content;
mod label;
mod objects;
mod team_sync;

use clap::{Args, Subcommand};
use docket_config::{Config, ServiceSettings, process_env, resolve_bool, resolve_parsed};
use docket_confluence::{Failure, extract_page_id, types::Page, with_confluence};

use content::ContentArgs;
use label::LabelArgs;
use objects::ObjectsArgs;
use team_sync::TeamSyncArgs;

use crate::error::CliError;
use crate::output::Output;

/// Confluence commands.
#[derive(Subcommand)]
pub(crate) enum ConfluenceCommand {
    /// Print a heading section and macro blocks of a page or its children.
    Content(ContentArgs),
    /// Print titles, headings, tables and macros of pages as JSON.
    Objects(ObjectsArgs),
    /// Add or remove labels on tickets referenced from page macros.
    Label(LabelArgs),
    /// Copy a page table value onto the tickets the page references.
    TeamSync(TeamSyncArgs),
}

impl ConfluenceCommand {
    /// Execute the confluence subcommand.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        match self {
            Self::Content(args) => args.execute(config, output),
            Self::Objects(args) => args.execute(config, output),
            Self::Label(args) => args.execute(config, output),
            Self::TeamSync(args) => args.execute(config, output),
        }
    }
}

/// Page selection shared by every confluence command.
#[derive(Args)]
pub(crate) struct PageArgs {
    /// Confluence page id or URL.
    page: String,

    /// Treat the page as a parent and process its child pages
    /// (env: `CONFLUENCE_IS_PARENT`).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    is_parent: Option<bool>,

    /// Process the page itself, not its children.
    #[arg(long, conflicts_with = "is_parent")]
    no_is_parent: bool,

    /// Limit the number of child pages fetched with --is-parent
    /// (env: `CONFLUENCE_MAX_CHILDREN`).
    #[arg(long)]
    max_children: Option<usize>,
}

/// Pages fetched for one command, with the base URL used for links.
pub(crate) struct FetchedPages {
    pub(crate) base_url: String,
    pub(crate) pages: Vec<Page>,
}

impl PageArgs {
    /// Fetch the page or its children and report per-page failures.
    ///
    /// Fails when the page reference is unusable, the connection fails, or
    /// nothing could be fetched.
    pub(crate) fn fetch(
        &self,
        config: &Config,
        settings: &ServiceSettings,
        expand: &[&str],
        default_is_parent: bool,
        output: &Output,
    ) -> Result<FetchedPages, CliError> {
        let page_id = extract_page_id(&self.page).ok_or_else(|| {
            CliError::Validation("Unable to determine page id from the provided value.".to_owned())
        })?;
        let is_parent = self.is_parent(config, default_is_parent);
        let max_children = self
            .max_children
            .or_else(|| resolve_parsed(&process_env, "CONFLUENCE_MAX_CHILDREN", config.confluence.max_children));

        let (base_url, pages, failures) = with_confluence(settings, |client| {
            let (pages, failures) = client.fetch_targets(&page_id, is_parent, expand, max_children);
            Ok::<_, CliError>((client.base_url().to_owned(), pages, failures))
        })?;

        report_failures(output, &failures);
        if pages.is_empty() {
            return Err(CliError::Incomplete("No Confluence content fetched.".to_owned()));
        }
        Ok(FetchedPages { base_url, pages })
    }

    fn is_parent(&self, config: &Config, default: bool) -> bool {
        if self.no_is_parent {
            return false;
        }
        self.is_parent.unwrap_or_else(|| {
            resolve_bool(
                &process_env,
                "CONFLUENCE_IS_PARENT",
                config.confluence.is_parent,
                default,
            )
        })
    }
}

fn report_failures(output: &Output, failures: &[Failure]) {
    output.failures(
        "Failed to fetch some pages:",
        failures.iter().map(|f| (f.id.as_str(), f.reason.as_str())),
    );
}
