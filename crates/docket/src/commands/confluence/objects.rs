//! `docket confluence objects` command implementation.

use std::path::PathBuf;

use clap::Args;
use docket_config::{Config, process_env};
use docket_confluence::{PAGE_EXPAND, PageObjects};

use super::PageArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the confluence objects command.
#[derive(Args)]
pub(crate) struct ObjectsArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Write JSON to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,

    /// Override Confluence connection timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

impl ObjectsArgs {
    /// Execute the objects command.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        let settings = config.confluence_settings(&process_env, self.timeout);
        let fetched = self.page.fetch(config, &settings, PAGE_EXPAND, false, output)?;

        let records: Vec<PageObjects> = fetched
            .pages
            .iter()
            .map(|page| PageObjects::from_page(&fetched.base_url, page))
            .collect();
        let json = if self.pretty {
            serde_json::to_string_pretty(&records)?
        } else {
            serde_json::to_string(&records)?
        };

        match &self.output {
            Some(path) => {
                std::fs::write(path, format!("{json}\n"))?;
                output.success(&format!(
                    "Wrote {} page record(s) to {}",
                    records.len(),
                    path.display()
                ));
            }
            None => output.print(&json),
        }
        Ok(())
    }
}
