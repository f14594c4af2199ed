//! `docket confluence content` command implementation.

use clap::Args;
use docket_config::{Config, merge_lists, process_env};
use docket_confluence::{PAGE_EXPAND, PageContent};

use super::PageArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the confluence content command.
#[derive(Args)]
pub(crate) struct ContentArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Heading title whose section is printed.
    #[arg(long = "section")]
    section_title: Option<String>,

    /// Macro name(s) to extract (repeat flag or comma-separate; env: `CONFLUENCE_MACROS`).
    #[arg(long = "macro", value_name = "NAME[,NAME...]")]
    macros: Vec<String>,

    /// Override Confluence connection timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

impl ContentArgs {
    /// Execute the content command.
    pub(crate) fn execute(self, config: &Config, output: &Output) -> Result<(), CliError> {
        let macro_names = merge_lists(
            &process_env,
            "CONFLUENCE_MACROS",
            &config.confluence.macros,
            &self.macros,
        );
        let settings = config.confluence_settings(&process_env, self.timeout);
        let fetched = self.page.fetch(config, &settings, PAGE_EXPAND, false, output)?;

        output.print(&format!(
            "Fetched {} page(s) from Confluence.",
            fetched.pages.len()
        ));
        for page in &fetched.pages {
            let content = PageContent::from_page(
                &fetched.base_url,
                page,
                self.section_title.as_deref(),
                &macro_names,
            );
            print_content(output, &content, self.section_title.as_deref());
        }
        Ok(())
    }
}

fn print_content(output: &Output, content: &PageContent, section_title: Option<&str>) {
    let title = if content.title.is_empty() {
        &content.id
    } else {
        &content.title
    };
    output.highlight(&format!("\n=== {title} ==="));
    output.print(&content.url);

    if let Some(section_title) = section_title {
        output.print(&format!("\nSection '{section_title}':"));
        output.print(content.section.as_deref().unwrap_or("  <section not found>"));
    }

    for named in &content.macros {
        output.print(&format!("\nMacro '{}':", named.name));
        if named.blocks.is_empty() {
            output.print("  <macro not found>");
        }
        for (idx, block) in named.blocks.iter().enumerate() {
            output.print(&format!("-- {} #{} --", named.name, idx + 1));
            output.print(block);
        }
    }
}
