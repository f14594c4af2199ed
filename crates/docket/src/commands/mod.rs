//! CLI command implementations.

pub(crate) mod confluence;
pub(crate) mod jira;

pub(crate) use confluence::ConfluenceCommand;
pub(crate) use jira::JiraCommand;
