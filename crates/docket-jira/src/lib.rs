//! Jira integration for docket.
//!
//! - [`JiraClient`]: REST API v2 and Service Desk client with basic authentication
//! - [`Issue`]: issue with raw field mapping and display-name lookup
//! - [`ListOptions`] / [`IssueFields`]: open-issue listing and field reports
//!
//! # Example
//!
//! ```ignore
//! use docket_jira::with_jira;
//!
//! let outcome = with_jira(&settings, |client| {
//!     client.transition_issue("OPS-1", Some("Open"), "In Progress")
//! })?;
//! println!("{} -> {}", outcome.before, outcome.after);
//! ```

mod client;
pub use client::{
    Failure, IssueFields, JiraClient, ListOptions, SERVICE_DESK_PAGE_LIMIT, TransitionOutcome,
    issue_url, with_jira,
};

pub mod types;
pub use types::{FieldResolver, Issue, display_value};

pub mod error;
pub use error::JiraError;
