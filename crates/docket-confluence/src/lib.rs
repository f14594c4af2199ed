//! Confluence integration for docket.
//!
//! - [`ConfluenceClient`]: REST API client with basic authentication
//! - [`storage`]: storage-format parsing and extraction (sections, macros, tables)
//! - [`PageContent`] / [`PageObjects`]: per-page extraction results
//!
//! # Example
//!
//! ```ignore
//! use docket_confluence::{PAGE_EXPAND, PageObjects, with_confluence};
//!
//! let objects = with_confluence(&settings, |client| {
//!     let page = client.get_page("123", PAGE_EXPAND)?;
//!     Ok::<_, docket_confluence::ConfluenceError>(PageObjects::from_page(client.base_url(), &page))
//! })?;
//! ```

mod client;
pub use client::{ConfluenceClient, DEFAULT_PAGE_SIZE, Failure, with_confluence};

mod links;
pub use links::{extract_page_id, page_url};

mod objects;
pub use objects::{NamedMacros, PAGE_EXPAND, PageContent, PageObjects};

pub mod storage;

pub mod types;

pub mod error;
pub use error::ConfluenceError;
