//! Confluence API response types.

mod page;

pub use page::{Ancestor, Body, ChildPages, Links, Page, Storage, Version};
