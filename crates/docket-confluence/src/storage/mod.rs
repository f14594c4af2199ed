//! Confluence storage-format parsing and extraction.
//!
//! Page bodies are XHTML fragments with `ac:`/`ri:` elements. They are
//! parsed into a [`TreeNode`] tree under a synthetic root; malformed input
//! never raises and yields `None` or empty results instead.

mod entities;
mod extract;
mod parser;
mod serializer;
mod table;
mod tree;

use tracing::debug;

pub use extract::{
    Heading, MacroBlock, extract_headers, extract_heading_section, extract_macro_contents,
    extract_macros, extract_tables, extract_titles,
};
pub use serializer::{serialize_element, serialize_elements};
pub use table::{KeyValueTable, find_table_value};
pub use tree::{AC_NAMESPACE, Namespace, RI_NAMESPACE, StorageNamespaces, TreeNode, normalize_text};

/// A parsed page body.
#[derive(Debug, Clone)]
pub struct StorageTree {
    root: TreeNode,
    namespaces: StorageNamespaces,
}

impl StorageTree {
    /// Parse `raw`; `None` when it is absent, blank or malformed.
    #[must_use]
    pub fn parse(raw: Option<&str>, namespaces: &StorageNamespaces) -> Option<Self> {
        let raw = raw.filter(|raw| !raw.trim().is_empty())?;
        match parser::parse_fragment(raw, namespaces) {
            Ok(root) => Some(Self {
                root,
                namespaces: namespaces.clone(),
            }),
            Err(e) => {
                debug!(error = %e, "Discarding malformed storage markup");
                None
            }
        }
    }

    /// The synthetic root element.
    #[must_use]
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Namespaces the tree was parsed with.
    #[must_use]
    pub fn namespaces(&self) -> &StorageNamespaces {
        &self.namespaces
    }
}
