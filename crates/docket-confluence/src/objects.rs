//! Per-page extraction results.

use serde::Serialize;

use crate::links::page_url;
use crate::storage::{
    Heading, KeyValueTable, MacroBlock, StorageNamespaces, StorageTree, extract_headers,
    extract_macros, extract_tables, extract_titles,
};
use crate::types::Page;

/// Expansions needed to build [`PageContent`] or [`PageObjects`].
pub const PAGE_EXPAND: &[&str] = &["body.storage", "version", "ancestors"];

/// Raw markup of all macros with one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedMacros {
    /// Requested macro name.
    pub name: String,
    /// Serialized markup of each occurrence.
    pub blocks: Vec<String>,
}

/// A heading section and named macro blocks from one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    /// Page ID.
    pub id: String,
    /// Page title.
    pub title: String,
    /// Browser URL.
    pub url: String,
    /// Requested section, when found.
    pub section: Option<String>,
    /// One entry per requested macro name, in request order.
    pub macros: Vec<NamedMacros>,
}

impl PageContent {
    /// Extract `section_title` and every macro in `macro_names` from `page`.
    ///
    /// Blank macro names are skipped. A page without a body yields no
    /// section and no macros.
    #[must_use]
    pub fn from_page(
        base_url: &str,
        page: &Page,
        section_title: Option<&str>,
        macro_names: &[String],
    ) -> Self {
        let mut content = Self {
            id: page.id.clone(),
            title: page.title.clone(),
            url: page_url(base_url, page),
            section: None,
            macros: Vec::new(),
        };

        let Some(tree) = StorageTree::parse(page.storage(), &StorageNamespaces::default()) else {
            return content;
        };

        if let Some(title) = section_title.filter(|t| !t.trim().is_empty()) {
            content.section = tree.heading_section(title);
        }
        content.macros = macro_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(|name| NamedMacros {
                name: name.to_owned(),
                blocks: tree.macro_markup(name),
            })
            .collect();
        content
    }

    /// True when neither a section nor any macro block was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.section.is_none() && self.macros.iter().all(|m| m.blocks.is_empty())
    }
}

/// Titles, headings, tables and macros of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageObjects {
    /// Page ID.
    pub id: String,
    /// Page title.
    pub title: String,
    /// Browser URL.
    pub url: String,
    /// Version number, when expanded.
    pub version: Option<u32>,
    /// Last-modified timestamp, when expanded.
    pub updated: Option<String>,
    /// Ancestor titles from the space root down.
    pub ancestors: Vec<String>,
    /// Level-1 heading text.
    pub titles: Vec<String>,
    /// All headings.
    pub headers: Vec<Heading>,
    /// Key/value tables.
    pub tables: Vec<KeyValueTable>,
    /// Named macros with parameters and references.
    pub macros: Vec<MacroBlock>,
}

impl PageObjects {
    /// Build from `page`. Structure lists are empty when the body is
    /// missing or malformed.
    #[must_use]
    pub fn from_page(base_url: &str, page: &Page) -> Self {
        let tree = StorageTree::parse(page.storage(), &StorageNamespaces::default());

        Self {
            id: page.id.clone(),
            title: page.title.clone(),
            url: page_url(base_url, page),
            version: page.version_number(),
            updated: page.updated_at().map(str::to_owned),
            ancestors: page.ancestors.iter().map(|a| a.title.clone()).collect(),
            titles: tree.as_ref().map(extract_titles).unwrap_or_default(),
            headers: tree.as_ref().map(extract_headers).unwrap_or_default(),
            tables: tree.as_ref().map(extract_tables).unwrap_or_default(),
            macros: tree.as_ref().map(extract_macros).unwrap_or_default(),
        }
    }

    /// Distinct ticket keys from macros named `macro_name`, in page order.
    #[must_use]
    pub fn issue_keys(&self, macro_name: &str) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for key in self
            .macros
            .iter()
            .filter(|m| m.is_named(macro_name))
            .flat_map(|m| &m.references.issue_keys)
        {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Queries from macros named `macro_name`, in page order.
    #[must_use]
    pub fn queries(&self, macro_name: &str) -> Vec<String> {
        self.macros
            .iter()
            .filter(|m| m.is_named(macro_name))
            .flat_map(|m| m.references.queries.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn page(storage: &str) -> Page {
        serde_json::from_value(serde_json::json!({
            "id": "42",
            "title": "Service catalog",
            "version": {"number": 3, "when": "2024-01-02T03:04:05Z"},
            "ancestors": [{"id": "1", "title": "Home"}, {"id": "2", "title": "Ops"}],
            "body": {"storage": {"value": storage}},
            "_links": {"webui": "/display/OPS/Catalog"}
        }))
        .unwrap()
    }

    const BODY: &str = concat!(
        "<h1>Summary</h1><p>Intro</p>",
        "<h2>Owners</h2>",
        "<table><tbody>",
        "<tr><th>Field</th><th>Value</th></tr>",
        "<tr><td>Related Team/Vertical</td><td>Payments</td></tr>",
        "</tbody></table>",
        r#"<ac:structured-macro ac:name="jira"><ac:parameter ac:name="key">ops-1, OPS-2</ac:parameter></ac:structured-macro>"#,
        r#"<ac:structured-macro ac:name="jira"><ac:parameter ac:name="jqlQuery">project = OPS</ac:parameter><ac:parameter ac:name="issuekey">ops-2</ac:parameter></ac:structured-macro>"#,
    );

    #[test]
    fn test_page_objects() {
        let objects = PageObjects::from_page("https://wiki", &page(BODY));

        assert_eq!(objects.url, "https://wiki/display/OPS/Catalog");
        assert_eq!(objects.version, Some(3));
        assert_eq!(objects.ancestors, vec!["Home", "Ops"]);
        assert_eq!(objects.titles, vec!["Summary"]);
        assert_eq!(objects.headers.len(), 2);
        assert_eq!(objects.tables.len(), 1);
        assert_eq!(objects.tables[0].get("related team/vertical"), Some("Payments"));
        assert_eq!(objects.issue_keys("JIRA"), vec!["OPS-1", "OPS-2"]);
        assert_eq!(objects.queries("jira"), vec!["project = OPS"]);
    }

    #[test]
    fn test_page_objects_without_body() {
        let mut page = page("");
        page.body = None;

        let objects = PageObjects::from_page("https://wiki", &page);
        assert!(objects.titles.is_empty());
        assert!(objects.macros.is_empty());
        assert_eq!(objects.title, "Service catalog");
    }

    #[test]
    fn test_page_objects_json_shape() {
        let objects = PageObjects::from_page("https://wiki", &page(BODY));
        let json = serde_json::to_value(&objects).unwrap();

        assert_eq!(json["tables"][0]["Related Team/Vertical"], "Payments");
        assert_eq!(json["macros"][0]["name"], "jira");
        assert_eq!(json["macros"][0]["references"]["issue_keys"][1], "OPS-2");
        assert!(json["macros"][0].get("raw").is_none());
    }

    #[test]
    fn test_page_content() {
        let content = PageContent::from_page(
            "https://wiki",
            &page(BODY),
            Some("summary"),
            &["jira".to_owned(), " ".to_owned(), "code".to_owned()],
        );

        assert_eq!(content.section.as_deref(), Some("<h1>Summary</h1><p>Intro</p>"));
        assert_eq!(content.macros.len(), 2);
        assert_eq!(content.macros[0].blocks.len(), 2);
        assert!(content.macros[1].blocks.is_empty());
        assert!(!content.is_empty());
    }

    #[test]
    fn test_page_content_malformed_body() {
        let content = PageContent::from_page("https://wiki", &page("<p>broken"), Some("Summary"), &["jira".to_owned()]);

        assert!(content.section.is_none());
        assert!(content.macros.is_empty());
        assert!(content.is_empty());
    }
}
