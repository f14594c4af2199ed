//! Sections, macros, tables and headings pulled out of a parsed page.

use std::collections::BTreeMap;

use docket_refs::{IssueReferences, resolve_references};
use serde::Serialize;

use super::StorageTree;
use super::serializer::{serialize_element, serialize_elements};
use super::table::KeyValueTable;
use super::tree::{TreeNode, normalize_text};

/// One structured macro on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroBlock {
    /// Macro name as written.
    pub name: String,
    /// Parameters by lower-cased name; the last duplicate wins.
    pub params: BTreeMap<String, String>,
    /// Ticket keys and queries found in the parameters.
    #[serde(skip_serializing_if = "IssueReferences::is_empty")]
    pub references: IssueReferences,
    /// Serialized markup of the macro element.
    #[serde(skip)]
    pub raw: String,
}

impl MacroBlock {
    /// Case-insensitive name comparison.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// A heading and its level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// 1 through 6.
    pub level: u8,
    /// Whitespace-collapsed heading text.
    pub text: String,
}

impl StorageTree {
    /// Markup of the first heading matching `title` and its following
    /// siblings, up to the next heading of any level.
    ///
    /// Parents are visited in document order and each parent's children
    /// scanned left to right. Matching collapses whitespace and ignores case.
    #[must_use]
    pub fn heading_section(&self, title: &str) -> Option<String> {
        let wanted = normalize_text(title).to_lowercase();

        for parent in self.root.iter() {
            for (index, child) in parent.children.iter().enumerate() {
                if child.heading_level().is_none()
                    || child.normalized_text().to_lowercase() != wanted
                {
                    continue;
                }
                let following = parent.children[index + 1..]
                    .iter()
                    .take_while(|sibling| sibling.heading_level().is_none());
                return Some(serialize_elements(std::iter::once(child).chain(following)));
            }
        }
        None
    }

    /// Serialized markup of every macro named `name` (case-insensitive).
    #[must_use]
    pub fn macro_markup(&self, name: &str) -> Vec<String> {
        let wanted = name.trim().to_lowercase();
        self.macro_nodes()
            .filter(|(macro_name, _)| macro_name.to_lowercase() == wanted)
            .map(|(_, node)| serialize_element(node, false))
            .collect()
    }

    /// Every `structured-macro` descendant that carries a name.
    fn macro_nodes(&self) -> impl Iterator<Item = (&str, &TreeNode)> {
        let ns = &self.namespaces.content;
        self.root
            .iter()
            .filter(move |node| node.is_element(ns, "structured-macro"))
            .filter_map(move |node| {
                node.qualified_attr(ns, "name")
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name, node))
            })
    }

    fn macro_params(&self, node: &TreeNode) -> BTreeMap<String, String> {
        let ns = &self.namespaces.content;
        let mut params = BTreeMap::new();
        for param in node.children.iter().filter(|c| c.is_element(ns, "parameter")) {
            let Some(key) = param.qualified_attr(ns, "name") else {
                continue;
            };
            let key = key.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            // Line breaks separate ticket keys, so only the ends are trimmed.
            params.insert(key, param.text_content().trim().to_owned());
        }
        params
    }
}

/// Markup of the first section titled `title`, or `None` when absent or
/// when `raw` does not parse.
#[must_use]
pub fn extract_heading_section(raw: &str, title: &str) -> Option<String> {
    StorageTree::parse(Some(raw), &super::StorageNamespaces::default())?.heading_section(title)
}

/// Markup of every macro named `name`; empty when `raw` does not parse.
#[must_use]
pub fn extract_macro_contents(raw: &str, name: &str) -> Vec<String> {
    StorageTree::parse(Some(raw), &super::StorageNamespaces::default())
        .map(|tree| tree.macro_markup(name))
        .unwrap_or_default()
}

/// All named macros with parameters and resolved references.
#[must_use]
pub fn extract_macros(tree: &StorageTree) -> Vec<MacroBlock> {
    tree.macro_nodes()
        .map(|(name, node)| {
            let params = tree.macro_params(node);
            MacroBlock {
                name: name.to_owned(),
                references: resolve_references(&params),
                params,
                raw: serialize_element(node, false),
            }
        })
        .collect()
}

/// Key/value tables with at least one qualifying row.
#[must_use]
pub fn extract_tables(tree: &StorageTree) -> Vec<KeyValueTable> {
    tree.root
        .iter()
        .filter(|node| node.is_html("table"))
        .map(KeyValueTable::from_node)
        .filter(|table| !table.is_empty())
        .collect()
}

/// Text of level-1 headings.
#[must_use]
pub fn extract_titles(tree: &StorageTree) -> Vec<String> {
    extract_headers(tree)
        .into_iter()
        .filter(|heading| heading.level == 1)
        .map(|heading| heading.text)
        .collect()
}

/// Every heading in document order.
#[must_use]
pub fn extract_headers(tree: &StorageTree) -> Vec<Heading> {
    tree.root
        .iter()
        .filter_map(|node| {
            node.heading_level().map(|level| Heading {
                level,
                text: node.normalized_text(),
            })
        })
        .filter(|heading| !heading.text.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::storage::StorageNamespaces;

    fn tree(raw: &str) -> StorageTree {
        StorageTree::parse(Some(raw), &StorageNamespaces::default()).unwrap()
    }

    const PAGE: &str = concat!(
        "<h1>Overview</h1><p>text</p><h2>Details</h2><p>more</p>",
        r#"<ac:structured-macro ac:name="jira" ac:schema-version="1">"#,
        r#"<ac:parameter ac:name="key">proj-5; PROJ-6</ac:parameter>"#,
        "</ac:structured-macro>",
    );

    #[test]
    fn test_section_stops_at_next_heading() {
        assert_eq!(
            extract_heading_section(PAGE, "Overview"),
            Some("<h1>Overview</h1><p>text</p>".to_owned())
        );
    }

    #[test]
    fn test_section_matching_ignores_case_and_spacing() {
        let raw = "<h2>  Release\n <em>Notes</em></h2><p>a</p>\n<p>b</p><h3>Next</h3>";
        assert_eq!(
            extract_heading_section(raw, "release notes"),
            Some("<h2>  Release\n <em>Notes</em></h2><p>a</p>\n<p>b</p>".to_owned())
        );
    }

    #[test]
    fn test_section_runs_to_end_of_parent() {
        let raw = "<div><h3>Scope</h3><p>in</p></div><p>out</p>";
        assert_eq!(
            extract_heading_section(raw, "Scope"),
            Some("<h3>Scope</h3><p>in</p>".to_owned())
        );
    }

    #[test]
    fn test_section_first_match_wins() {
        let raw = "<h1>Notes</h1><p>first</p><h1>Notes</h1><p>second</p>";
        assert_eq!(
            extract_heading_section(raw, "Notes"),
            Some("<h1>Notes</h1><p>first</p>".to_owned())
        );
    }

    #[test]
    fn test_section_not_found() {
        assert_eq!(extract_heading_section(PAGE, "Missing"), None);
    }

    #[test]
    fn test_section_extraction_is_idempotent() {
        let raw = r#"<h1 class="x" id="y">A &amp; B</h1><p>one<br/>two</p><table><tr><td>k</td></tr></table>"#;
        let first = extract_heading_section(raw, "a & b").unwrap();
        let second = extract_heading_section(raw, "a & b").unwrap();
        assert_eq!(first, second);
        assert_eq!(extract_heading_section(&first, "a & b"), Some(first.clone()));
    }

    #[test]
    fn test_malformed_input_degrades() {
        for raw in ["", "   ", "<p>unclosed", "<p><b></p></b>", "</div>"] {
            assert_eq!(extract_heading_section(raw, "Overview"), None);
            assert!(extract_macro_contents(raw, "jira").is_empty());
            assert!(StorageTree::parse(Some(raw), &StorageNamespaces::default()).is_none());
        }
        assert!(StorageTree::parse(None, &StorageNamespaces::default()).is_none());
    }

    #[test]
    fn test_macro_contents_by_name() {
        let raw = concat!(
            r#"<ac:structured-macro ac:name="JIRA"><ac:parameter ac:name="key">A-1</ac:parameter></ac:structured-macro>"#,
            r#"<p><ac:structured-macro ac:name="info"><ac:rich-text-body><p>x</p></ac:rich-text-body></ac:structured-macro></p>"#,
        );
        assert_eq!(
            extract_macro_contents(raw, "jira"),
            vec![r#"<ac:structured-macro ac:name="JIRA"><ac:parameter ac:name="key">A-1</ac:parameter></ac:structured-macro>"#]
        );
        assert_eq!(extract_macro_contents(raw, "info").len(), 1);
        assert!(extract_macro_contents(raw, "code").is_empty());
    }

    #[test]
    fn test_jira_macro_references() {
        let macros = extract_macros(&tree(PAGE));

        assert_eq!(macros.len(), 1);
        assert!(macros[0].is_named("Jira"));
        assert_eq!(macros[0].references.issue_keys, vec!["PROJ-5", "PROJ-6"]);
        assert_eq!(macros[0].params.get("key").map(String::as_str), Some("proj-5; PROJ-6"));
    }

    #[test]
    fn test_macro_params_lowercased_and_last_wins() {
        let raw = concat!(
            r#"<ac:structured-macro ac:name="jira">"#,
            r#"<ac:parameter ac:name=" JQL ">project = A</ac:parameter>"#,
            r#"<ac:parameter ac:name="jql"> project = B </ac:parameter>"#,
            r#"<ac:parameter>unnamed</ac:parameter>"#,
            "</ac:structured-macro>",
        );
        let macros = extract_macros(&tree(raw));

        assert_eq!(macros[0].params.len(), 1);
        assert_eq!(macros[0].references.queries, vec!["project = B"]);
    }

    #[test]
    fn test_macro_params_keep_line_breaks() {
        let raw = concat!(
            r#"<ac:structured-macro ac:name="jira">"#,
            "<ac:parameter ac:name=\"issuekeys\">OPS-2\nOPS-3</ac:parameter>",
            "</ac:structured-macro>",
        );
        let macros = extract_macros(&tree(raw));

        assert_eq!(
            macros[0].params.get("issuekeys").map(String::as_str),
            Some("OPS-2\nOPS-3")
        );
        assert_eq!(macros[0].references.issue_keys, vec!["OPS-2", "OPS-3"]);
    }

    #[test]
    fn test_nested_macro_params_not_inherited() {
        let raw = concat!(
            r#"<ac:structured-macro ac:name="expand"><ac:rich-text-body>"#,
            r#"<ac:structured-macro ac:name="jira"><ac:parameter ac:name="key">OPS-9</ac:parameter></ac:structured-macro>"#,
            "</ac:rich-text-body></ac:structured-macro>",
        );
        let macros = extract_macros(&tree(raw));

        assert_eq!(macros.len(), 2);
        assert_eq!(macros[0].name, "expand");
        assert!(macros[0].params.is_empty());
        assert_eq!(macros[1].references.issue_keys, vec!["OPS-9"]);
    }

    #[test]
    fn test_tables_skip_header_rows_and_drop_empty_tables() {
        let raw = concat!(
            "<table><tbody><tr><th>Key</th><th>Value</th></tr>",
            "<tr><td>Owner</td><td>SRE</td></tr></tbody></table>",
            "<table><tr><th>Only</th><th>Headers</th></tr></table>",
        );
        let tables = extract_tables(&tree(raw));

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].get("owner"), Some("SRE"));
    }

    #[test]
    fn test_titles_only_level_one() {
        let t = tree("<h1>Top</h1><h2>Sub</h2><div><h1> Nested  top </h1></div>");

        assert_eq!(extract_titles(&t), vec!["Top", "Nested top"]);
        assert_eq!(
            extract_headers(&t),
            vec![
                Heading { level: 1, text: "Top".to_owned() },
                Heading { level: 2, text: "Sub".to_owned() },
                Heading { level: 1, text: "Nested top".to_owned() },
            ]
        );
    }

    #[test]
    fn test_custom_namespace_prefix() {
        let namespaces = StorageNamespaces {
            content: crate::storage::Namespace::new("wk", "urn:wiki"),
            ..StorageNamespaces::default()
        };
        let raw = r#"<wk:structured-macro wk:name="status"><wk:parameter wk:name="colour">Green</wk:parameter></wk:structured-macro>"#;
        let t = StorageTree::parse(Some(raw), &namespaces).unwrap();

        let macros = extract_macros(&t);
        assert_eq!(macros[0].params.get("colour").map(String::as_str), Some("Green"));
        assert_eq!(t.macro_markup("STATUS").len(), 1);
    }
}
