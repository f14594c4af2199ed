//! Two-column key/value tables.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::tree::{TreeNode, normalize_text};

/// Row containers whose `tr` children belong to the enclosing table.
const ROW_GROUPS: &[&str] = &["thead", "tbody", "tfoot"];

/// A table reduced to first-cell → second-cell entries.
///
/// Keys keep first-seen order. A repeated key accumulates its distinct
/// values in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueTable {
    entries: Vec<(String, Vec<String>)>,
}

impl KeyValueTable {
    /// Build from a `table` element. Rows holding any `th` cell or fewer
    /// than two cells are skipped.
    pub(crate) fn from_node(table: &TreeNode) -> Self {
        let mut kv = Self::default();

        for row in rows(table) {
            let cells: Vec<&TreeNode> = row
                .children
                .iter()
                .filter(|c| c.is_html("td") || c.is_html("th"))
                .collect();
            if cells.len() < 2 || cells.iter().any(|c| c.is_html("th")) {
                continue;
            }
            kv.insert(cells[0].normalized_text(), cells[1].normalized_text());
        }

        kv
    }

    fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no row qualified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// All values for an exact key.
    #[must_use]
    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// First value whose key matches ignoring case and spacing.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let wanted = normalize_key(key);
        self.entries
            .iter()
            .find(|(k, _)| normalize_key(k) == wanted)
            .and_then(|(_, v)| v.first())
            .map(String::as_str)
    }
}

impl Serialize for KeyValueTable {
    /// A single value is written as a string, several as an array.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            match values.as_slice() {
                [single] => map.serialize_entry(key, single)?,
                many => map.serialize_entry(key, many)?,
            }
        }
        map.end()
    }
}

/// First non-empty value for `key` across `tables`, in table order.
#[must_use]
pub fn find_table_value<'a>(tables: &'a [KeyValueTable], key: &str) -> Option<&'a str> {
    tables
        .iter()
        .filter_map(|table| table.get(key))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

fn normalize_key(key: &str) -> String {
    normalize_text(key).to_lowercase()
}

/// Direct `tr` children, then `tr` children of row groups, in document order.
fn rows(table: &TreeNode) -> impl Iterator<Item = &TreeNode> {
    table.children.iter().flat_map(|child| {
        let members = if ROW_GROUPS.iter().any(|group| child.is_html(group)) {
            child.children.as_slice()
        } else {
            std::slice::from_ref(child)
        };
        members.iter().filter(|node| node.is_html("tr"))
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn cell(tag: &str, text: &str) -> TreeNode {
        TreeNode::new(tag).with_text(text)
    }

    fn row(cells: Vec<TreeNode>) -> TreeNode {
        TreeNode::new("tr").with_children(cells)
    }

    #[test]
    fn test_header_rows_excluded() {
        let table = TreeNode::new("table").with_children(vec![TreeNode::new("tbody").with_children(vec![
            row(vec![cell("th", "Key"), cell("th", "Value")]),
            row(vec![cell("th", "Owner"), cell("td", "Platform")]),
            row(vec![cell("td", "Team"), cell("td", "SRE")]),
        ])]);

        let kv = KeyValueTable::from_node(&table);
        assert_eq!(kv.len(), 1);
        assert_eq!(kv.values("Team"), Some(&["SRE".to_owned()][..]));
        assert_eq!(kv.values("Owner"), None);
    }

    #[test]
    fn test_short_rows_skipped() {
        let table = TreeNode::new("table").with_children(vec![row(vec![cell("td", "lonely")])]);
        assert!(KeyValueTable::from_node(&table).is_empty());
    }

    #[test]
    fn test_duplicates_accumulate_distinct_values_in_order() {
        let table = TreeNode::new("table").with_children(vec![
            row(vec![cell("td", "Team"), cell("td", "SRE")]),
            row(vec![cell("td", "Team"), cell("td", "Data")]),
            row(vec![cell("td", "Team"), cell("td", "SRE")]),
            row(vec![cell("td", "Team"), cell("td", "Infra")]),
        ]);

        let kv = KeyValueTable::from_node(&table);
        assert_eq!(
            kv.values("Team").unwrap(),
            &["SRE".to_owned(), "Data".to_owned(), "Infra".to_owned()][..]
        );
    }

    #[test]
    fn test_cell_text_normalized_and_extra_cells_ignored() {
        let strong = TreeNode::new("strong").with_text("Related").with_tail("  Team ");
        let table = TreeNode::new("table").with_children(vec![row(vec![
            TreeNode::new("td").with_children(vec![strong]),
            cell("td", " Payments\n "),
            cell("td", "ignored"),
        ])]);

        let kv = KeyValueTable::from_node(&table);
        let entries: Vec<_> = kv.entries().collect();
        assert_eq!(entries, vec![("Related Team", &["Payments".to_owned()][..])]);
    }

    #[test]
    fn test_get_ignores_case_and_spacing() {
        let table = TreeNode::new("table")
            .with_children(vec![row(vec![cell("td", "Related Team/Vertical"), cell("td", "Payments")])]);
        let kv = KeyValueTable::from_node(&table);

        assert_eq!(kv.get("related  team/vertical"), Some("Payments"));
        assert_eq!(kv.get("missing"), None);
    }

    #[test]
    fn test_find_table_value_skips_blank_values() {
        let blank = KeyValueTable::from_node(
            &TreeNode::new("table").with_children(vec![row(vec![cell("td", "Team"), cell("td", " ")])]),
        );
        let filled = KeyValueTable::from_node(
            &TreeNode::new("table").with_children(vec![row(vec![cell("td", "team"), cell("td", "SRE")])]),
        );
        let tables = [blank, filled];

        assert_eq!(find_table_value(&tables, "Team"), Some("SRE"));
    }

    #[test]
    fn test_serialize_single_and_many() {
        let table = TreeNode::new("table").with_children(vec![
            row(vec![cell("td", "Team"), cell("td", "SRE")]),
            row(vec![cell("td", "Tag"), cell("td", "a")]),
            row(vec![cell("td", "Tag"), cell("td", "b")]),
        ]);

        let json = serde_json::to_string(&KeyValueTable::from_node(&table)).unwrap();
        assert_eq!(json, r#"{"Team":"SRE","Tag":["a","b"]}"#);
    }
}
