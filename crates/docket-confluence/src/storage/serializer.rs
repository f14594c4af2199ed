//! Storage-format serializer.

use std::fmt::Write;

use super::tree::TreeNode;

/// Serialize one element, optionally followed by its tail text.
///
/// `plain-text-body` content is written back as CDATA so code and
/// no-format macros keep their original form.
#[must_use]
pub fn serialize_element(node: &TreeNode, with_tail: bool) -> String {
    let mut out = String::with_capacity(256);
    write_node(node, &mut out);
    if with_tail {
        escape_into(&node.tail, false, &mut out);
    }
    out
}

/// Serialize a sequence of elements, each with its tail, without separators.
#[must_use]
pub fn serialize_elements<'a, I>(nodes: I) -> String
where
    I: IntoIterator<Item = &'a TreeNode>,
{
    nodes
        .into_iter()
        .map(|node| serialize_element(node, true))
        .collect()
}

fn write_node(node: &TreeNode, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag);

    for (key, value) in &node.attrs {
        let _ = write!(out, r#" {key}=""#);
        escape_into(value, true, out);
        out.push('"');
    }

    if node.children.is_empty() && node.text.is_empty() {
        out.push_str(" />");
        return;
    }

    out.push('>');
    if node.local_name() == "plain-text-body" && !node.text.contains("]]>") {
        let _ = write!(out, "<![CDATA[{}]]>", node.text);
    } else {
        escape_into(&node.text, false, out);
    }

    for child in &node.children {
        write_node(child, out);
        escape_into(&child.tail, false, out);
    }

    let _ = write!(out, "</{}>", node.tag);
}

fn escape_into(text: &str, escape_quotes: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if escape_quotes => out.push_str("&quot;"),
            '\n' if escape_quotes => out.push_str("&#10;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_serialize_with_children_and_tail() {
        let strong = TreeNode::new("strong").with_text("Bold").with_tail(" text");
        let p = TreeNode::new("p")
            .with_children(vec![strong])
            .with_tail("\n");

        assert_eq!(serialize_element(&p, false), "<p><strong>Bold</strong> text</p>");
        assert_eq!(serialize_element(&p, true), "<p><strong>Bold</strong> text</p>\n");
    }

    #[test]
    fn test_serialize_self_closing() {
        let p = TreeNode::new("p")
            .with_text("Before")
            .with_children(vec![TreeNode::new("br").with_tail("After")]);

        assert_eq!(serialize_element(&p, false), "<p>Before<br />After</p>");
    }

    #[test]
    fn test_serialize_attributes_in_order_and_escaped() {
        let node = TreeNode::new("ac:parameter")
            .with_attr("ac:name", "title")
            .with_attr("data-x", r#"say "hi" & <go>"#)
            .with_text("x");

        assert_eq!(
            serialize_element(&node, false),
            r#"<ac:parameter ac:name="title" data-x="say &quot;hi&quot; &amp; &lt;go&gt;">x</ac:parameter>"#
        );
    }

    #[test]
    fn test_escape_text() {
        let p = TreeNode::new("p").with_text("a < b & c > d");
        assert_eq!(serialize_element(&p, false), "<p>a &lt; b &amp; c &gt; d</p>");
    }

    #[test]
    fn test_plain_text_body_written_as_cdata() {
        let body = TreeNode::new("ac:plain-text-body").with_text("<code> & more");
        assert_eq!(
            serialize_element(&body, false),
            "<ac:plain-text-body><![CDATA[<code> & more]]></ac:plain-text-body>"
        );
    }

    #[test]
    fn test_serialize_elements_concatenates() {
        let nodes = [
            TreeNode::new("h1").with_text("A"),
            TreeNode::new("p").with_text("b").with_tail(" "),
        ];
        assert_eq!(serialize_elements(&nodes), "<h1>A</h1><p>b</p> ");
    }
}
