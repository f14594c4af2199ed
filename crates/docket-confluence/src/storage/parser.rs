//! Storage-format fragment parser with namespace support.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::entities::{decode_entities, decode_entity};
use super::tree::{StorageNamespaces, TreeNode};
use crate::error::StorageParseError;

/// Parse a markup fragment into a tree under a synthetic `root` element.
///
/// The root declares the content and resource-identifier prefixes, since
/// page bodies use them without declaring them. Unbalanced or mismatched
/// tags are errors.
pub(crate) fn parse_fragment(
    raw: &str,
    namespaces: &StorageNamespaces,
) -> Result<TreeNode, StorageParseError> {
    let wrapped = format!(
        r#"<root xmlns:{}="{}" xmlns:{}="{}">{raw}</root>"#,
        namespaces.content.prefix,
        namespaces.content.uri,
        namespaces.resource.prefix,
        namespaces.resource.uri,
    );

    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let root = loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let node = open_element(&reader, &e)?;
                break parse_element(&mut reader, node)?;
            }
            Event::Eof => return Err(StorageParseError::Unclosed("root".to_owned())),
            _ => {}
        }
        buf.clear();
    };

    // A fragment containing its own `</root>` would close the wrapper early.
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Eof => return Ok(root),
            Event::Comment(_) | Event::PI(_) => {}
            Event::Text(e) if e.iter().all(u8::is_ascii_whitespace) => {}
            _ => return Err(StorageParseError::TrailingContent),
        }
    }
}

/// Read children and text of `node` until its end tag.
fn parse_element<R: BufRead>(
    reader: &mut Reader<R>,
    mut node: TreeNode,
) -> Result<TreeNode, StorageParseError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let child = open_element(reader, &e)?;
                let child = parse_element(reader, child)?;
                node.children.push(child);
            }
            Event::Empty(e) => {
                let child = open_element(reader, &e)?;
                node.children.push(child);
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                append_text(&mut node, &text);
            }
            Event::GeneralRef(e) => {
                let name = reader.decoder().decode(&e)?;
                append_text(&mut node, &decode_entity(&name));
            }
            Event::CData(e) => {
                let text = reader.decoder().decode(&e)?;
                append_text(&mut node, &text);
            }
            // The reader rejects end tags that do not match the open element.
            Event::End(_) => return Ok(node),
            Event::Eof => return Err(StorageParseError::Unclosed(node.tag)),
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }
}

/// Node for a start or empty tag, attributes in document order.
fn open_element<R: BufRead>(
    reader: &Reader<R>,
    e: &BytesStart,
) -> Result<TreeNode, StorageParseError> {
    let decoder = reader.decoder();
    let mut node = TreeNode::new(decoder.decode(e.name().as_ref())?);

    for attr in e.attributes() {
        let attr = attr?;
        let key = decoder.decode(attr.key.as_ref())?.into_owned();
        let value = decode_entities(&decoder.decode(&attr.value)?);
        node.attrs.push((key, value));
    }

    Ok(node)
}

/// Append text to the node's text, or to its last child's tail.
fn append_text(node: &mut TreeNode, text: &str) {
    if let Some(last_child) = node.children.last_mut() {
        last_child.tail.push_str(text);
    } else {
        node.text.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(raw: &str) -> Result<TreeNode, StorageParseError> {
        parse_fragment(raw, &StorageNamespaces::default())
    }

    #[test]
    fn test_parse_simple_element() {
        let tree = parse("<p>Hello</p>").unwrap();

        assert_eq!(tree.tag, "root");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].tag, "p");
        assert_eq!(tree.children[0].text, "Hello");
    }

    #[test]
    fn test_parse_text_and_tail() {
        let tree = parse("<p><strong>Bold</strong> text</p>").unwrap();

        let p = &tree.children[0];
        assert!(p.text.is_empty());
        assert_eq!(p.children[0].tag, "strong");
        assert_eq!(p.children[0].text, "Bold");
        assert_eq!(p.children[0].tail, " text");
    }

    #[test]
    fn test_parse_macro_attributes_in_order() {
        let tree = parse(
            r#"<ac:structured-macro ac:name="jira" ac:schema-version="1"><ac:parameter ac:name="key">OPS-1</ac:parameter></ac:structured-macro>"#,
        )
        .unwrap();

        let node = &tree.children[0];
        assert_eq!(node.tag, "ac:structured-macro");
        assert_eq!(
            node.attrs,
            vec![
                ("ac:name".to_owned(), "jira".to_owned()),
                ("ac:schema-version".to_owned(), "1".to_owned()),
            ]
        );
        assert_eq!(node.children[0].text, "OPS-1");
    }

    #[test]
    fn test_parse_entities() {
        let tree = parse("<p>a &lt; b&nbsp;&mdash;&#65;&unknown;</p>").unwrap();
        assert_eq!(tree.children[0].text, "a < b\u{00a0}\u{2014}A&unknown;");
    }

    #[test]
    fn test_parse_entities_in_attributes() {
        let tree = parse(r#"<a title="Q&amp;A&nbsp;x">t</a>"#).unwrap();
        assert_eq!(tree.children[0].attr("title"), Some("Q&A\u{00a0}x"));
    }

    #[test]
    fn test_parse_cdata() {
        let tree = parse("<ac:plain-text-body><![CDATA[<b>raw</b>]]></ac:plain-text-body>").unwrap();
        assert_eq!(tree.children[0].text, "<b>raw</b>");
    }

    #[test]
    fn test_parse_self_closing() {
        let tree = parse("<p>Before<br />After</p>").unwrap();

        let p = &tree.children[0];
        assert_eq!(p.text, "Before");
        assert_eq!(p.children[0].tag, "br");
        assert_eq!(p.children[0].tail, "After");
    }

    #[test]
    fn test_unclosed_tag_is_error() {
        assert!(parse("<p>never closed").is_err());
    }

    #[test]
    fn test_mismatched_end_tag_is_error() {
        assert!(parse("<p><b>x</p></b>").is_err());
    }

    #[test]
    fn test_stray_end_tag_is_error() {
        assert!(parse("</p>").is_err());
        assert!(parse("<p>x</p></root><p>y</p>").is_err());
    }

    #[test]
    fn test_undeclared_prefix_is_not_an_error() {
        let tree = parse(r#"<ri:page ri:content-title="Home" />"#).unwrap();
        assert_eq!(tree.children[0].attr("ri:content-title"), Some("Home"));
    }
}
