//! Element tree for parsed storage-format markup.

/// Content vocabulary namespace (`ac:` prefix).
pub const AC_NAMESPACE: &str = "http://www.atlassian.com/schema/confluence/4/ac/";

/// Resource-identifier vocabulary namespace (`ri:` prefix).
pub const RI_NAMESPACE: &str = "http://www.atlassian.com/schema/confluence/4/ri/";

/// A namespace prefix bound to its URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Prefix used in the markup (`ac`).
    pub prefix: String,
    /// Namespace URI.
    pub uri: String,
}

impl Namespace {
    /// Bind `prefix` to `uri`.
    #[must_use]
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }

    /// `{uri}local`, the fully-qualified spelling.
    fn qualified(&self, local: &str) -> String {
        format!("{{{}}}{local}", self.uri)
    }

    /// `prefix:local`, the prefixed spelling.
    fn prefixed(&self, local: &str) -> String {
        format!("{}:{local}", self.prefix)
    }
}

/// The two custom vocabularies declared on the synthetic root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNamespaces {
    /// Macro and layout elements.
    pub content: Namespace,
    /// Links to pages, users and attachments.
    pub resource: Namespace,
}

impl Default for StorageNamespaces {
    fn default() -> Self {
        Self {
            content: Namespace::new("ac", AC_NAMESPACE),
            resource: Namespace::new("ri", RI_NAMESPACE),
        }
    }
}

/// Node in the parsed tree.
///
/// Mirrors the element/text/tail model: `text` precedes the first child,
/// `tail` follows this element's end tag inside its parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    /// Element tag as written (`p`, `ac:structured-macro`).
    pub tag: String,
    /// Text before the first child.
    pub text: String,
    /// Text after the element.
    pub tail: String,
    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,
    /// Child elements.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a node with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set tail content.
    #[must_use]
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    /// Append an attribute.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }

    /// Tag without namespace prefix or `{uri}` qualifier.
    #[must_use]
    pub fn local_name(&self) -> &str {
        let tag = self.tag.rsplit_once('}').map_or(self.tag.as_str(), |(_, l)| l);
        tag.rsplit_once(':').map_or(tag, |(_, l)| l)
    }

    /// True for an unqualified element whose local name matches, ignoring case.
    #[must_use]
    pub fn is_html(&self, name: &str) -> bool {
        !self.tag.contains(':') && !self.tag.starts_with('{') && self.tag.eq_ignore_ascii_case(name)
    }

    /// True when the tag is `local` in namespace `ns`, under either spelling.
    #[must_use]
    pub fn is_element(&self, ns: &Namespace, local: &str) -> bool {
        self.tag == ns.prefixed(local) || self.tag == ns.qualified(local)
    }

    /// Heading level for `h1`..`h6`.
    #[must_use]
    pub fn heading_level(&self) -> Option<u8> {
        let name = self.local_name().as_bytes();
        match name {
            [b'h' | b'H', level @ b'1'..=b'6'] => Some(*level - b'0'),
            _ => None,
        }
    }

    /// Attribute value by exact key.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Namespaced attribute: `{uri}local`, then `prefix:local`, then `local`.
    #[must_use]
    pub fn qualified_attr(&self, ns: &Namespace, local: &str) -> Option<&str> {
        self.attr(&ns.qualified(local))
            .or_else(|| self.attr(&ns.prefixed(local)))
            .or_else(|| self.attr(local))
    }

    /// Concatenated text of this element and all descendants, excluding own tail.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
            out.push_str(&child.tail);
        }
    }

    /// Whitespace-collapsed text content.
    #[must_use]
    pub fn normalized_text(&self) -> String {
        normalize_text(&self.text_content())
    }

    /// Pre-order iterator over this node and every descendant.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Collapse runs of whitespace to single spaces and trim the ends.
#[must_use]
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
