//! Page identifiers and web links.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Page;

static PAGE_ID_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pageId=(\d+)").expect("invalid pageId regex"));

static PAGES_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/pages/(\d+)").expect("invalid pages segment regex"));

/// Page id from a bare id or a page URL.
///
/// Tries a `pageId=` query parameter, then a `/pages/<id>` path segment,
/// then the whole value as digits.
#[must_use]
pub fn extract_page_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Some(caps) = PAGE_ID_PARAM
        .captures(raw)
        .or_else(|| PAGES_SEGMENT.captures(raw))
    {
        return Some(caps[1].to_owned());
    }
    (!raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())).then(|| raw.to_owned())
}

/// Browser URL for a page: `base + _links.webui`, else `base/pages/<id>`.
#[must_use]
pub fn page_url(base_url: &str, page: &Page) -> String {
    let base = base_url.trim_end_matches('/');
    match page.webui().filter(|link| !link.is_empty()) {
        Some(link) => format!("{base}{link}"),
        None => format!("{base}/pages/{}", page.id),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::Links;

    #[test]
    fn test_extract_page_id_forms() {
        assert_eq!(extract_page_id("12345"), Some("12345".to_owned()));
        assert_eq!(
            extract_page_id("https://wiki/pages/viewpage.action?pageId=987"),
            Some("987".to_owned())
        );
        assert_eq!(
            extract_page_id("https://wiki/spaces/OPS/pages/555/Runbook"),
            Some("555".to_owned())
        );
    }

    #[test]
    fn test_page_id_param_checked_before_path() {
        assert_eq!(
            extract_page_id("https://wiki/pages/111?pageId=222"),
            Some("222".to_owned())
        );
    }

    #[test]
    fn test_extract_page_id_no_match() {
        assert_eq!(extract_page_id("https://wiki/display/OPS/Runbook"), None);
        assert_eq!(extract_page_id("12a"), None);
        assert_eq!(extract_page_id(""), None);
    }

    #[test]
    fn test_page_url() {
        let mut page = Page {
            id: "42".to_owned(),
            ..Page::default()
        };
        assert_eq!(page_url("https://wiki/", &page), "https://wiki/pages/42");

        page.links = Some(Links {
            webui: Some("/display/OPS/Runbook".to_owned()),
            ..Links::default()
        });
        assert_eq!(page_url("https://wiki", &page), "https://wiki/display/OPS/Runbook");
    }
}
