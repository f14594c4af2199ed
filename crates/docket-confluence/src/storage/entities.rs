//! Entity reference decoding.
//!
//! Storage markup is XHTML, so besides the five XML entities and numeric
//! references it routinely carries HTML named entities such as `&nbsp;`.
//! Unknown names are kept literally.

/// Decode the body of one entity reference (`amp`, `#160`, `#xA0`, `nbsp`).
pub fn decode_entity(name: &str) -> String {
    resolve(name).unwrap_or_else(|| format!("&{name};"))
}

/// Decode every `&name;` reference in an attribute value.
pub fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find(';') {
            Some(end) if end > 0 && !after[..end].contains(['&', ' ']) => {
                out.push_str(&decode_entity(&after[..end]));
                rest = &after[end + 1..];
            }
            _ => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve(name: &str) -> Option<String> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => numeric.parse::<u32>().ok(),
        };
        return code.and_then(char::from_u32).map(String::from);
    }
    named(name).map(String::from)
}

fn named(name: &str) -> Option<&'static str> {
    Some(match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",

        "nbsp" => "\u{00a0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "zwnj" => "\u{200c}",
        "zwj" => "\u{200d}",
        "shy" => "\u{00ad}",

        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "bdquo" => "\u{201e}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "sbquo" => "\u{201a}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "bull" => "\u{2022}",
        "hellip" => "\u{2026}",
        "middot" => "\u{00b7}",
        "prime" => "\u{2032}",
        "Prime" => "\u{2033}",

        "rarr" => "\u{2192}",
        "larr" => "\u{2190}",
        "harr" => "\u{2194}",
        "uarr" => "\u{2191}",
        "darr" => "\u{2193}",
        "rArr" => "\u{21d2}",
        "lArr" => "\u{21d0}",
        "hArr" => "\u{21d4}",

        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        "ne" => "\u{2260}",
        "asymp" => "\u{2248}",
        "plusmn" => "\u{00b1}",
        "times" => "\u{00d7}",
        "divide" => "\u{00f7}",
        "minus" => "\u{2212}",
        "infin" => "\u{221e}",

        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",

        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "yen" => "\u{00a5}",
        "cent" => "\u{00a2}",

        "deg" => "\u{00b0}",
        "para" => "\u{00b6}",
        "sect" => "\u{00a7}",
        "dagger" => "\u{2020}",
        "Dagger" => "\u{2021}",
        "iexcl" => "\u{00a1}",
        "iquest" => "\u{00bf}",
        "frac14" => "\u{00bc}",
        "frac12" => "\u{00bd}",
        "frac34" => "\u{00be}",
        "sup1" => "\u{00b9}",
        "sup2" => "\u{00b2}",
        "sup3" => "\u{00b3}",
        "micro" => "\u{00b5}",
        "check" => "\u{2713}",

        "auml" => "\u{00e4}",
        "ouml" => "\u{00f6}",
        "uuml" => "\u{00fc}",
        "Auml" => "\u{00c4}",
        "Ouml" => "\u{00d6}",
        "Uuml" => "\u{00dc}",
        "szlig" => "\u{00df}",
        "eacute" => "\u{00e9}",
        "egrave" => "\u{00e8}",
        "aacute" => "\u{00e1}",
        "agrave" => "\u{00e0}",
        "ccedil" => "\u{00e7}",
        "ntilde" => "\u{00f1}",

        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_decode_xml_entities() {
        assert_eq!(decode_entity("lt"), "<");
        assert_eq!(decode_entity("amp"), "&");
        assert_eq!(decode_entity("quot"), "\"");
    }

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(decode_entity("nbsp"), "\u{00a0}");
        assert_eq!(decode_entity("mdash"), "\u{2014}");
    }

    #[test]
    fn test_decode_numeric_references() {
        assert_eq!(decode_entity("#160"), "\u{00a0}");
        assert_eq!(decode_entity("#x2014"), "\u{2014}");
        assert_eq!(decode_entity("#X41"), "A");
    }

    #[test]
    fn test_unknown_entity_kept_literally() {
        assert_eq!(decode_entity("bogus"), "&bogus;");
        assert_eq!(decode_entity("#xZZ"), "&#xZZ;");
    }

    #[test]
    fn test_decode_entities_in_attribute_value() {
        assert_eq!(decode_entities("a&amp;b&nbsp;c"), "a&b\u{00a0}c");
        assert_eq!(decode_entities("Q&A; fine"), "Q&A; fine");
        assert_eq!(decode_entities("tom & jerry"), "tom & jerry");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }
}
