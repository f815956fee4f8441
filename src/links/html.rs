// src/links/html.rs
// =============================================================================
// This module extracts links from HTML pages.
//
// We deliberately do NOT build a DOM here. Archives hold millions of pages,
// many of them with sloppy markup, and all we need are the values of `href`
// and `src` attributes. So we scan the raw text for the markers " href" and
// " src", then read `= "value"` (or single quotes) after them.
//
// Known limitations (kept on purpose, changing them changes results):
// - The attribute name must be preceded by a space and is case-sensitive
// - Escaped quotes inside a value are not understood
// - Markers inside comments or scripts are picked up like any other
//
// Rust concepts:
// - Byte scanning: We walk &[u8] with an index, like a small state machine
// - Option: To represent "no closing quote found"
// =============================================================================

use super::kind::{Link, LinkAttribute};

// The five entities that matter inside attribute values
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("apos", "'"),
    ("quot", "\""),
    ("lt", "<"),
    ("gt", ">"),
];

fn html_entity(name: &str) -> Option<&'static str> {
    HTML_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|(_, decoded)| *decoded)
}

// Decodes the five basic HTML entities
//
// Anything else between '&' and ';' is copied unchanged, and so is an '&'
// that is never closed by a ';'.
//
// Example:
//   "a&amp;b&nbsp;c" -> "a&b&nbsp;c"
pub fn decode_html_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    // Byte offset of the '&' that opened the pending span, if any
    let mut pending: Option<usize> = None;

    for (i, c) in text.char_indices() {
        match (c, pending) {
            ('&', Some(start)) => {
                result.push_str(&text[start..i]);
                pending = Some(i);
            }
            ('&', None) => pending = Some(i),
            (';', Some(start)) => {
                match html_entity(&text[start + 1..i]) {
                    Some(decoded) => result.push_str(decoded),
                    None => result.push_str(&text[start..=i]),
                }
                pending = None;
            }
            (_, Some(_)) => {}
            (_, None) => result.push(c),
        }
    }

    if let Some(start) = pending {
        result.push_str(&text[start..]);
    }

    result
}

fn skip_whitespace(bytes: &[u8], mut p: usize) -> usize {
    while p < bytes.len() && bytes[p].is_ascii_whitespace() {
        p += 1;
    }
    p
}

// Extracts every href/src value from a page, in document order
//
// Parameters:
//   markup: the raw page text (borrowed as &str)
//
// Returns: Vec<Link>, each already classified (see kind.rs)
//
// Example:
//   "<a href='foo.html'>x</a><img src=\"a.png\">"
//   -> [Link(href, "foo.html"), Link(src, "a.png")]
pub fn generic_get_links(markup: &str) -> Vec<Link> {
    let bytes = markup.as_bytes();
    let mut links = Vec::new();
    let mut p = 0;

    while p < bytes.len() {
        let rest = &bytes[p..];
        let attribute = if rest.starts_with(b" href") {
            p += 5;
            LinkAttribute::Href
        } else if rest.starts_with(b" src") {
            p += 4;
            LinkAttribute::Src
        } else {
            p += 1;
            continue;
        };

        p = skip_whitespace(bytes, p);
        if bytes.get(p) != Some(&b'=') {
            continue;
        }
        p = skip_whitespace(bytes, p + 1);

        let delimiter = match bytes.get(p) {
            Some(&quote @ (b'\'' | b'"')) => quote,
            _ => continue,
        };
        let value_start = p + 1;

        // An unterminated value swallows the rest of the page: nothing more
        // can be extracted after it
        let Some(length) = bytes[value_start..].iter().position(|&b| b == delimiter) else {
            break;
        };
        let value_end = value_start + length;

        links.push(Link::new(
            attribute,
            decode_html_entities(&markup[value_start..value_end]),
        ));
        p = value_end + 1;
    }

    links
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why index into bytes instead of iterating over chars?
//    - All the markers we look for (" href", "=", quotes) are ASCII
//    - An ASCII byte can never be part of a multi-byte UTF-8 character,
//      so slicing the &str at those positions is always valid
//
// 2. What does `Some(&quote @ (b'\'' | b'"'))` mean?
//    - It matches a byte that is either quote character
//    - `quote @` binds the matched byte to a variable at the same time
//
// 3. What is `let ... else`?
//    - Destructures a value, and runs the else block (which must exit the
//      current scope) when the pattern does not match
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::kind::UriKind;

    #[test]
    fn test_decode_known_entities() {
        assert_eq!(decode_html_entities("&amp;&lt;&gt;&quot;&apos;"), "&<>\"'");
        assert_eq!(decode_html_entities("a&amp;b"), "a&b");
    }

    #[test]
    fn test_decode_keeps_unknown_entities() {
        assert_eq!(decode_html_entities("&unknown;"), "&unknown;");
        assert_eq!(decode_html_entities("a & b"), "a & b");
        assert_eq!(decode_html_entities("&&amp;"), "&&");
        assert_eq!(decode_html_entities("x&amp"), "x&amp");
        assert_eq!(decode_html_entities("café &gt; thé"), "café > thé");
    }

    #[test]
    fn test_extract_links_in_document_order() {
        let html = "<a href='foo.html'>x</a><img src=\"../img/a.png\">";
        let links = generic_get_links(html);

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].attribute(), LinkAttribute::Href);
        assert_eq!(links[0].target(), "foo.html");
        assert_eq!(links[0].kind(), UriKind::Other);
        assert_eq!(links[1].attribute(), LinkAttribute::Src);
        assert_eq!(links[1].target(), "../img/a.png");
        assert_eq!(links[1].kind(), UriKind::Other);
    }

    #[test]
    fn test_extract_tolerates_spacing_and_entities() {
        let html = r#"<a href = "a.html?x=1&amp;y=2">a</a><a  href="">e</a>"#;
        let links = generic_get_links(html);
        let targets: Vec<&str> = links.iter().map(|l| l.target()).collect();
        assert_eq!(targets, vec!["a.html?x=1&y=2", ""]);
    }

    #[test]
    fn test_extract_skips_non_attributes() {
        // No '=' after the marker, unquoted value, lookalike attribute names
        let html = r#"<p> href is a word</p><a href=bare.html><link hreflang="en"><img srcset="a.png 2x">"#;
        assert!(generic_get_links(html).is_empty());
    }

    #[test]
    fn test_extract_requires_leading_space() {
        let html = "<a\thref=\"tab.html\"><a HREF=\"upper.html\"><a href=\"ok.html\">";
        let links = generic_get_links(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target(), "ok.html");
    }

    #[test]
    fn test_value_runs_to_the_next_matching_quote() {
        let html = r#"<a href="ok.html"><a href="broken.html><a href="never.html">"#;
        let links = generic_get_links(html);
        let targets: Vec<&str> = links.iter().map(|l| l.target()).collect();
        assert_eq!(targets, vec!["ok.html", "broken.html><a href="]);
    }

    #[test]
    fn test_unterminated_value_stops_scan() {
        // No closing quote after src=" anywhere in the rest of the page
        let html = r#"<a href="ok.html"><img src="x.png><a href="#;
        let links = generic_get_links(html);
        let targets: Vec<&str> = links.iter().map(|l| l.target()).collect();
        assert_eq!(targets, vec!["ok.html"]);

        let html = r#"<a href="ok.html"><img src='x.png>"#;
        assert_eq!(generic_get_links(html).len(), 1);
    }
}
