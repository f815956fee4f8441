// src/links/kind.rs
// =============================================================================
// This module classifies link targets.
//
// A link found in a page can point to very different things:
// - another entry of the same archive ("../wiki/Rust.html", "/img/a.png")
// - a network resource ("https://example.com", "//cdn.example.com/x.js")
// - something that is not a location at all ("mailto:", "javascript:", "data:")
//
// We classify a target once, when the Link is built, by looking at the first
// URI delimiter it contains. No URL parser is involved: relative archive paths
// are not valid URLs and must still be recognised.
//
// Rust concepts:
// - Enums: A closed set of link kinds
// - Copy types: UriKind is a plain tag, cheap to copy around
// - Slices of tuples: A tiny constant lookup table
// =============================================================================

use serde::Serialize;

/// What kind of resource a link target designates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UriKind {
    // Special URIs without authority that are valid in HTML
    Javascript, // javascript:...
    Mailto,     // mailto:user@example.com
    Tel,        // tel:+0123456789
    Sip,        // sip:1-999-123-4567@voip-provider.example.net
    Geo,        // geo:12.34,56.78
    Data,       // data:image/png;base64,...
    Xmpp,       // xmpp:user@example.org
    News,       // news:comp.os.linux.announce
    Urn,        // urn:nbn:de:bsz:24-digibib-bsz3530416370

    /// `<scheme>://...`, has a network authority
    GenericUri,
    /// `//<host>/<path>`, inherits the scheme of the page
    ProtocolRelative,
    /// Not a URI; a relative or absolute path inside the archive
    Other,
}

// Schemes that carry no authority, matched against the lower-cased scheme
const SPECIAL_SCHEMES: &[(&str, UriKind)] = &[
    ("javascript", UriKind::Javascript),
    ("mailto", UriKind::Mailto),
    ("tel", UriKind::Tel),
    ("sip", UriKind::Sip),
    ("geo", UriKind::Geo),
    ("data", UriKind::Data),
    ("xmpp", UriKind::Xmpp),
    ("news", UriKind::News),
    ("urn", UriKind::Urn),
];

const URI_DELIMITERS: [char; 4] = [':', '/', '?', '#'];

/// Classifies a raw link target.
///
/// Only the first of `:`, `/`, `?`, `#` decides: anything but a `:` there
/// means the target is a path.
pub fn detect_uri_kind(target: &str) -> UriKind {
    let colon = match target.find(URI_DELIMITERS) {
        Some(k) if target.as_bytes()[k] == b':' => k,
        _ => {
            return if target.starts_with("//") {
                UriKind::ProtocolRelative
            } else {
                UriKind::Other
            };
        }
    };

    if target[colon + 1..].starts_with("//") {
        return UriKind::GenericUri;
    }

    let scheme = target[..colon].to_ascii_lowercase();
    SPECIAL_SCHEMES
        .iter()
        .find(|(name, _)| *name == scheme)
        .map(|(_, kind)| *kind)
        .unwrap_or(UriKind::Other)
}

/// The attribute a link was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkAttribute {
    Href,
    Src,
}

impl LinkAttribute {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkAttribute::Href => "href",
            LinkAttribute::Src => "src",
        }
    }
}

/// A link extracted from a page.
///
/// The kind is computed when the link is built and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Link {
    attribute: LinkAttribute,
    target: String,
    kind: UriKind,
}

impl Link {
    pub fn new(attribute: LinkAttribute, target: impl Into<String>) -> Self {
        let target = target.into();
        let kind = detect_uri_kind(&target);
        Link {
            attribute,
            target,
            kind,
        }
    }

    pub fn attribute(&self) -> LinkAttribute {
        self.attribute
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> UriKind {
        self.kind
    }

    /// Points outside the archive (everything but paths and inline data).
    pub fn is_external_url(&self) -> bool {
        !matches!(self.kind, UriKind::Other | UriKind::Data)
    }

    /// Points to an entry of the archive.
    pub fn is_internal_url(&self) -> bool {
        self.kind == UriKind::Other
    }
}
