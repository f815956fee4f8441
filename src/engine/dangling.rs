// src/engine/dangling.rs
// =============================================================================
// This module resolves internal links once every entry has been scanned.
//
// Workers only normalize links; they cannot tell whether the target exists
// without a complete path index. After the scan, every queued link is looked
// up, and the unresolved ones are grouped:
// - one group per (source page, normalized target)
// - each group remembers every raw spelling that led there
//
// So a page linking to "B.html", "./B.html" and "B.html#top" yields a single
// finding listing the three spellings.
// =============================================================================

use std::collections::{BTreeMap, BTreeSet, HashSet};

/// An in-bounds internal link waiting to be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalLink {
    /// Path of the page containing the link
    pub source: String,
    /// Archive path the link resolves to
    pub normalized: String,
    /// The link exactly as written in the page
    pub raw: String,
}

/// Every normalized target of one page that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingGroup {
    pub source: String,
    pub normalized: String,
    /// Distinct raw spellings, sorted
    pub links: Vec<String>,
}

/// Returns the unresolved links grouped per (source, normalized target),
/// sorted by source then target.
pub fn find_dangling_links(
    links: impl IntoIterator<Item = InternalLink>,
    index: &HashSet<String>,
) -> Vec<DanglingGroup> {
    let mut groups: BTreeMap<(String, String), BTreeSet<String>> = BTreeMap::new();

    for link in links {
        if index.contains(&link.normalized) {
            continue;
        }
        groups
            .entry((link.source, link.normalized))
            .or_default()
            .insert(link.raw);
    }

    groups
        .into_iter()
        .map(|((source, normalized), raws)| DanglingGroup {
            source,
            normalized,
            links: raws.into_iter().collect(),
        })
        .collect()
}
