// src/engine/redirects.rs
// =============================================================================
// This module follows redirect chains after the scan.
//
// Starting from every redirect entry, we follow targets until we reach a
// content item. Three things can go wrong on the way:
// - the chain comes back to a path it already visited (a loop)
// - a target does not exist at all (a dangling redirect)
// - the chain is still going after `limit` hops
//
// Every member of a loop would discover the same loop, so a loop is
// reported once, by the first entry (in path order) that runs into it.
// =============================================================================

use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectFinding {
    /// `cycle` starts and ends with the same path
    Loop { entry_path: String, cycle: Vec<String> },
    TooLong { entry_path: String, limit: usize },
    Dangling { entry_path: String, target: String },
}

/// Follows every redirect in `redirects` (path -> target).
///
/// `index` holds every entry path of the archive, redirects included.
pub fn check_redirects(
    redirects: &BTreeMap<String, String>,
    index: &HashSet<String>,
    limit: usize,
) -> Vec<RedirectFinding> {
    let mut findings = Vec::new();
    let mut reported_cycles: HashSet<BTreeSet<String>> = HashSet::new();
    let mut reported_dangling: HashSet<String> = HashSet::new();

    for start in redirects.keys() {
        let mut chain: Vec<&str> = vec![start.as_str()];
        let mut current = start.as_str();
        let mut hops = 0;

        while let Some(target) = redirects.get(current) {
            let target = target.as_str();

            if let Some(pos) = chain.iter().position(|&visited| visited == target) {
                let members: BTreeSet<String> =
                    chain[pos..].iter().map(|path| path.to_string()).collect();
                if reported_cycles.insert(members) {
                    let mut cycle: Vec<String> =
                        chain[pos..].iter().map(|path| path.to_string()).collect();
                    cycle.push(target.to_string());
                    findings.push(RedirectFinding::Loop {
                        entry_path: start.clone(),
                        cycle,
                    });
                }
                break;
            }

            if !index.contains(target) {
                if reported_dangling.insert(current.to_string()) {
                    findings.push(RedirectFinding::Dangling {
                        entry_path: current.to_string(),
                        target: target.to_string(),
                    });
                }
                break;
            }

            hops += 1;
            if redirects.contains_key(target) && hops >= limit {
                findings.push(RedirectFinding::TooLong {
                    entry_path: start.clone(),
                    limit,
                });
                break;
            }

            chain.push(target);
            current = target;
        }
    }

    findings
}
