// src/engine/redundancy.rs
// =============================================================================
// This module finds entries whose payloads are byte-for-byte identical.
//
// Two stages:
// 1. While scanning, every payload is hashed with Adler-32 and its path is
//    filed under that hash. Adler-32 is very fast but collides often, so a
//    shared hash only makes two entries *candidates*.
// 2. After the scan, every bucket with several candidates is re-read and
//    split into groups of truly identical payloads. Only those groups are
//    reported; collisions without byte equality are dropped silently.
//
// Rust concepts:
// - HashMap<u32, Vec<String>>: hash -> paths sharing that hash
// - Closures as parameters: The loader that re-reads payloads is passed in,
//   so this module never needs to know about the archive
// =============================================================================

use std::collections::HashMap;

const ADLER32_MODULUS: u32 = 65521;

/// Adler-32 checksum of `data`.
pub fn adler32(data: &[u8]) -> u32 {
    let mut s1: u32 = 1;
    let mut s2: u32 = 0;
    for &byte in data {
        s1 = (s1 + u32::from(byte)) % ADLER32_MODULUS;
        s2 = (s2 + s1) % ADLER32_MODULUS;
    }
    (s2 << 16) | s1
}

/// Candidate duplicates, grouped by content hash.
#[derive(Debug, Default)]
pub struct RedundancyIndex {
    buckets: HashMap<u32, Vec<String>>,
}

impl RedundancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash: u32, path: String) {
        self.buckets.entry(hash).or_default().push(path);
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Buckets with more than one path, each sorted, in a stable order.
    pub fn candidate_groups(&self) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<String>> = self
            .buckets
            .values()
            .filter(|paths| paths.len() > 1)
            .map(|paths| {
                let mut paths = paths.clone();
                paths.sort();
                paths
            })
            .collect();
        groups.sort();
        groups
    }
}

/// Result of the confirmation stage.
#[derive(Debug, Default)]
pub struct RedundancyOutcome<E> {
    /// Groups of paths with identical payloads (each sorted, at least 2 paths)
    pub groups: Vec<Vec<String>>,
    /// Candidates whose payload could not be re-read
    pub failures: Vec<(String, E)>,
}

/// Confirms candidate groups by comparing full payloads.
pub fn confirm_redundant_groups<E>(
    index: &RedundancyIndex,
    mut load: impl FnMut(&str) -> Result<Vec<u8>, E>,
) -> RedundancyOutcome<E> {
    let mut outcome = RedundancyOutcome {
        groups: Vec::new(),
        failures: Vec::new(),
    };

    for candidates in index.candidate_groups() {
        // (payload of the first member, members) per distinct payload
        let mut classes: Vec<(Vec<u8>, Vec<String>)> = Vec::new();

        for path in candidates {
            let data = match load(&path) {
                Ok(data) => data,
                Err(e) => {
                    outcome.failures.push((path, e));
                    continue;
                }
            };
            match classes.iter_mut().find(|(payload, _)| *payload == data) {
                Some((_, members)) => members.push(path),
                None => classes.push((data, vec![path])),
            }
        }

        outcome.groups.extend(
            classes
                .into_iter()
                .map(|(_, members)| members)
                .filter(|members| members.len() > 1),
        );
    }

    outcome.groups.sort();
    outcome
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why hash first and compare later?
//    - Comparing every pair of entries would be far too slow
//    - Only entries with the same hash can be identical
//    - Different payloads can share a hash, so the bytes are compared anyway
//
// 2. What does entry(hash).or_default() do?
//    - Looks up the key in the HashMap
//    - Inserts an empty Vec first if the key is missing
//    - Either way, returns a &mut to the Vec so we can push into it
//
// 3. Why is RedundancyOutcome generic over E?
//    - The caller decides how reading can fail
//    - Tests use a simple String error, the engine uses CheckError
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_adler32_known_values() {
        assert_eq!(adler32(b""), 1);
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
        // Same byte sum and same weighted sum: a classic collision
        assert_eq!(adler32(b"bbb"), adler32(b"c`c"));
    }

    #[test]
    fn test_collisions_are_not_reported() {
        let payloads: HashMap<&str, &[u8]> = [
            ("a.html", &b"bbb"[..]),
            ("b.html", &b"bbb"[..]),
            ("c.html", &b"c`c"[..]),
        ]
        .into_iter()
        .collect();

        let mut index = RedundancyIndex::new();
        for (path, data) in &payloads {
            index.insert(adler32(data), path.to_string());
        }
        assert_eq!(index.len(), 3);
        assert_eq!(index.candidate_groups(), vec![vec!["a.html", "b.html", "c.html"]]);

        let outcome = confirm_redundant_groups(&index, |path| {
            Ok::<_, String>(payloads[path].to_vec())
        });
        assert_eq!(outcome.groups, vec![vec!["a.html".to_string(), "b.html".to_string()]]);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_distinct_hashes_are_never_compared() {
        let mut index = RedundancyIndex::new();
        index.insert(1, "a".to_string());
        index.insert(2, "b".to_string());

        let outcome = confirm_redundant_groups(&index, |path| -> Result<Vec<u8>, String> {
            panic!("{} should not be loaded", path)
        });
        assert!(outcome.groups.is_empty());
    }

    #[test]
    fn test_unreadable_candidates_are_reported_as_failures() {
        let mut index = RedundancyIndex::new();
        for path in ["a", "b", "c"] {
            index.insert(7, path.to_string());
        }

        let outcome = confirm_redundant_groups(&index, |path| {
            if path == "b" {
                Err("gone".to_string())
            } else {
                Ok(b"same".to_vec())
            }
        });
        assert_eq!(outcome.groups, vec![vec!["a".to_string(), "c".to_string()]]);
        assert_eq!(outcome.failures, vec![("b".to_string(), "gone".to_string())]);
    }
}
