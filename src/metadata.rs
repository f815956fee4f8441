// src/metadata.rs
// =============================================================================
// This module validates archive-level metadata (Title, Language, Date, ...).
//
// Every archive is expected to carry a fixed set of reserved metadata keys.
// Each reserved key has a record saying:
// - whether it is mandatory
// - how long (in characters) its value may be
// - which format it must follow (a regular expression)
//
// `Metadata::check()` runs three independent passes and returns ALL findings,
// so a single run tells the archive author everything that is wrong.
//
// Rust concepts:
// - LazyLock: Compile the regular expressions once, on first use
// - BTreeMap: Keys are unique; setting a key again replaces its value
// - thiserror: A small error type for lookups that can fail
// =============================================================================

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::bytes::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Metadata not found: {0}")]
    NotFound(String),
}

/// Constraints attached to one reserved metadata key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedMetadataRecord {
    pub name: &'static str,
    pub is_mandatory: bool,
    /// Minimum length in characters (0 = no minimum)
    pub min_length: usize,
    /// Maximum length in characters (0 = no maximum)
    pub max_length: usize,
    /// Format the whole value must match (empty = any)
    pub regex: &'static str,
}

const LANGS_REGEX: &str = r"\w{3}(,\w{3})*";
const DATE_REGEX: &str = r"\d\d\d\d-\d\d-\d\d";
const PNG_REGEX: &str = r"(?s-u)\x89PNG\x0d\x0a\x1a\x0a.+";

pub const ILLUSTRATION_48X48: &str = "Illustration_48x48@1";

// The reserved metadata catalog, in report order
pub static RESERVED_METADATA: &[ReservedMetadataRecord] = &[
    record("Name", true, 1, 0, ""),
    record("Title", true, 1, 30, ""),
    record("Language", true, 3, 0, LANGS_REGEX),
    record("Creator", true, 1, 0, ""),
    record("Publisher", true, 1, 0, ""),
    record("Date", true, 10, 10, DATE_REGEX),
    record("Description", true, 1, 80, ""),
    record("LongDescription", false, 0, 4000, ""),
    record("License", false, 0, 0, ""),
    record("Tags", false, 0, 0, ""),
    record("Relation", false, 0, 0, ""),
    record("Flavour", false, 0, 0, ""),
    record("Source", false, 0, 0, ""),
    record("Counter", false, 0, 0, ""),
    record("Scraper", false, 0, 0, ""),
    record(ILLUSTRATION_48X48, true, 0, 0, PNG_REGEX),
];

const fn record(
    name: &'static str,
    is_mandatory: bool,
    min_length: usize,
    max_length: usize,
    regex: &'static str,
) -> ReservedMetadataRecord {
    ReservedMetadataRecord {
        name,
        is_mandatory,
        min_length,
        max_length,
        regex,
    }
}

// Anchored versions of the catalog regexes, indexed like RESERVED_METADATA
static COMPILED_REGEXES: LazyLock<Vec<Option<Regex>>> = LazyLock::new(|| {
    RESERVED_METADATA
        .iter()
        .map(|record| {
            if record.regex.is_empty() {
                return None;
            }
            // The catalog is a constant: a pattern that does not compile is a
            // programming error caught by the tests below
            Regex::new(&format!("^(?:{})$", record.regex)).ok()
        })
        .collect()
});

/// Looks up the constraints of a reserved metadata key.
pub fn get_reserved_metadata_record(
    name: &str,
) -> Result<&'static ReservedMetadataRecord, MetadataError> {
    RESERVED_METADATA
        .iter()
        .find(|record| record.name == name)
        .ok_or_else(|| MetadataError::NotFound(name.to_string()))
}

fn char_count(value: &[u8]) -> usize {
    String::from_utf8_lossy(value).chars().count()
}

/// A flat key/value store of archive metadata.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metadata {
    data: BTreeMap<String, Vec<u8>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.data.insert(name.into(), value.into());
    }

    pub fn has(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&[u8], MetadataError> {
        self.data
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| MetadataError::NotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.data.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[allow(dead_code)]
    pub fn valid(&self) -> bool {
        self.check().is_empty()
    }

    /// Returns every violation found, one message per problem.
    pub fn check(&self) -> Vec<String> {
        let mut errors = self.check_mandatory_metadata();
        errors.extend(self.check_simple_constraints());
        errors.extend(self.check_complex_constraints());
        errors
    }

    fn check_mandatory_metadata(&self) -> Vec<String> {
        RESERVED_METADATA
            .iter()
            .filter(|record| record.is_mandatory && !self.has(record.name))
            .map(|record| format!("Missing mandatory metadata: {}", record.name))
            .collect()
    }

    // Length bounds of the reserved keys that are present
    fn check_simple_constraints(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for record in RESERVED_METADATA {
            let Some(value) = self.data.get(record.name) else {
                continue;
            };
            if record.min_length == 0 && record.max_length == 0 {
                continue;
            }

            let length = char_count(value);
            if record.min_length > 0 && length < record.min_length {
                errors.push(format!(
                    "{} must contain at least {} characters",
                    record.name, record.min_length
                ));
            }
            if record.max_length > 0 && length > record.max_length {
                errors.push(format!(
                    "{} must contain at most {} characters",
                    record.name, record.max_length
                ));
            }
        }
        errors
    }

    // Formats of the reserved keys that are present, plus cross-key rules
    fn check_complex_constraints(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (record, regex) in RESERVED_METADATA.iter().zip(COMPILED_REGEXES.iter()) {
            let (Some(value), Some(regex)) = (self.data.get(record.name), regex) else {
                continue;
            };
            if !regex.is_match(value) {
                errors.push(format!("{} doesn't match regex: {}", record.name, record.regex));
            }
        }

        if let (Some(description), Some(long_description)) =
            (self.data.get("Description"), self.data.get("LongDescription"))
        {
            if char_count(description) > char_count(long_description) {
                errors.push("Description is longer than LongDescription".to_string());
            }
        }

        errors
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is LazyLock?
//    - A value that is computed the first time it is used, then reused
//    - Safe to share between threads
//    - Perfect for regular expressions, which are costly to compile
//
// 2. Why regex::bytes::Regex?
//    - Metadata values are raw bytes (an illustration is a PNG file)
//    - The bytes flavour matches without requiring valid UTF-8
//
// 3. What is impl Into<String>?
//    - set() accepts anything that converts into a String (&str, String, ...)
//    - Callers don't have to write .to_string() themselves
// -----------------------------------------------------------------------------
