// src/archive/memory.rs
// =============================================================================
// An in-memory archive for tests.
//
// Built with a small builder API so each test states exactly which entries,
// metadata and failure modes it needs.
// =============================================================================

use std::collections::{BTreeMap, BTreeSet};

use super::{Archive, ArchiveError, Entry, EntryKind};

/// A 1x1 PNG, enough to satisfy the illustration format check.
pub const TINY_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

#[derive(Debug, Default)]
pub struct MemoryArchive {
    entries: BTreeMap<String, Entry>,
    metadata: BTreeMap<String, Vec<u8>>,
    main_entry: Option<String>,
    checksum: Option<(String, bool)>,
    integrity_error: Option<String>,
    unreadable: BTreeSet<String>,
    panicking: BTreeSet<String>,
    broken_index: bool,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, path: &str, mimetype: &str, data: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(
            path.to_string(),
            Entry {
                path: path.to_string(),
                mimetype: mimetype.to_string(),
                kind: EntryKind::Item(data.into()),
            },
        );
        self
    }

    pub fn with_html(self, path: &str, html: &str) -> Self {
        self.with_item(path, "text/html", html)
    }

    pub fn with_redirect(mut self, path: &str, target: &str) -> Self {
        self.entries.insert(
            path.to_string(),
            Entry {
                path: path.to_string(),
                mimetype: String::new(),
                kind: EntryKind::Redirect(target.to_string()),
            },
        );
        self
    }

    pub fn with_metadata(mut self, name: &str, value: impl Into<Vec<u8>>) -> Self {
        self.metadata.insert(name.to_string(), value.into());
        self
    }

    /// Fills in every mandatory metadata value with something valid.
    pub fn with_valid_metadata(self) -> Self {
        self.with_metadata("Name", "wikipedia_en_test")
            .with_metadata("Title", "Test archive")
            .with_metadata("Language", "eng")
            .with_metadata("Creator", "Wikipedia")
            .with_metadata("Publisher", "Kiwix")
            .with_metadata("Date", "2024-01-31")
            .with_metadata("Description", "An archive used by tests")
            .with_metadata("Illustration_48x48@1", TINY_PNG)
    }

    pub fn with_main_entry(mut self, path: &str) -> Self {
        self.main_entry = Some(path.to_string());
        self
    }

    pub fn with_checksum(mut self, value: &str, valid: bool) -> Self {
        self.checksum = Some((value.to_string(), valid));
        self
    }

    pub fn with_integrity_error(mut self, message: &str) -> Self {
        self.integrity_error = Some(message.to_string());
        self
    }

    /// Makes reading `path` fail with an I/O error.
    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.unreadable.insert(path.to_string());
        self
    }

    /// Makes reading `path` panic, like a provider choking on bad data.
    pub fn with_panicking(mut self, path: &str) -> Self {
        self.panicking.insert(path.to_string());
        self
    }

    /// Makes path enumeration fail.
    pub fn with_broken_index(mut self) -> Self {
        self.broken_index = true;
        self
    }
}

impl Archive for MemoryArchive {
    fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn paths(&self) -> Result<Vec<String>, ArchiveError> {
        if self.broken_index {
            return Err(ArchiveError::Corrupted("path index is unreadable".to_string()));
        }
        Ok(self.entries.keys().cloned().collect())
    }

    fn entry(&self, path: &str) -> Result<Entry, ArchiveError> {
        if self.panicking.contains(path) {
            panic!("decoder failed on {}", path);
        }
        if self.unreadable.contains(path) {
            return Err(ArchiveError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("cannot decompress {}", path),
            )));
        }
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| ArchiveError::EntryNotFound(path.to_string()))
    }

    fn has_entry(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    fn main_entry(&self) -> Option<String> {
        self.main_entry.clone()
    }

    fn metadata_keys(&self) -> Vec<String> {
        self.metadata.keys().cloned().collect()
    }

    fn metadata(&self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        self.metadata
            .get(name)
            .cloned()
            .ok_or_else(|| ArchiveError::EntryNotFound(format!("metadata/{}", name)))
    }

    fn checksum(&self) -> Option<String> {
        self.checksum.as_ref().map(|(value, _)| value.clone())
    }

    fn verify_checksum(&self) -> Result<bool, ArchiveError> {
        Ok(self.checksum.as_ref().is_some_and(|(_, valid)| *valid))
    }

    fn check_integrity(&self) -> Result<(), ArchiveError> {
        match &self.integrity_error {
            Some(message) => Err(ArchiveError::Corrupted(message.clone())),
            None => Ok(()),
        }
    }
}
