// src/archive/mod.rs
// =============================================================================
// This module defines what the checker needs from an archive.
//
// The checker never touches the container format itself. It talks to an
// `Archive` through a narrow trait:
// - enumerate entry paths in canonical order
// - read one entry (mimetype, payload or redirect target)
// - read archive-level metadata, main page, checksum and integrity status
//
// Implementations:
// - dir: an archive laid out as a plain directory tree
// - memory: an in-memory archive used by the test suites
//
// Rust concepts:
// - Traits: A shared interface that several types can implement
// - Send + Sync: Marker traits that allow sharing across worker threads
// - thiserror: Derives std::error::Error for our error enum
// =============================================================================

mod dir;
#[cfg(test)]
pub mod memory;

pub use dir::DirArchive;

use thiserror::Error;

/// Errors raised by an archive provider.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Underlying file system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No entry is stored under the requested path.
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// The archive could not be opened because its layout is wrong.
    #[error("Invalid archive layout: {0}")]
    InvalidLayout(String),

    /// The archive opened but part of it is damaged.
    #[error("Archive is corrupted: {0}")]
    Corrupted(String),
}

// What an entry holds: either bytes or a pointer to another entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A content item with its (decompressed) payload
    Item(Vec<u8>),
    /// A redirect to the entry stored at the given path
    Redirect(String),
}

// One addressable record of the archive
//
// Entries are immutable once read; workers get their own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub mimetype: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn is_redirect(&self) -> bool {
        matches!(self.kind, EntryKind::Redirect(_))
    }

    /// Path of the redirect target, `None` for content items
    pub fn redirect_target(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Redirect(target) => Some(target),
            EntryKind::Item(_) => None,
        }
    }

    /// Payload bytes, `None` for redirects
    pub fn data(&self) -> Option<&[u8]> {
        match &self.kind {
            EntryKind::Item(data) => Some(data),
            EntryKind::Redirect(_) => None,
        }
    }

    pub fn is_html(&self) -> bool {
        !self.is_redirect() && self.mimetype.starts_with("text/html")
    }
}

/// Read-only view of an archive shared by every worker.
///
/// All methods take `&self`: one handle is shared without locking, so an
/// implementation must be safe to call from several threads at once.
pub trait Archive: Send + Sync {
    /// Total number of entries (items and redirects).
    fn entry_count(&self) -> usize;

    /// Every entry path, in the archive's canonical order.
    fn paths(&self) -> Result<Vec<String>, ArchiveError>;

    /// Reads the entry stored under `path`.
    fn entry(&self, path: &str) -> Result<Entry, ArchiveError>;

    fn has_entry(&self, path: &str) -> bool;

    /// Path of the main (welcome) page, if the archive declares one.
    fn main_entry(&self) -> Option<String>;

    /// Names of every metadata value stored in the archive.
    fn metadata_keys(&self) -> Vec<String>;

    fn metadata(&self, name: &str) -> Result<Vec<u8>, ArchiveError>;

    /// Checksum recorded in the archive, if any.
    fn checksum(&self) -> Option<String>;

    /// Recomputes the checksum and compares it with the recorded one.
    fn verify_checksum(&self) -> Result<bool, ArchiveError>;

    /// Structural self-check of the container.
    fn check_integrity(&self) -> Result<(), ArchiveError>;
}
