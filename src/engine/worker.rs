// src/engine/worker.rs
// =============================================================================
// This module contains what one worker does with one entry.
//
// How it works:
// 1. Claim the next path from the shared cursor
// 2. Read the entry from the archive
// 3. Run every enabled per-entry check on it (check_entry)
// 4. Merge the findings into the shared state, one lock at a time
//
// check_entry itself is a plain function of (entry, enabled tests): it
// touches no shared state, which makes it easy to test and means a fault
// while checking one entry cannot corrupt anything another worker sees.
//
// Rust concepts:
// - std::panic::catch_unwind: Stops a panic (in the provider's read or in
//   our own checks) at the entry boundary so one bad entry cannot take the
//   whole scan down
// - MutexGuard: The lock is released when the guard goes out of scope
// =============================================================================

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace, warn};

use super::dangling::InternalLink;
use super::progress::ProgressReporter;
use super::redundancy::{adler32, RedundancyIndex};
use super::CheckError;
use crate::archive::{Archive, Entry};
use crate::links::{
    base_directory, generic_get_links, is_out_of_bounds, normalize_link, LinkAttribute,
};
use crate::msg_params;
use crate::registry::{EnabledTests, TestType};
use crate::report::{Diagnostic, ErrorLogger, MsgId, MsgParams};

/// What checking one entry produced.
#[derive(Debug, Default, PartialEq)]
pub struct EntryFindings {
    pub diagnostics: Vec<Diagnostic>,
    /// Content hash, for the redundancy check
    pub hash: Option<u32>,
    /// In-bounds internal links to resolve after the scan
    pub internal_links: Vec<InternalLink>,
    /// Redirect target, for the redirect check
    pub redirect: Option<String>,
}

impl EntryFindings {
    fn push(&mut self, msg_id: MsgId, params: MsgParams) {
        self.diagnostics.push(Diagnostic {
            test: msg_id.default_test(),
            msg_id,
            params,
        });
    }
}

/// Runs every enabled per-entry check on `entry`.
pub fn check_entry(entry: &Entry, enabled: EnabledTests) -> EntryFindings {
    let mut findings = EntryFindings::default();

    if let Some(target) = entry.redirect_target() {
        if enabled.is_enabled(TestType::Redirect) {
            findings.redirect = Some(target.to_string());
        }
        return findings;
    }

    let data = entry.data().unwrap_or_default();

    if data.is_empty() {
        if enabled.is_enabled(TestType::Empty) {
            findings.push(MsgId::EmptyEntry, msg_params! { "path" => &entry.path });
        }
    } else if enabled.is_enabled(TestType::Redundant) {
        findings.hash = Some(adler32(data));
    }

    let wants_links = enabled.is_enabled(TestType::UrlInternal)
        || enabled.is_enabled(TestType::UrlExternal)
        || enabled.is_enabled(TestType::UrlEmpty);
    if wants_links && entry.is_html() {
        check_links(entry, data, enabled, &mut findings);
    }

    findings
}

fn check_links(entry: &Entry, data: &[u8], enabled: EnabledTests, findings: &mut EntryFindings) {
    let markup = String::from_utf8_lossy(data);
    let base = base_directory(&entry.path);
    let mut empty_links: usize = 0;

    for link in generic_get_links(&markup) {
        let target = link.target();

        if target.is_empty() {
            empty_links += 1;
            continue;
        }

        if link.is_internal_url() {
            if !enabled.is_enabled(TestType::UrlInternal) {
                continue;
            }
            // Anchors and queries on the page itself
            if target.starts_with('#') || target.starts_with('?') {
                continue;
            }
            if is_out_of_bounds(target, base) {
                findings.push(
                    MsgId::OutOfBoundsLink,
                    msg_params! { "link" => target, "path" => &entry.path },
                );
                continue;
            }
            let normalized = normalize_link(target, base);
            if normalized.is_empty() {
                continue;
            }
            findings.internal_links.push(InternalLink {
                source: entry.path.clone(),
                normalized,
                raw: target.to_string(),
            });
        } else if link.is_external_url()
            && link.attribute() == LinkAttribute::Src
            && enabled.is_enabled(TestType::UrlExternal)
        {
            findings.push(
                MsgId::ExternalLink,
                msg_params! { "link" => target, "path" => &entry.path },
            );
        } else {
            trace!(
                "Ignoring {:?} link {}=\"{}\" in {}",
                link.kind(),
                link.attribute().as_str(),
                target,
                entry.path
            );
        }
    }

    if empty_links > 0 && enabled.is_enabled(TestType::UrlEmpty) {
        findings.push(
            MsgId::EmptyLinks,
            msg_params! { "count" => empty_links, "path" => &entry.path },
        );
    }
}

/// The check a per-entry fault is reported under.
///
/// INTEGRITY when enabled, otherwise the first enabled test that looks at
/// entries. `None` if no such test is enabled.
pub fn fault_test(enabled: EnabledTests) -> Option<TestType> {
    if enabled.is_enabled(TestType::Integrity) {
        return Some(TestType::Integrity);
    }
    enabled
        .iter()
        .find(|test| test.is_per_entry() || *test == TestType::Redirect)
}

/// Everything the workers share during a scan.
pub struct ScanShared {
    pub archive: Arc<dyn Archive>,
    pub paths: Vec<String>,
    pub enabled: EnabledTests,
    cursor: AtomicUsize,
    pub logger: Mutex<ErrorLogger>,
    pub redundancy: Mutex<RedundancyIndex>,
    pub internal_links: Mutex<Vec<InternalLink>>,
    pub redirects: Mutex<BTreeMap<String, String>>,
    pub progress: ProgressReporter,
}

impl ScanShared {
    pub fn new(
        archive: Arc<dyn Archive>,
        paths: Vec<String>,
        enabled: EnabledTests,
        logger: ErrorLogger,
        progress: ProgressReporter,
    ) -> Self {
        ScanShared {
            archive,
            paths,
            enabled,
            cursor: AtomicUsize::new(0),
            logger: Mutex::new(logger),
            redundancy: Mutex::new(RedundancyIndex::new()),
            internal_links: Mutex::new(Vec::new()),
            redirects: Mutex::new(BTreeMap::new()),
            progress,
        }
    }

    fn next_path(&self) -> Option<&str> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.paths.get(index).map(String::as_str)
    }
}

/// Locks a mutex, recovering the data if another worker panicked while
/// holding it.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Worker loop: claims entries until the cursor runs past the end.
pub fn run_worker(shared: &ScanShared) {
    while let Some(path) = shared.next_path() {
        match process_entry(shared, path) {
            Ok(findings) => merge_findings(shared, path, findings),
            Err(e) => report_fault(shared, path, e),
        }
        shared.progress.increment();
    }
}

// Both the read and the checks run inside the guard
fn process_entry(shared: &ScanShared, path: &str) -> Result<EntryFindings, CheckError> {
    guarded(path, || {
        let entry = read_entry(shared.archive.as_ref(), path)?;
        Ok(check_entry(&entry, shared.enabled))
    })
}

/// Reads the payload of `path` with the same fault isolation as the scan.
///
/// Redirects and entries without data give an empty payload.
pub fn read_payload(archive: &dyn Archive, path: &str) -> Result<Vec<u8>, CheckError> {
    guarded(path, || {
        let entry = read_entry(archive, path)?;
        Ok(entry.data().unwrap_or_default().to_vec())
    })
}

fn read_entry(archive: &dyn Archive, path: &str) -> Result<Entry, CheckError> {
    archive.entry(path).map_err(|source| CheckError::Entry {
        path: path.to_string(),
        source,
    })
}

// Runs `f`, turning a panic into CheckError::Panic for `path`
fn guarded<T>(path: &str, f: impl FnOnce() -> Result<T, CheckError>) -> Result<T, CheckError> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(CheckError::Panic {
            path: path.to_string(),
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn merge_findings(shared: &ScanShared, path: &str, findings: EntryFindings) {
    if !findings.diagnostics.is_empty() {
        lock(&shared.logger).extend(findings.diagnostics);
    }
    if let Some(hash) = findings.hash {
        lock(&shared.redundancy).insert(hash, path.to_string());
    }
    if !findings.internal_links.is_empty() {
        lock(&shared.internal_links).extend(findings.internal_links);
    }
    if let Some(target) = findings.redirect {
        lock(&shared.redirects).insert(path.to_string(), target);
    }
}

fn report_fault(shared: &ScanShared, path: &str, error: CheckError) {
    log_fault(&mut lock(&shared.logger), shared.enabled, path, &error);
}

/// Records a fault confined to the entry at `path`.
pub fn log_fault(logger: &mut ErrorLogger, enabled: EnabledTests, path: &str, error: &CheckError) {
    warn!("{}", error);
    let Some(test) = fault_test(enabled) else {
        debug!("No enabled check to report the fault of {} under", path);
        return;
    };
    let reason = match error {
        CheckError::Entry { source, .. } => source.to_string(),
        CheckError::Panic { message, .. } => message.clone(),
        other => other.to_string(),
    };
    logger.add_msg(
        test,
        MsgId::EntryFault,
        msg_params! { "path" => path, "error" => reason },
    );
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does catch_unwind do?
//    - A panic normally unwinds the whole thread
//    - catch_unwind stops it and hands back Err(payload) instead
//    - The payload is usually a &str or a String, so we try both
//
// 2. Why AssertUnwindSafe?
//    - catch_unwind wants proof that nothing is left half-updated by a panic
//    - Our closure only reads shared state (the archive), so we assert it
//
// 3. What is AtomicUsize::fetch_add?
//    - Adds to the number and returns the old value in one indivisible step
//    - Two workers can never get the same index, no lock needed
//
// 4. Why PoisonError::into_inner?
//    - A Mutex is "poisoned" if a thread panicked while holding it
//    - Our data is still usable, so we take it back instead of failing
// -----------------------------------------------------------------------------
