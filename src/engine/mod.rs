// src/engine/mod.rs
// =============================================================================
// This module runs a complete check of one archive.
//
// Phases:
// 0. Setup (one thread): list every entry path into an index, then run the
//    archive-level checks. Failing to list the paths is fatal.
// 1. Scan (worker pool): N blocking tasks pull paths from a shared cursor and
//    run the per-entry checks. Findings go into shared, mutex-guarded state.
// 2. Reduce (one thread): checks that need to see every entry at once
//    (dangling links, redundant content, redirect chains) run on the
//    complete state, then every enabled check gets its pass/fail result.
//
// The set of findings is the same whatever the number of workers; only the
// order of per-entry findings may change between runs.
//
// Rust concepts:
// - tokio::task::spawn_blocking: Runs synchronous, CPU/IO heavy code on
//   tokio's blocking pool instead of the async executor threads
// - futures::future::join_all: Waits for all workers at once
// - Arc<dyn Archive>: One archive handle shared by every worker
// =============================================================================

mod archive_checks;
mod dangling;
mod progress;
mod redirects;
mod redundancy;
mod worker;

pub use progress::{NoProgress, ProgressObserver, TerminalProgress};

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info};
use thiserror::Error;

use crate::archive::{Archive, ArchiveError};
use crate::config::{ScanConfig, PROGRESS_INTERVAL};
use crate::msg_params;
use crate::registry::{EnabledTests, TestType};
use crate::report::{ErrorLogger, MsgId};
use archive_checks::run_archive_checks;
use dangling::find_dangling_links;
use progress::ProgressReporter;
use redirects::{check_redirects, RedirectFinding};
use redundancy::confirm_redundant_groups;
use worker::{lock, log_fault, read_payload, run_worker, ScanShared};

/// Errors raised while checking an archive.
///
/// `Fatal` and `Worker` abort the scan. `Entry` and `Panic` concern a single
/// entry and end up as diagnostics instead.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Fatal archive error: {0}")]
    Fatal(#[from] ArchiveError),

    #[error("Failed to read entry {path}: {source}")]
    Entry {
        path: String,
        #[source]
        source: ArchiveError,
    },

    #[error("Checking entry {path} panicked: {message}")]
    Panic { path: String, message: String },

    #[error("Task join error: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Process exit status of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Pass = 0,
    Fail = 1,
    Exception = 2,
}

impl StatusCode {
    pub fn from_status(passed: bool) -> Self {
        if passed {
            StatusCode::Pass
        } else {
            StatusCode::Fail
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Runs every enabled check on `archive`.
///
/// Returns the filled logger, with a result recorded for each enabled check
/// and for no other. `Err` means the scan could not be carried out at all.
pub async fn check_archive(
    archive: Arc<dyn Archive>,
    config: &ScanConfig,
    observer: Arc<dyn ProgressObserver>,
) -> Result<ErrorLogger, CheckError> {
    let enabled = config.enabled;
    let total = archive.entry_count();
    info!("Checking archive with {} entries", total);

    // Phase 0
    let setup_archive = Arc::clone(&archive);
    let (paths, logger) = tokio::task::spawn_blocking(move || -> Result<_, ArchiveError> {
        let paths = setup_archive.paths()?;
        let mut logger = ErrorLogger::new();
        run_archive_checks(setup_archive.as_ref(), enabled, &mut logger);
        Ok((paths, logger))
    })
    .await??;
    let index: HashSet<String> = paths.iter().cloned().collect();
    debug!("Path index holds {} entries", index.len());

    // Phase 1
    let progress = ProgressReporter::new(paths.len(), PROGRESS_INTERVAL, observer);
    let shared = Arc::new(ScanShared::new(
        Arc::clone(&archive),
        paths,
        enabled,
        logger,
        progress,
    ));

    if scans_entries(enabled) {
        info!("Scanning entries with {} worker(s)", config.threads);
        let workers = (0..config.threads).map(|_| {
            let shared = Arc::clone(&shared);
            tokio::task::spawn_blocking(move || run_worker(&shared))
        });
        for result in join_all(workers).await {
            result?;
        }
        shared.progress.finish();
    } else {
        debug!("No per-entry check enabled, skipping entry scan");
    }

    // Phase 2
    let redirect_limit = config.redirect_limit;
    let logger = tokio::task::spawn_blocking(move || reduce(&shared, &index, redirect_limit))
        .await?;

    info!("Check finished, {} finding(s)", logger.diagnostics().count());
    Ok(logger)
}

fn scans_entries(enabled: EnabledTests) -> bool {
    enabled
        .iter()
        .any(|test| test.is_per_entry() || test == TestType::Redirect)
}

fn reduce(shared: &ScanShared, index: &HashSet<String>, redirect_limit: usize) -> ErrorLogger {
    let enabled = shared.enabled;
    let mut logger = std::mem::take(&mut *lock(&shared.logger));

    if enabled.is_enabled(TestType::UrlInternal) {
        let links = std::mem::take(&mut *lock(&shared.internal_links));
        debug!("Resolving {} internal links", links.len());
        for group in find_dangling_links(links, index) {
            logger.add(
                MsgId::DanglingLinks,
                msg_params! {
                    "path" => group.source,
                    "normalized_link" => group.normalized,
                    "links" => group.links,
                },
            );
        }
    }

    if enabled.is_enabled(TestType::Redundant) {
        let candidates = lock(&shared.redundancy);
        debug!("Confirming redundancy among {} hashed items", candidates.len());
        let outcome = confirm_redundant_groups(&candidates, |path| {
            read_payload(shared.archive.as_ref(), path)
        });
        for paths in outcome.groups {
            logger.add(MsgId::RedundantItems, msg_params! { "paths" => paths });
        }
        for (path, error) in outcome.failures {
            log_fault(&mut logger, enabled, &path, &error);
        }
    }

    if enabled.is_enabled(TestType::Redirect) {
        let redirects = lock(&shared.redirects);
        debug!("Following {} redirects", redirects.len());
        for finding in check_redirects(&redirects, index, redirect_limit) {
            match finding {
                RedirectFinding::Loop { entry_path, cycle } => logger.add(
                    MsgId::RedirectLoop,
                    msg_params! { "entry_path" => entry_path, "cycle" => cycle },
                ),
                RedirectFinding::TooLong { entry_path, limit } => logger.add(
                    MsgId::RedirectChainTooLong,
                    msg_params! { "entry_path" => entry_path, "limit" => limit },
                ),
                RedirectFinding::Dangling { entry_path, target } => logger.add(
                    MsgId::DanglingRedirect,
                    msg_params! { "entry_path" => entry_path, "target" => target },
                ),
            }
        }
    }

    for test in enabled.iter() {
        let passed = logger.messages(test).is_empty();
        logger.set_test_result(test, passed);
    }

    logger
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why spawn_blocking instead of tokio::spawn?
//    - Reading entries and scanning HTML is synchronous work
//    - tokio::spawn would run it on the async executor threads and stall them
//    - spawn_blocking moves it to a thread pool meant for blocking code
//
// 2. What does `.await??` mean?
//    - The first ? unwraps the JoinError (did the task itself finish?)
//    - The second ? unwraps the task's own Result (did the work succeed?)
//    - Both errors convert into CheckError thanks to #[from]
//
// 3. Why Arc::clone(&shared) before every spawn?
//    - Each task must own what it uses, because it may outlive this function
//    - Arc::clone only bumps a reference counter, the data is not copied
//
// 4. What is std::mem::take?
//    - Moves a value out of a &mut, leaving Default::default() behind
//    - Used to pull the logger out of its Mutex once all workers are done
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::memory::MemoryArchive;
    use crate::report::Diagnostic;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn all_tests() -> EnabledTests {
        let mut enabled = EnabledTests::new();
        enabled.enable_all();
        enabled
    }

    async fn run(archive: MemoryArchive, config: ScanConfig) -> Result<ErrorLogger, CheckError> {
        check_archive(Arc::new(archive), &config, Arc::new(NoProgress)).await
    }

    fn messages(logger: &ErrorLogger, test: TestType) -> Vec<String> {
        logger.messages(test).iter().map(Diagnostic::message).collect()
    }

    // A small wiki with one problem of every kind
    fn broken_wiki() -> MemoryArchive {
        MemoryArchive::new()
            .with_valid_metadata()
            .with_main_entry("index.html")
            .with_html(
                "index.html",
                r#"<a href="wiki/A.html">A</a> <a href="wiki/Missing.html">?</a>"#,
            )
            .with_html(
                "wiki/A.html",
                r#"<a href="../index.html">home</a> <a href="Gone.html">x</a> <a href="./Gone.html#s">y</a>"#,
            )
            .with_html(
                "wiki/B.html",
                r#"<img src="https://cdn.example.com/b.png"> <a href="">e</a>"#,
            )
            .with_html("wiki/Copy1.html", "same content")
            .with_html("wiki/Copy2.html", "same content")
            .with_html("wiki/Empty.html", "")
            .with_redirect("loop1", "loop2")
            .with_redirect("loop2", "loop1")
            .with_redirect("home", "index.html")
            .with_redirect("broken", "nowhere")
    }

    #[tokio::test]
    async fn test_every_kind_of_problem_is_found() {
        let logger = run(broken_wiki(), ScanConfig::new(all_tests())).await.unwrap();

        assert_eq!(
            messages(&logger, TestType::UrlInternal),
            vec![
                "The following links: wiki/Missing.html (wiki/Missing.html) were not found in article index.html",
                "The following links: ./Gone.html#s, Gone.html (wiki/Gone.html) were not found in article wiki/A.html",
            ]
        );
        assert_eq!(
            messages(&logger, TestType::UrlExternal),
            vec!["https://cdn.example.com/b.png is an external dependence in article wiki/B.html"]
        );
        assert_eq!(
            messages(&logger, TestType::UrlEmpty),
            vec!["Found 1 empty links in article: wiki/B.html"]
        );
        assert_eq!(
            messages(&logger, TestType::Empty),
            vec!["Entry wiki/Empty.html is empty"]
        );
        assert_eq!(
            messages(&logger, TestType::Redundant),
            vec!["Entries with identical content: wiki/Copy1.html, wiki/Copy2.html"]
        );
        assert_eq!(
            messages(&logger, TestType::Redirect),
            vec![
                "Redirect broken points to missing entry nowhere",
                "Redirect loop exists from entry loop1: loop1, loop2, loop1",
            ]
        );

        let archive_level = [
            TestType::Checksum,
            TestType::Integrity,
            TestType::Metadata,
            TestType::Favicon,
            TestType::MainPage,
        ];
        for test in archive_level {
            assert_eq!(logger.test_result(test), Some(true), "{:?}", test);
        }
        assert_eq!(logger.test_result(TestType::UrlInternal), Some(false));
        assert!(!logger.overall_status());
    }

    #[tokio::test]
    async fn test_healthy_archive_passes() {
        let archive = MemoryArchive::new()
            .with_valid_metadata()
            .with_main_entry("index.html")
            .with_html("index.html", r#"<a href="wiki/A.html">A</a>"#)
            .with_html("wiki/A.html", r#"<a href="../index.html">home</a>"#)
            .with_redirect("A", "wiki/A.html");

        let logger = run(archive, ScanConfig::new(all_tests())).await.unwrap();
        assert_eq!(logger.diagnostics().count(), 0);
        assert!(logger.overall_status());
        assert_eq!(StatusCode::from_status(logger.overall_status()), StatusCode::Pass);
    }

    #[tokio::test]
    async fn test_thread_count_does_not_change_findings() {
        let single = run(broken_wiki(), ScanConfig::new(all_tests())).await.unwrap();
        let many = run(broken_wiki(), ScanConfig::new(all_tests()).with_threads(4))
            .await
            .unwrap();

        let as_set = |logger: &ErrorLogger| -> BTreeSet<Diagnostic> {
            logger.diagnostics().cloned().collect()
        };
        assert_eq!(as_set(&single), as_set(&many));
        assert_eq!(single.overall_status(), many.overall_status());
        for test in all_tests().iter() {
            assert_eq!(single.test_result(test), many.test_result(test));
        }
    }

    #[tokio::test]
    async fn test_only_enabled_tests_get_a_result() {
        let enabled: EnabledTests = [TestType::Empty, TestType::Favicon].into_iter().collect();
        let logger = run(broken_wiki(), ScanConfig::new(enabled)).await.unwrap();

        assert_eq!(logger.test_result(TestType::Empty), Some(false));
        assert_eq!(logger.test_result(TestType::Favicon), Some(true));
        assert_eq!(logger.test_result(TestType::UrlInternal), None);
        assert_eq!(logger.test_result(TestType::Redirect), None);
        assert!(logger.messages(TestType::UrlInternal).is_empty());
    }

    #[tokio::test]
    async fn test_broken_index_is_fatal() {
        let archive = MemoryArchive::new().with_html("a.html", "x").with_broken_index();
        let result = run(archive, ScanConfig::new(all_tests())).await;
        assert!(matches!(result, Err(CheckError::Fatal(ArchiveError::Corrupted(_)))));
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_isolated() {
        let archive = MemoryArchive::new()
            .with_html("a.html", "")
            .with_html("b.html", "fine")
            .with_html("c.html", "")
            .with_unreadable("b.html");
        let enabled: EnabledTests = [TestType::Empty].into_iter().collect();

        let logger = run(archive, ScanConfig::new(enabled).with_threads(2))
            .await
            .unwrap();

        let mut found = messages(&logger, TestType::Empty);
        found.sort();
        assert_eq!(
            found,
            vec![
                "Entry a.html is empty",
                "Entry c.html is empty",
                "Failed to check entry b.html: I/O error: cannot decompress b.html",
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_read_is_isolated() {
        let archive = MemoryArchive::new()
            .with_html("a.html", "")
            .with_html("b.html", "fine")
            .with_html("c.html", "")
            .with_panicking("b.html");
        let enabled: EnabledTests = [TestType::Empty].into_iter().collect();

        let logger = run(archive, ScanConfig::new(enabled).with_threads(2))
            .await
            .unwrap();

        let mut found = messages(&logger, TestType::Empty);
        found.sort();
        assert_eq!(
            found,
            vec![
                "Entry a.html is empty",
                "Entry c.html is empty",
                "Failed to check entry b.html: decoder failed on b.html",
            ]
        );
        assert_eq!(logger.test_result(TestType::Empty), Some(false));
    }

    #[tokio::test]
    async fn test_hash_collisions_are_not_redundant() {
        let archive = MemoryArchive::new()
            .with_item("a.txt", "text/plain", "bbb")
            .with_item("b.txt", "text/plain", "bbb")
            .with_item("c.txt", "text/plain", "c`c");
        let enabled: EnabledTests = [TestType::Redundant].into_iter().collect();

        let logger = run(archive, ScanConfig::new(enabled)).await.unwrap();
        assert_eq!(
            messages(&logger, TestType::Redundant),
            vec!["Entries with identical content: a.txt, b.txt"]
        );
    }

    #[tokio::test]
    async fn test_self_redirect_is_one_loop() {
        let archive = MemoryArchive::new().with_redirect("A", "A");
        let enabled: EnabledTests = [TestType::Redirect].into_iter().collect();

        let logger = run(archive, ScanConfig::new(enabled)).await.unwrap();
        assert_eq!(
            messages(&logger, TestType::Redirect),
            vec!["Redirect loop exists from entry A: A, A"]
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(StatusCode::from_status(true).code(), 0);
        assert_eq!(StatusCode::from_status(false).code(), 1);
        assert_eq!(StatusCode::Exception.code(), 2);
    }
}
