// src/config.rs
// =============================================================================
// This module holds the scan configuration and its defaults.
//
// The CLI (cli.rs) is parsed into a ScanConfig once, before the scan starts.
// The engine only ever reads it.
// =============================================================================

use std::time::Duration;

use crate::registry::EnabledTests;

/// Default number of worker threads.
pub const DEFAULT_THREADS: usize = 1;

/// How often progress is reported at most.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// How many redirects a chain may follow before it is reported as too long.
pub const DEFAULT_REDIRECT_LIMIT: usize = 50;

/// How the final report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Failed checks with their issue counts
    #[default]
    Plain,
    /// Failed checks with every message
    Details,
    /// A single JSON document
    Json,
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub enabled: EnabledTests,
    /// Number of workers scanning entries (at least 1)
    pub threads: usize,
    pub output: OutputMode,
    pub redirect_limit: usize,
    pub show_progress: bool,
}

impl ScanConfig {
    pub fn new(enabled: EnabledTests) -> Self {
        ScanConfig {
            enabled,
            threads: DEFAULT_THREADS,
            output: OutputMode::Plain,
            redirect_limit: DEFAULT_REDIRECT_LIMIT,
            show_progress: false,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_redirect_limit(mut self, limit: usize) -> Self {
        self.redirect_limit = limit;
        self
    }
}
