// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// One positional argument (the archive) and one flag per check. Giving no
// check flag at all runs every check, so `archive-guardian my_archive/` is a
// full check and `archive-guardian -U -X my_archive/` only checks links.
//
// Rust concepts:
// - Derive macros: #[derive(Parser)] generates the whole argument parser
// - ValueEnum: Lets clap parse `--log-level debug` straight into an enum
// - From trait: Converts our LogLevel into the log crate's LevelFilter
// =============================================================================

use std::path::PathBuf;

use clap::builder::TypedValueParser; // for .map() on the thread count parser
use clap::{Parser, ValueEnum};

use crate::config::{OutputMode, ScanConfig, DEFAULT_REDIRECT_LIMIT, DEFAULT_THREADS};
use crate::registry::{EnabledTests, TestType};

// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "archive-guardian",
    version = "0.1.0",
    about = "A CLI tool to check the integrity of an offline content archive",
    long_about = "archive-guardian checks an archive for broken internal links, external \
                  dependencies, empty or duplicated entries, redirect loops, invalid metadata \
                  and structural damage. The exit code is 0 when every check passes, 1 when \
                  a check fails and 2 when the archive cannot be checked at all."
)]
pub struct Cli {
    /// Path of the archive to check
    pub archive: PathBuf,

    /// Run every check (the default when no check is selected)
    #[arg(short = 'A', long)]
    pub all: bool,

    /// Check for empty entries
    #[arg(short = '0', long)]
    pub empty: bool,

    /// Verify the archive checksum
    #[arg(short = 'C', long)]
    pub checksum: bool,

    /// Check the low-level structure of the archive
    #[arg(short = 'I', long)]
    pub integrity: bool,

    /// Validate the reserved metadata
    #[arg(short = 'M', long)]
    pub metadata: bool,

    /// Check that the archive has a favicon
    #[arg(short = 'F', long)]
    pub favicon: bool,

    /// Check that the main page exists
    #[arg(short = 'P', long)]
    pub main: bool,

    /// Look for entries with identical content
    #[arg(short = 'R', long)]
    pub redundant: bool,

    /// Look for internal links that lead nowhere
    #[arg(short = 'U', long)]
    pub url_internal: bool,

    /// Look for resources loaded from outside the archive
    #[arg(short = 'X', long)]
    pub url_external: bool,

    /// Look for links with an empty target
    #[arg(short = 'E', long)]
    pub url_empty: bool,

    /// Look for redirect loops, dangling and overly long redirect chains
    #[arg(short = 'L', long)]
    pub redirect_loop: bool,

    /// List every finding instead of counts only
    #[arg(short = 'D', long)]
    pub details: bool,

    /// Output the report as JSON
    #[arg(long, conflicts_with = "details")]
    pub json: bool,

    /// Number of worker threads scanning entries
    #[arg(
        short = 'j',
        long,
        default_value_t = DEFAULT_THREADS,
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from)
    )]
    pub threads: usize,

    /// Don't print progress on stderr
    #[arg(long)]
    pub no_progress: bool,

    /// Number of redirects a chain may follow before it is reported
    #[arg(long, default_value_t = DEFAULT_REDIRECT_LIMIT)]
    pub redirect_limit: usize,

    /// Log verbosity [default: RUST_LOG, or warn when unset]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

/// Logging level for the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Cli {
    /// The checks selected on the command line; all of them if none was.
    pub fn enabled_tests(&self) -> EnabledTests {
        let flags = [
            (self.checksum, TestType::Checksum),
            (self.integrity, TestType::Integrity),
            (self.empty, TestType::Empty),
            (self.metadata, TestType::Metadata),
            (self.favicon, TestType::Favicon),
            (self.main, TestType::MainPage),
            (self.redundant, TestType::Redundant),
            (self.url_internal, TestType::UrlInternal),
            (self.url_external, TestType::UrlExternal),
            (self.url_empty, TestType::UrlEmpty),
            (self.redirect_loop, TestType::Redirect),
        ];

        let mut enabled: EnabledTests = flags
            .into_iter()
            .filter(|(selected, _)| *selected)
            .map(|(_, test)| test)
            .collect();
        if self.all || enabled.is_empty() {
            enabled.enable_all();
        }
        enabled
    }

    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.details {
            OutputMode::Details
        } else {
            OutputMode::Plain
        }
    }

    pub fn scan_config(&self) -> ScanConfig {
        let mut config = ScanConfig::new(self.enabled_tests())
            .with_threads(self.threads)
            .with_redirect_limit(self.redirect_limit);
        config.output = self.output_mode();
        // Progress on stderr would interleave with nothing useful in JSON mode
        config.show_progress = !self.no_progress && !self.json;
        config
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Option<LogLevel> for --log-level?
//    - None means "not given on the command line"
//    - That lets RUST_LOG decide instead of a hidden default
//
// 2. What does value_parser!(u16).range(1..) do?
//    - Parses the value as a number and rejects 0 at parse time
//    - .map(usize::from) then converts it to the type the struct field uses
//    - .map() comes from the TypedValueParser trait, hence the import
//
// 3. Why conflicts_with = "details"?
//    - JSON output always carries every finding, so --details makes no sense
//    - clap reports the conflict as a normal usage error
// -----------------------------------------------------------------------------
