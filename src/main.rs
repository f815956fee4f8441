// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr) and open the archive
// 3. Run the checks and print the report (stdout)
// 4. Exit with proper code (0 = all checks pass, 1 = a check failed,
//    2 = the archive could not be checked)
//
// Rust concepts used:
// - async/await: The engine drives its worker pool from the tokio runtime
// - Result<T, E>: For error handling (T = success type, E = error type)
// - Arc: Shares one archive handle between all workers
// =============================================================================

// Module declarations - tells Rust about our other source files
mod archive; // src/archive/ - archive access (trait + directory provider)
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - scan configuration and defaults
mod engine; // src/engine/ - the concurrent checking engine
mod links; // src/links/ - link extraction, classification, normalization
mod metadata; // src/metadata.rs - reserved metadata validation
mod registry; // src/registry.rs - the catalog of checks
mod report; // src/report/ - diagnostics and report rendering

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser; // Parser trait enables the parse() method
use log::{error, info, LevelFilter};

use archive::{Archive, DirArchive};
use cli::Cli;
use config::{OutputMode, ScanConfig};
use engine::{NoProgress, ProgressObserver, StatusCode, TerminalProgress};
use report::ErrorLogger;

// The #[tokio::main] attribute transforms our async main into a real main function
// It creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code.code(),
        Err(e) => {
            // The archive could not be checked at all: EXCEPTION, not FAIL
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            StatusCode::Exception.code()
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<StatusCode> {
    let cli = Cli::parse();
    init_logger(cli.log_level.map(LevelFilter::from));

    let config = cli.scan_config();
    let archive_name = cli.archive.display().to_string();

    if config.output != OutputMode::Json {
        println!("🔍 Checking archive: {}", archive_name);
    }

    let archive = DirArchive::open(&cli.archive)
        .with_context(|| format!("Failed to open archive {}", archive_name))?;
    info!(
        "Opened {} ({} entries)",
        archive.root().display(),
        archive.entry_count()
    );

    let observer: Arc<dyn ProgressObserver> = if config.show_progress {
        Arc::new(TerminalProgress)
    } else {
        Arc::new(NoProgress)
    };

    let logger = engine::check_archive(Arc::new(archive), &config, observer)
        .await
        .with_context(|| format!("Failed to check archive {}", archive_name))?;

    print_report(&logger, &archive_name, &config)?;

    Ok(StatusCode::from_status(logger.overall_status()))
}

// RUST_LOG (warn when unset), overridden by --log-level when given
fn init_logger(level: Option<LevelFilter>) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.target(env_logger::Target::Stderr);
    builder.init();
}

fn print_report(logger: &ErrorLogger, archive_name: &str, config: &ScanConfig) -> Result<()> {
    match config.output {
        OutputMode::Json => {
            let json_output = logger.report_json(archive_name, config.enabled)?;
            println!("{}", json_output);
        }
        OutputMode::Details => print!("{}", logger.report(config.enabled, true)),
        OutputMode::Plain => print!("{}", logger.report(config.enabled, false)),
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does run() return Result<StatusCode> instead of exiting directly?
//    - The ? operator can only be used in functions that return Result
//    - Keeping std::process::exit() in main() means every value created in
//      run() is dropped properly before the process ends
//
// 2. Why is stdout only used for the report?
//    - Logs and progress go to stderr
//    - So `archive-guardian --json wiki/ > report.json` stays valid JSON
//
// 3. What is Arc<dyn ProgressObserver>?
//    - dyn: "some type implementing this trait", chosen at runtime
//    - Arc: shared ownership, so the engine can hand it to every worker
// -----------------------------------------------------------------------------
