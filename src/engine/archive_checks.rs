// src/engine/archive_checks.rs
// =============================================================================
// Checks that look at the archive as a whole rather than at single entries.
//
// They run once, before the worker pool starts, and only for enabled tests:
// - CHECKSUM: recorded checksum vs. recomputed one
// - INTEGRITY: structural self-check of the container
// - METADATA: the reserved metadata catalog
// - FAVICON: the 48x48 illustration
// - MAIN_PAGE: declared and resolvable welcome page
// =============================================================================

use log::{debug, info, warn};

use crate::archive::Archive;
use crate::metadata::{get_reserved_metadata_record, Metadata, ILLUSTRATION_48X48};
use crate::msg_params;
use crate::registry::{EnabledTests, TestType};
use crate::report::{ErrorLogger, MsgId};

pub fn run_archive_checks(archive: &dyn Archive, enabled: EnabledTests, logger: &mut ErrorLogger) {
    if enabled.is_enabled(TestType::Checksum) {
        check_checksum(archive, logger);
    }
    if enabled.is_enabled(TestType::Integrity) {
        check_integrity(archive, logger);
    }
    if enabled.is_enabled(TestType::Metadata) || enabled.is_enabled(TestType::Favicon) {
        let metadata = read_metadata(archive);
        if enabled.is_enabled(TestType::Metadata) {
            check_metadata(&metadata, logger);
        }
        if enabled.is_enabled(TestType::Favicon) {
            check_favicon(&metadata, logger);
        }
    }
    if enabled.is_enabled(TestType::MainPage) {
        check_main_page(archive, logger);
    }
}

fn check_checksum(archive: &dyn Archive, logger: &mut ErrorLogger) {
    let Some(checksum) = archive.checksum() else {
        info!("Archive has no checksum, skipping verification");
        return;
    };

    match archive.verify_checksum() {
        Ok(true) => debug!("Checksum {} verified", checksum),
        Ok(false) => logger.add(MsgId::Checksum, msg_params! { "archive_checksum" => checksum }),
        // Could not even recompute it: that is a broken container
        Err(e) => logger.add_msg(
            TestType::Checksum,
            MsgId::Integrity,
            msg_params! { "error" => e.to_string() },
        ),
    }
}

fn check_integrity(archive: &dyn Archive, logger: &mut ErrorLogger) {
    if let Err(e) = archive.check_integrity() {
        logger.add(MsgId::Integrity, msg_params! { "error" => e.to_string() });
    }
}

// Values that cannot be read are left out, so they show up as missing
fn read_metadata(archive: &dyn Archive) -> Metadata {
    let mut metadata = Metadata::new();
    for name in archive.metadata_keys() {
        match archive.metadata(&name) {
            Ok(value) => metadata.set(name, value),
            Err(e) => warn!("Cannot read metadata {}: {}", name, e),
        }
    }
    metadata
}

fn check_metadata(metadata: &Metadata, logger: &mut ErrorLogger) {
    for (name, _) in metadata.iter() {
        if get_reserved_metadata_record(name).is_err() {
            debug!("Metadata {} is not reserved, not checking it", name);
        }
    }

    let errors = metadata.check();
    if errors.is_empty() {
        debug!("Metadata is valid");
    }
    for error in errors {
        logger.add(MsgId::Metadata, msg_params! { "error" => error });
    }
}

fn check_favicon(metadata: &Metadata, logger: &mut ErrorLogger) {
    if metadata.get(ILLUSTRATION_48X48).is_err() {
        logger.add(MsgId::MissingFavicon, msg_params! {});
    }
}

fn check_main_page(archive: &dyn Archive, logger: &mut ErrorLogger) {
    match archive.main_entry() {
        None => logger.add(MsgId::MissingMainPage, msg_params! {}),
        Some(path) if !archive.has_entry(&path) => {
            logger.add(MsgId::DanglingMainPage, msg_params! { "path" => path })
        }
        Some(_) => {}
    }
}
