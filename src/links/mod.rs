// src/links/mod.rs
// =============================================================================
// This module contains everything we know about links inside an archive.
//
// Submodules:
// - kind: Classifies link targets (internal path, web URL, mailto:, ...)
// - normalize: Resolves a link against its page into an archive path
// - html: Extracts links from raw page markup
//
// Nothing in here touches the archive itself, so it is all plain functions
// over strings.
// =============================================================================

mod html;
mod kind;
mod normalize;

pub use html::generic_get_links;
pub use kind::LinkAttribute;
pub use normalize::{base_directory, is_out_of_bounds, normalize_link};
