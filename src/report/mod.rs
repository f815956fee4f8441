// src/report/mod.rs
// =============================================================================
// This module collects findings and renders the final report.
//
// Submodules:
// - messages: The MsgId catalog, message parameters and templates
// - logger: ErrorLogger, the per-check accumulator of diagnostics and results
// - render: Text and JSON output of an ErrorLogger
// =============================================================================

mod logger;
mod messages;
mod render;

pub use logger::{Diagnostic, ErrorLogger};
pub use messages::{MsgId, MsgParams, ParamValue};
