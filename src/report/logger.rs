// src/report/logger.rs
// =============================================================================
// This module accumulates findings and per-check results.
//
// State:
// - one ordered list of diagnostics per TestType
// - one result per TestType: None until the check has run, then pass/fail
//
// The engine shares one ErrorLogger between its workers behind a Mutex; the
// logger itself is a plain single-threaded structure.
// =============================================================================

use serde::Serialize;
use strum::EnumCount;

use super::messages::{expand, MsgId, MsgParams};
use crate::registry::TestType;

/// One finding: which check, which message, with which parameters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Diagnostic {
    #[serde(rename = "check")]
    pub test: TestType,
    pub msg_id: MsgId,
    #[serde(flatten)]
    pub params: MsgParams,
}

impl Diagnostic {
    /// The message rendered from its template.
    pub fn message(&self) -> String {
        expand(self.msg_id, &self.params)
    }
}

#[derive(Debug, Clone)]
pub struct ErrorLogger {
    messages: Vec<Vec<Diagnostic>>,
    results: Vec<Option<bool>>,
}

impl Default for ErrorLogger {
    fn default() -> Self {
        ErrorLogger {
            messages: vec![Vec::new(); TestType::COUNT],
            results: vec![None; TestType::COUNT],
        }
    }
}

impl ErrorLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a check; a later call overrides an earlier one.
    pub fn set_test_result(&mut self, test: TestType, passed: bool) {
        self.results[test.index()] = Some(passed);
    }

    /// `None` if the check never ran.
    pub fn test_result(&self, test: TestType) -> Option<bool> {
        self.results[test.index()]
    }

    /// Appends a finding under `test`.
    pub fn add_msg(&mut self, test: TestType, msg_id: MsgId, params: MsgParams) {
        self.messages[test.index()].push(Diagnostic {
            test,
            msg_id,
            params,
        });
    }

    /// Appends a finding under the check its message id belongs to.
    pub fn add(&mut self, msg_id: MsgId, params: MsgParams) {
        self.add_msg(msg_id.default_test(), msg_id, params);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.messages[diagnostic.test.index()].push(diagnostic);
        }
    }

    pub fn messages(&self, test: TestType) -> &[Diagnostic] {
        &self.messages[test.index()]
    }

    /// Every diagnostic, grouped by check in ordinal order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter().flatten()
    }

    /// True iff every check that ran passed. Checks that never ran don't count.
    pub fn overall_status(&self) -> bool {
        self.results.iter().flatten().all(|passed| *passed)
    }
}
