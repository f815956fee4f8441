// src/report/render.rs
// =============================================================================
// This module turns an ErrorLogger into the final report.
//
// Three output modes:
// - compact text: one line per failed check with its issue count
// - detailed text: the same, plus every message under its check
// - JSON: one document with every diagnostic as a structured record
//
// Rust concepts:
// - std::fmt::Write: writeln! into a String instead of stdout
// - Lifetimes: The JSON view borrows the diagnostics instead of cloning them
// =============================================================================

use std::fmt::Write;

use serde::Serialize;

use super::logger::{Diagnostic, ErrorLogger};
use crate::registry::{EnabledTests, TestType};

#[derive(Serialize)]
struct JsonLog<'a> {
    level: &'static str,
    message: String,
    #[serde(flatten)]
    diagnostic: &'a Diagnostic,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    archive: &'a str,
    checks: Vec<TestType>,
    logs: Vec<JsonLog<'a>>,
    status: bool,
}

impl ErrorLogger {
    /// Renders the text report for the enabled checks.
    ///
    /// With `details`, every message of a failed check is listed under it.
    pub fn report(&self, enabled: EnabledTests, details: bool) -> String {
        let mut output = String::new();
        let mut passed = 0;
        let mut failed = 0;

        for test in enabled.iter() {
            match self.test_result(test) {
                Some(true) => {
                    passed += 1;
                    let _ = writeln!(output, "[PASS] {}", test.name());
                }
                Some(false) => {
                    failed += 1;
                    let messages = self.messages(test);
                    let _ = writeln!(
                        output,
                        "[ERROR] {} ({} issue{})",
                        test.description(),
                        messages.len(),
                        if messages.len() == 1 { "" } else { "s" }
                    );
                    if details {
                        for diagnostic in messages {
                            let _ = writeln!(output, "  - {}", diagnostic.message());
                        }
                    }
                }
                None => {}
            }
        }

        if passed + failed > 0 {
            output.push('\n');
        }
        let _ = writeln!(output, "📊 Summary:");
        let _ = writeln!(output, "   ✅ Passed: {}", passed);
        let _ = writeln!(output, "   ❌ Failed: {}", failed);
        let _ = writeln!(output, "   📋 Total: {}", passed + failed);
        let _ = writeln!(
            output,
            "Overall status: {}",
            if self.overall_status() { "PASS" } else { "FAIL" }
        );

        output
    }

    /// Renders the machine-readable report.
    pub fn report_json(&self, archive: &str, enabled: EnabledTests) -> serde_json::Result<String> {
        let logs = self
            .diagnostics()
            .map(|diagnostic| JsonLog {
                level: "ERROR",
                message: diagnostic.message(),
                diagnostic,
            })
            .collect();

        let report = JsonReport {
            archive,
            checks: enabled.iter().collect(),
            logs,
            status: self.overall_status(),
        };
        serde_json::to_string_pretty(&report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg_params;
    use crate::report::MsgId;

    fn sample_logger() -> (ErrorLogger, EnabledTests) {
        let enabled: EnabledTests = [TestType::Empty, TestType::Favicon, TestType::Checksum]
            .into_iter()
            .collect();
        let mut logger = ErrorLogger::new();
        logger.add(MsgId::EmptyEntry, msg_params! { "path" => "a.html" });
        logger.add(MsgId::EmptyEntry, msg_params! { "path" => "b.html" });
        logger.set_test_result(TestType::Checksum, true);
        logger.set_test_result(TestType::Empty, false);
        logger.set_test_result(TestType::Favicon, true);
        (logger, enabled)
    }

    #[test]
    fn test_compact_report() {
        let (logger, enabled) = sample_logger();
        let report = logger.report(enabled, false);

        assert!(report.contains("[PASS] checksum\n"));
        assert!(report.contains("[ERROR] Empty entries (2 issues)\n"));
        assert!(!report.contains("a.html"));
        assert!(report.contains("Passed: 2"));
        assert!(report.contains("Failed: 1"));
        assert!(report.ends_with("Overall status: FAIL\n"));
    }

    #[test]
    fn test_detailed_report() {
        let (logger, enabled) = sample_logger();
        let report = logger.report(enabled, true);

        assert!(report.contains("  - Entry a.html is empty\n  - Entry b.html is empty\n"));
    }

    #[test]
    fn test_json_report() {
        let (logger, enabled) = sample_logger();
        let json = logger.report_json("test.zim", enabled).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["archive"], "test.zim");
        assert_eq!(value["status"], false);
        assert_eq!(
            value["checks"],
            serde_json::json!(["checksum", "empty", "favicon"])
        );
        assert_eq!(value["logs"][0]["check"], "empty");
        assert_eq!(value["logs"][0]["msg_id"], "empty_entry");
        assert_eq!(value["logs"][0]["path"], "a.html");
        assert_eq!(value["logs"][0]["message"], "Entry a.html is empty");
        assert_eq!(value["logs"][0]["level"], "ERROR");
    }
}
