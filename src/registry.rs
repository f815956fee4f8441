// src/registry.rs
// =============================================================================
// This module lists the categories of checks and tracks which are enabled.
//
// `TestType` is a fixed enumeration. Its position in the enum doubles as a bit
// index into `EnabledTests`, a tiny bit set filled from the command line
// before the scan starts and only read afterwards (so it can be shared by all
// workers without any locking).
//
// Rust concepts:
// - strum: Derive macros to iterate over and count enum variants
// - Copy: EnabledTests is just an integer, passed around by value
// =============================================================================

use serde::Serialize;
use strum::EnumCount;
use strum_macros::{EnumCount as EnumCountMacro, EnumIter as EnumIterMacro};

/// A category of integrity check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIterMacro, EnumCountMacro, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    Checksum,
    Integrity,
    Empty,
    Metadata,
    Favicon,
    MainPage,
    Redundant,
    UrlInternal,
    UrlExternal,
    UrlEmpty,
    Redirect,
}

impl TestType {
    /// Bit position of this test in `EnabledTests`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable machine-readable name (used in JSON output).
    pub fn name(self) -> &'static str {
        match self {
            TestType::Checksum => "checksum",
            TestType::Integrity => "integrity",
            TestType::Empty => "empty",
            TestType::Metadata => "metadata",
            TestType::Favicon => "favicon",
            TestType::MainPage => "main_page",
            TestType::Redundant => "redundant",
            TestType::UrlInternal => "url_internal",
            TestType::UrlExternal => "url_external",
            TestType::UrlEmpty => "url_empty",
            TestType::Redirect => "redirect",
        }
    }

    /// Human-readable description of what a failure of this test means.
    pub fn description(self) -> &'static str {
        match self {
            TestType::Checksum => "Invalid checksum",
            TestType::Integrity => "Invalid low-level structure",
            TestType::Empty => "Empty entries",
            TestType::Metadata => "Metadata errors",
            TestType::Favicon => "Favicon",
            TestType::MainPage => "Missing mainpage",
            TestType::Redundant => "Redundant data found",
            TestType::UrlInternal => "Invalid internal links found",
            TestType::UrlExternal => "Invalid external links found",
            TestType::UrlEmpty => "Empty links found",
            TestType::Redirect => "Redirect loop(s) exist",
        }
    }

    /// Checks that run once per entry inside the worker pool.
    pub fn is_per_entry(self) -> bool {
        matches!(
            self,
            TestType::Empty
                | TestType::Redundant
                | TestType::UrlInternal
                | TestType::UrlExternal
                | TestType::UrlEmpty
        )
    }
}

/// Which tests a scan runs; one bit per `TestType`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnabledTests {
    bits: u32,
}

// The bit set must be wide enough for every test
const _: () = assert!(TestType::COUNT <= u32::BITS as usize);

impl EnabledTests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_all(&mut self) {
        self.bits = (1u32 << TestType::COUNT) - 1;
    }

    pub fn enable(&mut self, test: TestType) {
        self.bits |= 1 << test.index();
    }

    pub fn is_enabled(&self, test: TestType) -> bool {
        self.bits & (1 << test.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Enabled tests in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = TestType> + '_ {
        use strum::IntoEnumIterator;
        TestType::iter().filter(move |test| self.is_enabled(*test))
    }
}

impl FromIterator<TestType> for EnabledTests {
    fn from_iter<I: IntoIterator<Item = TestType>>(iter: I) -> Self {
        let mut enabled = EnabledTests::new();
        for test in iter {
            enabled.enable(test);
        }
        enabled
    }
}
