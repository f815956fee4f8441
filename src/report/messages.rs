// src/report/messages.rs
// =============================================================================
// This module is the message catalog.
//
// A diagnostic is stored as a message id plus named parameters, not as a
// finished string. That way the same finding can be rendered as a sentence
// for humans, or as a structured JSON record for machines.
//
// Each MsgId has:
// - a default TestType (the check it usually belongs to)
// - a template with {named} placeholders
//
// Rust concepts:
// - macro_rules!: A small macro to build parameter maps tersely
// - #[serde(untagged)]: Serialize an enum as its inner value only
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use crate::registry::TestType;

/// Identifies a kind of finding and its template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgId {
    Checksum,
    Integrity,
    Metadata,
    MissingFavicon,
    MissingMainPage,
    DanglingMainPage,
    EmptyEntry,
    OutOfBoundsLink,
    EmptyLinks,
    DanglingLinks,
    ExternalLink,
    RedundantItems,
    RedirectLoop,
    RedirectChainTooLong,
    DanglingRedirect,
    EntryFault,
}

impl MsgId {
    /// The check a message belongs to unless the caller says otherwise.
    pub fn default_test(self) -> TestType {
        match self {
            MsgId::Checksum => TestType::Checksum,
            MsgId::Integrity | MsgId::EntryFault => TestType::Integrity,
            MsgId::Metadata => TestType::Metadata,
            MsgId::MissingFavicon => TestType::Favicon,
            MsgId::MissingMainPage | MsgId::DanglingMainPage => TestType::MainPage,
            MsgId::EmptyEntry => TestType::Empty,
            MsgId::OutOfBoundsLink | MsgId::DanglingLinks => TestType::UrlInternal,
            MsgId::EmptyLinks => TestType::UrlEmpty,
            MsgId::ExternalLink => TestType::UrlExternal,
            MsgId::RedundantItems => TestType::Redundant,
            MsgId::RedirectLoop | MsgId::RedirectChainTooLong | MsgId::DanglingRedirect => {
                TestType::Redirect
            }
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            MsgId::Checksum => "Archive checksum {archive_checksum} does not match the content",
            MsgId::Integrity => "{error}",
            MsgId::Metadata => "{error}",
            MsgId::MissingFavicon => "Favicon is missing",
            MsgId::MissingMainPage => "Main page is missing",
            MsgId::DanglingMainPage => "Main page {path} does not exist",
            MsgId::EmptyEntry => "Entry {path} is empty",
            MsgId::OutOfBoundsLink => "{link} is out of bounds. Article: {path}",
            MsgId::EmptyLinks => "Found {count} empty links in article: {path}",
            MsgId::DanglingLinks => {
                "The following links: {links} ({normalized_link}) were not found in article {path}"
            }
            MsgId::ExternalLink => "{link} is an external dependence in article {path}",
            MsgId::RedundantItems => "Entries with identical content: {paths}",
            MsgId::RedirectLoop => "Redirect loop exists from entry {entry_path}: {cycle}",
            MsgId::RedirectChainTooLong => {
                "Redirect chain from entry {entry_path} is longer than {limit} redirects"
            }
            MsgId::DanglingRedirect => "Redirect {entry_path} points to missing entry {target}",
            MsgId::EntryFault => "Failed to check entry {path}: {error}",
        }
    }
}

/// Value of a named message parameter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    fn render(&self) -> String {
        match self {
            ParamValue::Text(text) => text.clone(),
            ParamValue::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Text(value.clone())
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

pub type MsgParams = BTreeMap<String, ParamValue>;

/// Builds a `MsgParams` map: `msg_params! { "path" => path, "count" => 3 }`
#[macro_export]
macro_rules! msg_params {
    () => {
        $crate::report::MsgParams::new()
    };
    ($($key:literal => $value:expr),+ $(,)?) => {{
        let mut params = $crate::report::MsgParams::new();
        $(params.insert($key.to_string(), $crate::report::ParamValue::from($value));)+
        params
    }};
}

/// Substitutes `{name}` placeholders of the template with the parameters.
///
/// A placeholder without a parameter is left as is.
pub fn expand(msg_id: MsgId, params: &MsgParams) -> String {
    let template = msg_id.template();
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match params.get(name) {
                    Some(value) => output.push_str(&value.render()),
                    None => output.push_str(&rest[open..open + close + 2]),
                }
                rest = &after[close + 1..];
            }
            None => {
                output.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    output.push_str(rest);

    output
}
