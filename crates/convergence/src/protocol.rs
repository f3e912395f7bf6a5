//! Child-process output protocol
//!
//! Resource and gatherer scripts talk back through literal markers anywhere
//! in their combined output:
//!
//! | Marker                  | Meaning                      |
//! |-------------------------|------------------------------|
//! | `##FAIL##`              | [`TerminalStatus::Error`]    |
//! | `##CONFIGURED##`        | [`TerminalStatus::Configured`] |
//! | `##REBOOT##`            | [`TerminalStatus::RebootRequired`] |
//! | `##NOTCONFIGURED##`     | [`TerminalStatus::NotConfigured`] |
//! | `##SPANR[KEY=VALUE]##`  | publish `KEY=VALUE`          |
//! | `##SPANRMSG[TEXT]##`    | operator message             |
//!
//! Markers are not anchored to line starts.

use regex::Regex;
use std::sync::LazyLock;

use crate::env::EnvStore;
use crate::types::TerminalStatus;

/// Status markers in priority order. Priority, not text position, decides.
const STATUS_MARKERS: [(&str, TerminalStatus); 4] = [
    ("##FAIL##", TerminalStatus::Error),
    ("##CONFIGURED##", TerminalStatus::Configured),
    ("##REBOOT##", TerminalStatus::RebootRequired),
    ("##NOTCONFIGURED##", TerminalStatus::NotConfigured),
];

static VAR_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"##SPANR\[(.*?)\]##").expect("variable marker regex should compile")
});

static MSG_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"##SPANRMSG\[(.*?)\]##").expect("message marker regex should compile")
});

/// Everything a script communicated through its output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    /// Highest-priority status marker found, if any
    pub marker: Option<TerminalStatus>,
    /// Published bindings in the order they appeared
    pub vars: Vec<(String, String)>,
    /// Operator messages in the order they appeared
    pub messages: Vec<String>,
}

impl ParsedOutput {
    /// Parse the combined output of one finished child process
    pub fn parse(text: &str) -> Self {
        Self {
            marker: status_marker(text),
            vars: published_vars(text),
            messages: messages(text),
        }
    }

    /// Terminal status, failing closed when no marker was printed
    pub fn status(&self) -> TerminalStatus {
        self.marker.unwrap_or(TerminalStatus::Error)
    }

    /// Apply published bindings to the store, in order, so the last
    /// occurrence of a repeated key wins
    pub fn publish(&self, store: &mut EnvStore) {
        for (key, value) in &self.vars {
            log::info!("Setting var {key} = {value}");
            store.set(key, value);
        }
    }
}

/// Find the status marker with the highest priority
pub fn status_marker(text: &str) -> Option<TerminalStatus> {
    STATUS_MARKERS
        .iter()
        .find(|(marker, _)| text.contains(marker))
        .map(|(_, status)| *status)
}

/// Extract `##SPANR[KEY=VALUE]##` bindings
///
/// The key ends at the first `=`; a marker without `=` publishes nothing.
pub fn published_vars(text: &str) -> Vec<(String, String)> {
    VAR_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let body = caps.get(1)?.as_str();
            let (key, value) = body.split_once('=')?;
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Extract `##SPANRMSG[TEXT]##` messages
pub fn messages(text: &str) -> Vec<String> {
    MSG_MARKER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
