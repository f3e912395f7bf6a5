//! Error types for the convergence engine.
//!
//! None of these cross the engine's public boundary as values: the state
//! machine and orchestrator fold every one of them into a
//! [`TerminalStatus`](crate::TerminalStatus) and report the message through
//! logging and the run observer.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Step;

/// Errors that can occur while converging a config item.
#[derive(Debug, Error)]
pub enum Error {
    /// Item references a resource the registry does not know
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Child process could not be started
    #[error("failed to launch {program} in {}: {source}", .dir.display())]
    LaunchFailure {
        /// Program that was being launched
        program: String,
        /// Working directory of the attempted launch
        dir: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Child process exited with a non-zero status
    #[error("{program} exited with {}", describe_code(.code))]
    NonZeroExit {
        /// Program that failed
        program: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Combined output of the failed process
        output: String,
    },

    /// Zero-exit child printed no status marker
    #[error("{step} command of {resource} printed no status marker")]
    MarkerAbsent {
        /// Resource whose command ran
        resource: String,
        /// Step that was running
        step: Step,
    },

    /// Apply reported success but the verification test disagrees
    #[error("{resource}: apply reported Configured but verification reports NotConfigured")]
    VerificationMismatch {
        /// Resource that failed verification
        resource: String,
    },

    /// Gatherer could not run to completion
    #[error("gatherer {name} failed: {source}")]
    GathererFailed {
        /// Gatherer name
        name: String,
        /// Launch or exit failure
        #[source]
        source: Box<Error>,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
