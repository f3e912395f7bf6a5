//! Core types for script-driven convergence

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single protocol step, a config item, or a whole run
///
/// Exactly one status is attached to an item once the run visits it;
/// items the run never reaches keep [`TerminalStatus::NotRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerminalStatus {
    /// Not visited yet
    #[default]
    NotRun,
    /// In the declared state
    Configured,
    /// Converged, but a reboot is needed before anything else can happen
    RebootRequired,
    /// Not in the declared state
    NotConfigured,
    /// Failed (launch failure, non-zero exit, missing marker, failed verification)
    Error,
    /// Condition evaluated false; not a failure
    SkippedOnCondition,
}

impl TerminalStatus {
    /// Whether a non-test run must stop after an item ends in this status
    pub fn halts_run(&self) -> bool {
        matches!(self, Self::RebootRequired | Self::Error)
    }

    /// Human-readable label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotRun => "NotRun",
            Self::Configured => "Configured",
            Self::RebootRequired => "RebootRequired",
            Self::NotConfigured => "NotConfigured",
            Self::Error => "Error",
            Self::SkippedOnCondition => "SkippedOnCondition",
        }
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which command of a resource is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Side-effect-free check
    Test,
    /// Mutation
    Apply,
    /// Second test after a successful apply
    Verify,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Test => write!(f, "test"),
            Step::Apply => write!(f, "apply"),
            Step::Verify => write!(f, "verify"),
        }
    }
}

/// Captured result of one finished child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Interleaved stdout and stderr
    pub text: String,
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Whether the process exited with status zero
    pub success: bool,
}

impl CommandOutput {
    /// Output of a process that exited with `code`
    pub fn exited(code: i32, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: Some(code),
            success: code == 0,
        }
    }
}

/// Options for a run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Only run test commands; never apply, never halt early
    pub test_mode: bool,
}

impl RunOptions {
    /// Options for a check-only run
    pub fn test() -> Self {
        Self { test_mode: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halting_statuses() {
        assert!(TerminalStatus::Error.halts_run());
        assert!(TerminalStatus::RebootRequired.halts_run());
        assert!(!TerminalStatus::NotConfigured.halts_run());
        assert!(!TerminalStatus::SkippedOnCondition.halts_run());
        assert!(!TerminalStatus::Configured.halts_run());
    }

    #[test]
    fn test_default_is_not_run() {
        assert_eq!(TerminalStatus::default(), TerminalStatus::NotRun);
    }

    #[test]
    fn test_exited_output() {
        assert!(CommandOutput::exited(0, "").success);
        let failed = CommandOutput::exited(2, "##CONFIGURED##");
        assert!(!failed.success);
        assert_eq!(failed.code, Some(2));
    }
}
