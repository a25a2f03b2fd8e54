//! Diagnostics and the final outcome of one launch.

use std::fmt;

use crate::error::BootstrapError;

/// Process exit code for a clean run.
pub const EXIT_SUCCESS: u8 = 0;
/// At least one error diagnostic was recorded by the script.
pub const EXIT_SCRIPT_FAILED: u8 = 1;
/// The host failed before or outside normal script completion (`-1` as a signed status).
pub const EXIT_BOOTSTRAP_FAILED: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("ERROR"),
            Self::Warning => f.write_str("WARNING"),
        }
    }
}

/// One diagnostic reported during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub severity: Severity,
    pub message: String,
}

impl DiagnosticEntry {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Result of one launch. Maps 1:1 to a process exit code.
#[derive(Debug)]
pub enum ExitOutcome {
    Success,
    /// Every diagnostic recorded during the run, in engine order.
    ScriptFailed(Vec<DiagnosticEntry>),
    BootstrapFailed(BootstrapError),
}

impl ExitOutcome {
    /// Classify a completed run by its diagnostics.
    pub fn from_diagnostics(diagnostics: &[DiagnosticEntry]) -> Self {
        if diagnostics.iter().any(DiagnosticEntry::is_error) {
            Self::ScriptFailed(diagnostics.to_vec())
        } else {
            Self::Success
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success => EXIT_SUCCESS,
            Self::ScriptFailed(_) => EXIT_SCRIPT_FAILED,
            Self::BootstrapFailed(_) => EXIT_BOOTSTRAP_FAILED,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<BootstrapError> for ExitOutcome {
    fn from(err: BootstrapError) -> Self {
        Self::BootstrapFailed(err)
    }
}
