//! Error taxonomy for the bootstrap sequence.

use std::path::PathBuf;

use scriptpack_core::{CatalogError, LayoutError};
use thiserror::Error;

/// Extraction failure. Never retried.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl MaterializeError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Failure to bring up or use an execution context.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Script engine failed to initialize: {reason}")]
    EngineInit { reason: String },

    #[error("Session has already executed a script")]
    AlreadyExecuted,
}

impl SessionError {
    pub fn engine_init(reason: impl Into<String>) -> Self {
        Self::EngineInit {
            reason: reason.into(),
        }
    }
}

/// Uncaught fault that aborted a script run (parse error, runtime error, throw).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ScriptFault {
    pub message: String,
    /// Innermost-last location trace reported by the engine.
    pub trace: Vec<String>,
}

/// Anything that stops the launcher before or outside normal script completion.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Environment setup failed: {0}")]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Runtime extraction failed: {0}")]
    Materialize(#[from] MaterializeError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Script fault: {0}")]
    ScriptFault(#[from] ScriptFault),
}

impl BootstrapError {
    /// Context lines for the diagnostic stream: the source chain, then any script trace.
    pub fn trace(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            lines.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        if let Self::ScriptFault(fault) = self {
            lines.extend(fault.trace.iter().cloned());
        }
        lines
    }
}
