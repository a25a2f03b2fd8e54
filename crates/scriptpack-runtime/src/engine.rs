//! ScriptEngine trait: the seam between the launcher and a concrete script engine.
//!
//! The session drives an engine only through these traits. The shipped
//! implementation is [`crate::rhai_engine::RhaiEngine`]; tests use a recording
//! double that counts context opens and closes.

use std::fmt;
use std::path::{Path, PathBuf};

use scriptpack_core::config::env_keys::runtime as runtime_keys;

use crate::error::{ScriptFault, SessionError};
use crate::outcome::DiagnosticEntry;

/// Standard capabilities an execution context may expose to the script.
///
/// Contexts start empty and receive exactly the capabilities listed; nothing is
/// loaded implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Operators, control flow, basic strings and iteration.
    Core,
    /// Extended string manipulation.
    Strings,
    /// Arrays, maps and blobs.
    Collections,
    /// Math and comparison helpers.
    Math,
    /// Read/write files and directories.
    FileSystem,
    /// Hashing.
    Security,
    /// `.tar.gz` pack and unpack.
    Archive,
    /// Environment lookup, paths, timestamps.
    Utility,
}

impl Capability {
    /// Allow-list used by the launcher.
    pub const STANDARD: &'static [Capability] = &[
        Capability::Core,
        Capability::Strings,
        Capability::Collections,
        Capability::Math,
        Capability::FileSystem,
        Capability::Security,
        Capability::Archive,
        Capability::Utility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Strings => "strings",
            Self::Collections => "collections",
            Self::Math => "math",
            Self::FileSystem => "filesystem",
            Self::Security => "security",
            Self::Archive => "archive",
            Self::Utility => "utility",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime location as the engine sees it at initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEnv {
    pub runtime_home: PathBuf,
    pub module_search_dirs: Vec<PathBuf>,
}

impl EngineEnv {
    /// Read `SCRIPTPACK_HOME` / `SCRIPTPACK_MODULE_PATH` from the process environment.
    ///
    /// Fails when either is unset: the launcher must publish the layout first.
    pub fn from_process_env() -> Result<Self, SessionError> {
        let home = std::env::var_os(runtime_keys::SCRIPTPACK_HOME).ok_or_else(|| {
            SessionError::engine_init(format!(
                "{} is not set; runtime layout was not published",
                runtime_keys::SCRIPTPACK_HOME
            ))
        })?;
        let module_path =
            std::env::var_os(runtime_keys::SCRIPTPACK_MODULE_PATH).ok_or_else(|| {
                SessionError::engine_init(format!(
                    "{} is not set; runtime layout was not published",
                    runtime_keys::SCRIPTPACK_MODULE_PATH
                ))
            })?;
        Ok(Self {
            runtime_home: PathBuf::from(home),
            module_search_dirs: std::env::split_paths(&module_path)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
        })
    }

    /// Build from explicit paths.
    pub fn new(runtime_home: impl Into<PathBuf>, module_search_dirs: Vec<PathBuf>) -> Self {
        Self {
            runtime_home: runtime_home.into(),
            module_search_dirs,
        }
    }

    /// Home must be an existing absolute directory; module dirs must live under it.
    pub fn validate(&self) -> Result<(), SessionError> {
        if !self.runtime_home.is_absolute() {
            return Err(SessionError::engine_init(format!(
                "runtime home is not absolute: {}",
                self.runtime_home.display()
            )));
        }
        if !self.runtime_home.is_dir() {
            return Err(SessionError::engine_init(format!(
                "runtime home does not exist: {}",
                self.runtime_home.display()
            )));
        }
        if let Some(outside) = self
            .module_search_dirs
            .iter()
            .find(|d| !d.starts_with(&self.runtime_home))
        {
            return Err(SessionError::engine_init(format!(
                "module directory {} is outside runtime home {}",
                outside.display(),
                self.runtime_home.display()
            )));
        }
        Ok(())
    }

    pub fn runtime_home(&self) -> &Path {
        &self.runtime_home
    }
}

/// Everything a context recorded during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRecord {
    /// Diagnostics in the order the engine reported them.
    pub diagnostics: Vec<DiagnosticEntry>,
    /// Lines the script printed.
    pub output: Vec<String>,
}

/// Factory for execution contexts.
pub trait ScriptEngine {
    type Context: ExecutionContext;

    /// Engine name, for logs.
    fn name(&self) -> &'static str;

    /// Build an isolated context exposing only `capabilities`.
    fn open_context(
        &self,
        env: &EngineEnv,
        capabilities: &[Capability],
    ) -> Result<Self::Context, SessionError>;
}

/// One isolated execution context. Closed exactly once by its owning session.
pub trait ExecutionContext {
    /// Run `source` to completion with `args` bound as `Args`.
    ///
    /// Diagnostics and output are appended to `record` even when the run faults.
    fn execute(
        &mut self,
        source: &str,
        args: &[String],
        record: &mut RunRecord,
    ) -> Result<(), ScriptFault>;

    /// Release engine resources.
    fn close(&mut self);
}
