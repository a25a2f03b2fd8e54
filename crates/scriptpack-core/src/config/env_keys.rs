//! Environment variable key constants.

/// Published by the launcher for the embedded runtime.
pub mod runtime {
    /// Absolute path of the extracted runtime tree.
    pub const SCRIPTPACK_HOME: &str = "SCRIPTPACK_HOME";
    /// Module search directories, joined with the platform path-list separator.
    pub const SCRIPTPACK_MODULE_PATH: &str = "SCRIPTPACK_MODULE_PATH";
}

/// Observability and logging
pub mod observability {
    pub const SCRIPTPACK_QUIET: &str = "SCRIPTPACK_QUIET";
    pub const SCRIPTPACK_LOG_LEVEL: &str = "SCRIPTPACK_LOG_LEVEL";
    pub const SCRIPTPACK_LOG_JSON: &str = "SCRIPTPACK_LOG_JSON";
}

/// Launcher behavior
pub mod launcher {
    /// Skip the "press Enter" hold on fatal errors (CI, wrappers).
    pub const SCRIPTPACK_NO_PAUSE: &str = "SCRIPTPACK_NO_PAUSE";
}

/// Name of the optional dotenv file next to the executable.
pub const DOTENV_FILE: &str = "scriptpack.env";
