//! Structured configuration, loaded from environment variables.

use super::env_keys::{launcher as launcher_keys, observability as obv_keys};
use super::loader::{env_bool, env_or};

/// Observability config: quiet, log_level, log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    /// Cached after the first call; read it after the dotenv file is loaded.
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(Self::load)
    }

    fn load() -> Self {
        Self {
            quiet: env_bool(obv_keys::SCRIPTPACK_QUIET, &[], false),
            log_level: env_or(obv_keys::SCRIPTPACK_LOG_LEVEL, &[], || {
                "scriptpack=info,scriptpack_runtime=info,scriptpack_core=info".to_string()
            }),
            log_json: env_bool(obv_keys::SCRIPTPACK_LOG_JSON, &[], false),
        }
    }
}

/// Launcher behavior switches
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Hold the terminal open after a fatal error (interactive sessions only).
    pub pause_on_fatal: bool,
}

impl LauncherConfig {
    pub fn from_env() -> Self {
        Self {
            pause_on_fatal: !env_bool(launcher_keys::SCRIPTPACK_NO_PAUSE, &[], false),
        }
    }
}
