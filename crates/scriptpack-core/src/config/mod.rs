//! ScriptPack configuration layer
//!
//! Every environment variable read or written by the launcher goes through this
//! module; other code accesses structured config instead of `std::env::var`.
//!
//! - `loader`: env_or, env_bool, set/remove helpers, `.env` loading
//! - `schema`: ObservabilityConfig, LauncherConfig
//! - `env_keys`: key constants

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{
    env_bool, env_or, load_dotenv_from_dir, remove_env_var, set_env_var,
    ScopedEnvGuard,
};
pub use schema::{LauncherConfig, ObservabilityConfig};
