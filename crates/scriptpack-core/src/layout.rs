//! Runtime layout derived from the executable's own location.
//!
//! The runtime home and module search path are always subdirectories of the
//! directory containing the running executable. The caller's working directory
//! and any system-wide installation are never consulted.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::env_keys::runtime as runtime_keys;
use crate::config::set_env_var;

/// Runtime home, relative to the executable directory.
pub const RUNTIME_DIR_NAME: &str = "runtime";

/// Module directory, relative to the runtime home.
pub const MODULES_DIR_NAME: &str = "modules";

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Cannot determine executable path: {0}")]
    CurrentExe(#[source] std::io::Error),

    #[error("Executable path has no parent directory: {0}")]
    NoParent(PathBuf),

    #[error("Cannot join module search path: {0}")]
    JoinPaths(#[from] std::env::JoinPathsError),
}

/// Where the embedded runtime lives for this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeLayout {
    base_dir: PathBuf,
    runtime_home: PathBuf,
    module_search_dirs: Vec<PathBuf>,
}

impl RuntimeLayout {
    /// Derive the layout from a base directory.
    pub fn from_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir: PathBuf = base_dir.into();
        // Normalizes a trailing separator away.
        let base_dir: PathBuf = base_dir.components().collect();
        let runtime_home = base_dir.join(RUNTIME_DIR_NAME);
        let module_search_dirs = vec![runtime_home.join(MODULES_DIR_NAME)];
        Self {
            base_dir,
            runtime_home,
            module_search_dirs,
        }
    }

    /// Derive the layout from the running executable's directory.
    pub fn configure() -> Result<Self, LayoutError> {
        let exe = std::env::current_exe().map_err(LayoutError::CurrentExe)?;
        // Resolve symlinks so a linked launcher still finds its own payload.
        let exe = exe.canonicalize().unwrap_or(exe);
        let base = exe
            .parent()
            .ok_or_else(|| LayoutError::NoParent(exe.clone()))?
            .to_path_buf();
        Ok(Self::from_base_dir(base))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn runtime_home(&self) -> &Path {
        &self.runtime_home
    }

    pub fn module_search_dirs(&self) -> &[PathBuf] {
        &self.module_search_dirs
    }

    /// `SCRIPTPACK_MODULE_PATH` value: module dirs joined with the platform separator.
    pub fn module_path_value(&self) -> Result<OsString, LayoutError> {
        Ok(std::env::join_paths(&self.module_search_dirs)?)
    }

    /// True when every derived path sits under `base_dir`.
    pub fn is_self_contained(&self) -> bool {
        self.runtime_home.starts_with(&self.base_dir)
            && self
                .module_search_dirs
                .iter()
                .all(|d| d.starts_with(&self.base_dir))
    }

    /// Publish runtime home and module path into this process's environment.
    ///
    /// Must run before any engine is initialized: the engine reads these once.
    pub fn publish(&self) -> Result<(), LayoutError> {
        let module_path = self.module_path_value()?;
        set_env_var(runtime_keys::SCRIPTPACK_HOME, self.runtime_home.as_os_str());
        set_env_var(runtime_keys::SCRIPTPACK_MODULE_PATH, &module_path);
        tracing::debug!(
            home = %self.runtime_home.display(),
            "Published {} and {}",
            runtime_keys::SCRIPTPACK_HOME,
            runtime_keys::SCRIPTPACK_MODULE_PATH
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_under_base() {
        for base in [
            "/opt/scriptpack",
            "/opt/my tools/scriptpack",
            "/opt/scriptpack/",
            "relative/dir",
            "/",
        ] {
            let layout = RuntimeLayout::from_base_dir(base);
            assert!(layout.is_self_contained(), "not contained for {:?}", base);
            assert!(layout.runtime_home().starts_with(base));
            for dir in layout.module_search_dirs() {
                assert!(dir.starts_with(layout.runtime_home()));
            }
        }
    }

    #[test]
    fn test_trailing_separator_is_equivalent() {
        assert_eq!(
            RuntimeLayout::from_base_dir("/opt/my app/"),
            RuntimeLayout::from_base_dir("/opt/my app")
        );
    }

    #[test]
    fn test_fixed_subdirectories() {
        let layout = RuntimeLayout::from_base_dir("/srv/app");
        assert_eq!(layout.runtime_home(), Path::new("/srv/app/runtime"));
        assert_eq!(
            layout.module_search_dirs(),
            &[PathBuf::from("/srv/app/runtime/modules")]
        );
    }

    #[test]
    fn test_configure_uses_executable_dir() {
        let layout = RuntimeLayout::configure().unwrap();
        let exe = std::env::current_exe().unwrap();
        let exe = exe.canonicalize().unwrap_or(exe);
        assert_eq!(layout.base_dir(), exe.parent().unwrap());
        assert!(layout.is_self_contained());
    }

    #[test]
    fn test_module_path_value_round_trips() {
        let layout = RuntimeLayout::from_base_dir("/srv/with space");
        let value = layout.module_path_value().unwrap();
        let dirs: Vec<PathBuf> = std::env::split_paths(&value).collect();
        assert_eq!(dirs, layout.module_search_dirs());
    }
}
