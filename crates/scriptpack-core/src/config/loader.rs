//! Environment variable loading helpers.
//!
//! Fallback chains live here so callers never repeat `or_else` ladders.

use std::env;
use std::path::Path;

/// Load `KEY=value` lines from `<dir>/<file_name>` into the process environment.
///
/// Existing variables are never overwritten. Missing file is not an error.
/// Returns the number of variables set.
pub fn load_dotenv_from_dir(dir: &Path, file_name: &str) -> usize {
    let path = dir.join(file_name);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return 0;
    };
    let mut loaded = 0;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(eq_pos) = line.find('=') else {
            continue;
        };
        let key = line[..eq_pos].trim();
        let mut value = line[eq_pos + 1..].trim();
        // Strip inline comment (# not inside quotes)
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() && env::var_os(key).is_none() {
            set_env_var(key, value);
            loaded += 1;
        }
    }
    tracing::debug!("Loaded {} variable(s) from {}", loaded, path.display());
    loaded
}

/// Read the primary variable or the first set alias, falling back to `default`.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default)
}

/// Boolean variable: 0/false/no/off are false, anything else set is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    let v = env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()));
    match v.as_deref() {
        Some(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

// ─── Centralized env::set_var / remove_var ──────────────────────────────────
//
// SAFETY contract: callers run these on the main thread before any other
// thread is spawned (the launcher is single-threaded).

/// Set one environment variable for the current process.
#[allow(unsafe_code)]
pub fn set_env_var<V: AsRef<std::ffi::OsStr>>(key: &str, value: V) {
    unsafe { env::set_var(key, value) };
}

/// Remove one environment variable from the current process.
#[allow(unsafe_code)]
pub fn remove_env_var(key: &str) {
    unsafe { env::remove_var(key) };
}

/// RAII guard: removes the variable on drop via [`remove_env_var`].
pub struct ScopedEnvGuard(pub &'static str);

impl Drop for ScopedEnvGuard {
    fn drop(&mut self) {
        remove_env_var(self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_env_bool_parsing() {
        let _g = ScopedEnvGuard("SCRIPTPACK_TEST_BOOL_A");
        assert!(env_bool("SCRIPTPACK_TEST_BOOL_A", &[], true));
        set_env_var("SCRIPTPACK_TEST_BOOL_A", "off");
        assert!(!env_bool("SCRIPTPACK_TEST_BOOL_A", &[], true));
        set_env_var("SCRIPTPACK_TEST_BOOL_A", "yes");
        assert!(env_bool("SCRIPTPACK_TEST_BOOL_A", &[], false));
    }

    #[test]
    fn test_env_or_falls_back_on_empty() {
        let _g = ScopedEnvGuard("SCRIPTPACK_TEST_OR_A");
        set_env_var("SCRIPTPACK_TEST_OR_A", "");
        assert_eq!(env_or("SCRIPTPACK_TEST_OR_A", &[], || "dflt".into()), "dflt");
        set_env_var("SCRIPTPACK_TEST_OR_A", "debug");
        assert_eq!(env_or("SCRIPTPACK_TEST_OR_A", &[], || "dflt".into()), "debug");
    }

    #[test]
    fn test_load_dotenv_does_not_override() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("test.env"),
            "# comment\nSCRIPTPACK_TEST_DOT_A=\"quoted\"\nSCRIPTPACK_TEST_DOT_B=plain # trailing\n",
        )
        .unwrap();
        let _a = ScopedEnvGuard("SCRIPTPACK_TEST_DOT_A");
        let _b = ScopedEnvGuard("SCRIPTPACK_TEST_DOT_B");
        set_env_var("SCRIPTPACK_TEST_DOT_B", "kept");

        let loaded = load_dotenv_from_dir(tmp.path(), "test.env");
        assert_eq!(loaded, 1);
        assert_eq!(env::var("SCRIPTPACK_TEST_DOT_A").unwrap(), "quoted");
        assert_eq!(env::var("SCRIPTPACK_TEST_DOT_B").unwrap(), "kept");
    }

    #[test]
    fn test_load_dotenv_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(load_dotenv_from_dir(tmp.path(), "absent.env"), 0);
    }
}
