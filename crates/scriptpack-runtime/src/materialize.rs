//! Runtime materializer: write the embedded runtime tree under the runtime home.
//!
//! Every launch rewrites every selected file. Each file is written to a temp file
//! in the destination directory and renamed over the target, so a concurrent
//! reader sees either the old or the new complete file, never a torn one.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use scriptpack_core::catalog::{logical_to_relative_path, Catalog, RUNTIME_PREFIX};
use scriptpack_core::RuntimeLayout;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::MaterializeError;
use crate::info_log;

/// Marker written after extraction: SHA-256 of the extracted payload set.
pub const DIGEST_FILE: &str = ".scriptpack-digest";

const TEMP_PREFIX: &str = ".scriptpack-";
const TEMP_SUFFIX: &str = ".tmp";

/// Temp files older than this were left by a crashed launch and are removed.
/// Younger ones may belong to a launch that is still writing.
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(60 * 60);

/// Selects runtime-distribution resources and strips their prefix.
#[derive(Debug, Clone)]
pub struct RuntimeFilter {
    prefix: &'static str,
}

impl Default for RuntimeFilter {
    fn default() -> Self {
        Self::runtime()
    }
}

impl RuntimeFilter {
    /// The standard `runtime/` prefix.
    pub fn runtime() -> Self {
        Self {
            prefix: RUNTIME_PREFIX,
        }
    }

    /// Logical name relative to the runtime home, if selected.
    pub fn select<'n>(&self, name: &'n str) -> Option<&'n str> {
        name.strip_prefix(self.prefix)
            .filter(|rest| !rest.is_empty())
    }
}

/// Outcome of one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files_written: usize,
    /// Hex SHA-256 over the selected (name, bytes) pairs in name order.
    pub digest: String,
}

/// Proof that the runtime tree for `layout` is on disk. Required to open a session.
#[derive(Debug, Clone)]
pub struct Materialized {
    layout: RuntimeLayout,
    summary: ExtractSummary,
}

impl Materialized {
    pub fn layout(&self) -> &RuntimeLayout {
        &self.layout
    }

    pub fn files_written(&self) -> usize {
        self.summary.files_written
    }

    pub fn digest(&self) -> &str {
        &self.summary.digest
    }
}

/// Extract the runtime tree into the layout's runtime home.
pub fn materialize(
    catalog: &Catalog,
    filter: &RuntimeFilter,
    layout: &RuntimeLayout,
) -> Result<Materialized, MaterializeError> {
    let summary = materialize_into(catalog, filter, layout.runtime_home())?;
    info_log!(
        "Runtime materialized: {} file(s) in {} (digest {})",
        summary.files_written,
        layout.runtime_home().display(),
        &summary.digest[..12.min(summary.digest.len())]
    );
    Ok(Materialized {
        layout: layout.clone(),
        summary,
    })
}

/// Write every selected resource under `target_dir`, overwriting existing files.
///
/// `target_dir` is created if missing. The digest marker is written last.
pub fn materialize_into(
    catalog: &Catalog,
    filter: &RuntimeFilter,
    target_dir: &Path,
) -> Result<ExtractSummary, MaterializeError> {
    std::fs::create_dir_all(target_dir).map_err(MaterializeError::io(target_dir))?;
    let swept = sweep_stale_temp_files(target_dir, STALE_TEMP_AGE);
    if swept > 0 {
        tracing::debug!("Removed {} stale temp file(s) under {}", swept, target_dir.display());
    }

    let mut hasher = Sha256::new();
    let mut files_written = 0;
    for resource in catalog.iter() {
        let Some(relative) = filter.select(&resource.name) else {
            continue;
        };
        let dest = target_dir.join(logical_to_relative_path(relative)?);
        write_atomically(&dest, &resource.bytes)?;
        tracing::trace!("Extracted {} -> {}", resource.name, dest.display());

        hasher.update(relative.as_bytes());
        hasher.update([0u8]);
        hasher.update((resource.bytes.len() as u64).to_le_bytes());
        hasher.update(&resource.bytes);
        files_written += 1;
    }

    let digest = hex::encode(hasher.finalize());
    write_atomically(&target_dir.join(DIGEST_FILE), digest.as_bytes())?;

    Ok(ExtractSummary {
        files_written,
        digest,
    })
}

/// Best-effort removal of leftover temp files older than `max_age` under `dir`.
/// Returns how many were removed.
fn sweep_stale_temp_files(dir: &Path, max_age: Duration) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;
    for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.starts_with(TEMP_PREFIX) || !name.ends_with(TEMP_SUFFIX) {
            continue;
        }
        let stale = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age >= max_age);
        if stale && std::fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }
    removed
}

/// Create-or-replace `path` with `bytes` via temp file + rename in the same directory.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), MaterializeError> {
    let parent: PathBuf = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(MaterializeError::io(&parent))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(&parent)
        .map_err(MaterializeError::io(path))?;
    tmp.write_all(bytes).map_err(MaterializeError::io(path))?;
    tmp.as_file().sync_all().map_err(MaterializeError::io(path))?;
    set_readable(tmp.path()).map_err(MaterializeError::io(path))?;
    tmp.persist(path)
        .map_err(|e| MaterializeError::io(path)(e.error))?;
    Ok(())
}

#[cfg(unix)]
fn set_readable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    // tempfile creates 0600; extracted runtime files are shared by every user of the install.
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_readable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
