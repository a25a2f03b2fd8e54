//! Allow-listed capability sets registered into a rhai engine.

use std::fmt::Display;
use std::fs;
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rhai::packages::{
    BasicArrayPackage, BasicBlobPackage, BasicMapPackage, BasicMathPackage, CorePackage,
    LogicPackage, MoreStringPackage, Package,
};
use rhai::{Array, Dynamic, Engine, EvalAltResult, INT};
use sha2::{Digest, Sha256};

use crate::engine::{Capability, EngineEnv};

type FnResult<T> = Result<T, Box<EvalAltResult>>;

fn fail(op: &str, path: &str, err: impl Display) -> Box<EvalAltResult> {
    format!("{} '{}': {}", op, path, err).into()
}

pub(super) fn register(engine: &mut Engine, capability: Capability, env: &EngineEnv) {
    match capability {
        Capability::Core => {
            engine.register_global_module(CorePackage::new().as_shared_module());
        }
        Capability::Strings => {
            engine.register_global_module(MoreStringPackage::new().as_shared_module());
        }
        Capability::Collections => {
            engine.register_global_module(BasicArrayPackage::new().as_shared_module());
            engine.register_global_module(BasicMapPackage::new().as_shared_module());
            engine.register_global_module(BasicBlobPackage::new().as_shared_module());
        }
        Capability::Math => {
            engine.register_global_module(BasicMathPackage::new().as_shared_module());
            engine.register_global_module(LogicPackage::new().as_shared_module());
        }
        Capability::FileSystem => register_filesystem(engine),
        Capability::Security => register_security(engine),
        Capability::Archive => register_archive(engine),
        Capability::Utility => register_utility(engine, env),
    }
}

fn register_filesystem(engine: &mut Engine) {
    engine.register_fn("read_file", |path: &str| -> FnResult<String> {
        fs::read_to_string(path).map_err(|e| fail("read_file", path, e))
    });
    engine.register_fn("write_file", |path: &str, content: &str| -> FnResult<()> {
        fs::write(path, content).map_err(|e| fail("write_file", path, e))
    });
    engine.register_fn("append_file", |path: &str, content: &str| -> FnResult<()> {
        use std::io::Write;
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(content.as_bytes()))
            .map_err(|e| fail("append_file", path, e))
    });
    engine.register_fn("file_exists", |path: &str| Path::new(path).exists());
    engine.register_fn("is_dir", |path: &str| Path::new(path).is_dir());
    engine.register_fn("create_dir", |path: &str| -> FnResult<()> {
        fs::create_dir_all(path).map_err(|e| fail("create_dir", path, e))
    });
    engine.register_fn("remove_file", |path: &str| -> FnResult<()> {
        fs::remove_file(path).map_err(|e| fail("remove_file", path, e))
    });
    engine.register_fn("list_dir", |path: &str| -> FnResult<Array> {
        let mut names: Vec<String> = fs::read_dir(path)
            .map_err(|e| fail("list_dir", path, e))?
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        Ok(names.into_iter().map(Dynamic::from).collect())
    });
}

fn register_security(engine: &mut Engine) {
    engine.register_fn("sha256", |text: &str| hex::encode(Sha256::digest(text.as_bytes())));
    engine.register_fn("sha256_file", |path: &str| -> FnResult<String> {
        let bytes = fs::read(path).map_err(|e| fail("sha256_file", path, e))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    });
}

fn register_archive(engine: &mut Engine) {
    engine.register_fn("expand_archive", |archive: &str, dest: &str| -> FnResult<INT> {
        expand_archive(Path::new(archive), Path::new(dest)).map_err(|e| fail("expand_archive", archive, e))
    });
    engine.register_fn("compress_archive", |src_dir: &str, archive: &str| -> FnResult<()> {
        compress_archive(Path::new(src_dir), Path::new(archive))
            .map_err(|e| fail("compress_archive", archive, e))
    });
}

/// Unpack a `.tar.gz` into `dest`. Entries that would land outside `dest` are skipped.
fn expand_archive(archive: &Path, dest: &Path) -> std::io::Result<INT> {
    let file = fs::File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    fs::create_dir_all(dest)?;
    let mut unpacked: INT = 0;
    for entry in tar.entries()? {
        let mut entry = entry?;
        if entry.unpack_in(dest)? && entry.header().entry_type().is_file() {
            unpacked += 1;
        }
    }
    Ok(unpacked)
}

/// Pack the contents of `src_dir` into a `.tar.gz` at `archive`.
fn compress_archive(src_dir: &Path, archive: &Path) -> std::io::Result<()> {
    let file = fs::File::create(archive)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.append_dir_all(".", src_dir)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

fn register_utility(engine: &mut Engine, env: &EngineEnv) {
    engine.register_fn("env_var", |name: &str| -> Dynamic {
        std::env::var(name).map(Dynamic::from).unwrap_or(Dynamic::UNIT)
    });
    engine.register_fn("join_path", |base: &str, child: &str| {
        Path::new(base).join(child).to_string_lossy().to_string()
    });
    engine.register_fn("timestamp", || {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    });

    let home = env.runtime_home.to_string_lossy().to_string();
    engine.register_fn("runtime_home", move || home.clone());
}
