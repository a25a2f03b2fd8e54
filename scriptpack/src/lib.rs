//! ScriptPack launcher: runs the embedded script against the embedded runtime.
//!
//! Every command-line argument is forwarded verbatim to the script; the launcher
//! itself takes no flags.

pub mod observability;
pub mod payload;
pub mod report;

use std::process::ExitCode;

use scriptpack_core::config::env_keys::DOTENV_FILE;
use scriptpack_core::config::{load_dotenv_from_dir, LauncherConfig};
use scriptpack_core::RuntimeLayout;
use scriptpack_runtime::{BootstrapError, ExitOutcome, Launched, Launcher, RhaiEngine};

/// Process entry point.
pub fn run() -> ExitCode {
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let launched = match RuntimeLayout::configure() {
        Ok(layout) => {
            load_dotenv_from_dir(layout.base_dir(), DOTENV_FILE);
            observability::init_tracing();
            let catalog = payload::catalog();
            let engine = RhaiEngine::new();
            Launcher::new(&catalog, &engine).launch(&layout, &args)
        }
        Err(e) => {
            observability::init_tracing();
            Launched {
                outcome: BootstrapError::from(e).into(),
                output: Vec::new(),
            }
        }
    };

    let code = report::report(&launched.outcome, &mut std::io::stderr().lock());
    if matches!(launched.outcome, ExitOutcome::BootstrapFailed(_)) {
        report::hold_if_interactive(&LauncherConfig::from_env());
    }
    ExitCode::from(code)
}
