//! The bootstrap sequence: configure → publish → materialize → open → run → close.
//!
//! [`Launcher::launch`] is the single recovery boundary. Every failure below it comes back
//! as an [`ExitOutcome`]; nothing is retried and nothing is swallowed.

use scriptpack_core::catalog::{Catalog, SCRIPT_RESOURCE};
use scriptpack_core::RuntimeLayout;

use crate::engine::{Capability, ScriptEngine};
use crate::error::BootstrapError;
use crate::info_log;
use crate::materialize::{materialize, RuntimeFilter};
use crate::outcome::ExitOutcome;
use crate::session::Session;

/// Inputs that stay fixed for one launch.
pub struct Launcher<'a, E: ScriptEngine> {
    catalog: &'a Catalog,
    engine: &'a E,
    filter: RuntimeFilter,
    capabilities: &'a [Capability],
}

/// What one launch produced.
#[derive(Debug)]
pub struct Launched {
    pub outcome: ExitOutcome,
    /// Lines the script printed, if it ran.
    pub output: Vec<String>,
}

impl<'a, E: ScriptEngine> Launcher<'a, E> {
    pub fn new(catalog: &'a Catalog, engine: &'a E) -> Self {
        Self {
            catalog,
            engine,
            filter: RuntimeFilter::runtime(),
            capabilities: Capability::STANDARD,
        }
    }

    pub fn with_capabilities(mut self, capabilities: &'a [Capability]) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Run the full sequence against `layout`.
    pub fn launch(&self, layout: &RuntimeLayout, args: &[String]) -> Launched {
        let mut output = Vec::new();
        let outcome = match self.run_sequence(layout, args, &mut output) {
            Ok(outcome) => outcome,
            Err(e) => e.into(),
        };
        tracing::debug!(exit_code = outcome.exit_code(), "Launch finished");
        Launched { outcome, output }
    }

    fn run_sequence(
        &self,
        layout: &RuntimeLayout,
        args: &[String],
        output: &mut Vec<String>,
    ) -> Result<ExitOutcome, BootstrapError> {
        info_log!("Base directory: {}", layout.base_dir().display());
        info_log!("Runtime home: {}", layout.runtime_home().display());

        // The engine reads these once at initialization; publish before anything else.
        layout.publish()?;

        let runtime = materialize(self.catalog, &self.filter, layout)?;
        tracing::debug!(
            files = runtime.files_written(),
            digest = runtime.digest(),
            "Runtime ready"
        );

        let mut session = Session::open(self.engine, &runtime, self.capabilities)?;
        tracing::debug!(
            engine = self.engine.name(),
            "Session open, loading {}",
            SCRIPT_RESOURCE
        );

        let source = self.catalog.read_to_string(SCRIPT_RESOURCE)?;
        let outcome = session.run(&source, args);
        let record = session.finish();
        *output = record.output;
        Ok(outcome)
    }
}
