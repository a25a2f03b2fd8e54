//! Execution session: one isolated context, one script run, always closed.

use crate::engine::{Capability, EngineEnv, ExecutionContext, RunRecord, ScriptEngine};
use crate::error::{BootstrapError, SessionError};
use crate::materialize::Materialized;
use crate::outcome::{DiagnosticEntry, ExitOutcome};

/// Lifecycle of a session. `Closed` is reached on every path, including drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Executed,
    Closed,
}

pub struct Session<C: ExecutionContext> {
    context: Option<C>,
    state: SessionState,
    bound_arguments: Vec<String>,
    record: RunRecord,
}

impl<C: ExecutionContext> Session<C> {
    /// Open a session against a materialized runtime.
    ///
    /// The engine location is read back from the process environment, so a layout
    /// that was never published fails here instead of silently using defaults.
    pub fn open<E>(
        engine: &E,
        runtime: &Materialized,
        capabilities: &[Capability],
    ) -> Result<Self, SessionError>
    where
        E: ScriptEngine<Context = C>,
    {
        let env = EngineEnv::from_process_env()?;
        let layout = runtime.layout();
        if env.runtime_home != layout.runtime_home()
            || env.module_search_dirs != layout.module_search_dirs()
        {
            return Err(SessionError::engine_init(format!(
                "published runtime home {} does not match materialized runtime {}",
                env.runtime_home.display(),
                layout.runtime_home().display()
            )));
        }
        Self::open_with_env(engine, &env, capabilities)
    }

    /// Open a session against an explicit engine environment.
    pub fn open_with_env<E>(
        engine: &E,
        env: &EngineEnv,
        capabilities: &[Capability],
    ) -> Result<Self, SessionError>
    where
        E: ScriptEngine<Context = C>,
    {
        let context = engine.open_context(env, capabilities)?;
        tracing::debug!(
            engine = engine.name(),
            capabilities = ?capabilities,
            "Execution context opened"
        );
        Ok(Self {
            context: Some(context),
            state: SessionState::Open,
            bound_arguments: Vec::new(),
            record: RunRecord::default(),
        })
    }

    /// Run `source` with `args` bound as `Args`. Blocks until the script finishes.
    ///
    /// A session runs at most one script.
    pub fn run(&mut self, source: &str, args: &[String]) -> ExitOutcome {
        if self.state != SessionState::Open {
            return BootstrapError::from(SessionError::AlreadyExecuted).into();
        }
        let Some(context) = self.context.as_mut() else {
            return BootstrapError::from(SessionError::AlreadyExecuted).into();
        };
        self.bound_arguments = args.to_vec();
        self.state = SessionState::Executed;

        let result = context.execute(source, args, &mut self.record);
        for entry in &self.record.diagnostics {
            tracing::debug!("Script diagnostic: {}", entry);
        }
        match result {
            Ok(()) => ExitOutcome::from_diagnostics(&self.record.diagnostics),
            Err(fault) => BootstrapError::from(fault).into(),
        }
    }

    /// Release the context. Idempotent; also performed on drop.
    pub fn close(&mut self) {
        if let Some(mut context) = self.context.take() {
            context.close();
            tracing::debug!("Execution context closed");
        }
        self.state = SessionState::Closed;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn bound_arguments(&self) -> &[String] {
        &self.bound_arguments
    }

    pub fn diagnostics(&self) -> &[DiagnosticEntry] {
        &self.record.diagnostics
    }

    pub fn output(&self) -> &[String] {
        &self.record.output
    }

    /// Close and hand back what the run recorded.
    pub fn finish(mut self) -> RunRecord {
        self.close();
        std::mem::take(&mut self.record)
    }
}

impl<C: ExecutionContext> Drop for Session<C> {
    fn drop(&mut self) {
        self.close();
    }
}
