//! ScriptPack runtime: extract the embedded runtime tree and run the embedded
//! script in an isolated execution context.

pub mod engine;
pub mod error;
pub mod launcher;
pub mod log;
pub mod materialize;
pub mod outcome;
pub mod rhai_engine;
pub mod session;

pub use engine::{Capability, EngineEnv, ExecutionContext, RunRecord, ScriptEngine};
pub use error::{BootstrapError, MaterializeError, ScriptFault, SessionError};
pub use launcher::{Launched, Launcher};
pub use materialize::{materialize, materialize_into, Materialized, RuntimeFilter};
pub use outcome::{DiagnosticEntry, ExitOutcome, Severity};
pub use rhai_engine::RhaiEngine;
pub use session::{Session, SessionState};
