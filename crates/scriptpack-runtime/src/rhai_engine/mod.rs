//! Rhai-backed execution contexts.
//!
//! Each context starts from `Engine::new_raw()` and registers only the allow-listed
//! capabilities. Imports resolve from the module search directories and nowhere
//! else. Scripts report diagnostics with `write_error(msg)` / `write_warning(msg)`.

mod capabilities;

use self::capabilities::register as register_capability;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use rhai::module_resolvers::{FileModuleResolver, ModuleResolversCollection};
use rhai::{Array, Dynamic, Engine, EvalAltResult, ParseError, Scope};

use crate::engine::{Capability, EngineEnv, ExecutionContext, RunRecord, ScriptEngine};
use crate::error::{ScriptFault, SessionError};
use crate::outcome::DiagnosticEntry;

/// Name under which the forwarded arguments are visible to the script.
pub const ARGS_BINDING: &str = "Args";

/// Module file extension resolved by `import`.
pub const MODULE_EXTENSION: &str = "rhai";

const MAX_CALL_LEVELS: usize = 64;
const MAX_EXPR_DEPTH: usize = 128;
const MAX_FUNCTION_EXPR_DEPTH: usize = 64;

/// Where `print` output is echoed.
pub type EchoWriter = fn() -> Box<dyn Write>;

fn stdout_writer() -> Box<dyn Write> {
    Box::new(std::io::stdout())
}

/// Factory for rhai contexts.
#[derive(Debug, Clone)]
pub struct RhaiEngine {
    echo: EchoWriter,
}

impl Default for RhaiEngine {
    fn default() -> Self {
        Self {
            echo: stdout_writer,
        }
    }
}

impl RhaiEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo printed lines to the writer `echo` returns instead of stdout.
    pub fn with_echo(echo: EchoWriter) -> Self {
        Self { echo }
    }
}

/// Sink shared between the context and the functions registered into its engine.
#[derive(Debug, Default)]
struct Sink {
    diagnostics: Vec<DiagnosticEntry>,
    output: Vec<String>,
}

pub struct RhaiContext {
    engine: Option<Engine>,
    sink: Rc<RefCell<Sink>>,
}

impl ScriptEngine for RhaiEngine {
    type Context = RhaiContext;

    fn name(&self) -> &'static str {
        "rhai"
    }

    fn open_context(
        &self,
        env: &EngineEnv,
        capabilities: &[Capability],
    ) -> Result<RhaiContext, SessionError> {
        env.validate()?;

        let sink = Rc::new(RefCell::new(Sink::default()));
        let mut engine = Engine::new_raw();
        engine.set_strict_variables(true);
        engine.set_max_call_levels(MAX_CALL_LEVELS);
        engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_FUNCTION_EXPR_DEPTH);

        let mut resolvers = ModuleResolversCollection::new();
        for dir in &env.module_search_dirs {
            let mut resolver = FileModuleResolver::new_with_path(dir);
            resolver.set_extension(MODULE_EXTENSION);
            resolvers.push(resolver);
        }
        engine.set_module_resolver(resolvers);

        for capability in capabilities {
            register_capability(&mut engine, *capability, env);
        }
        register_host_functions(&mut engine, &sink, (self.echo)());

        Ok(RhaiContext {
            engine: Some(engine),
            sink,
        })
    }
}

/// Diagnostics and output hooks. Always present; not a capability.
fn register_host_functions(engine: &mut Engine, sink: &Rc<RefCell<Sink>>, echo: Box<dyn Write>) {
    let errors = Rc::clone(sink);
    engine.register_fn("write_error", move |message: &str| {
        errors
            .borrow_mut()
            .diagnostics
            .push(DiagnosticEntry::error(message));
    });

    let warnings = Rc::clone(sink);
    engine.register_fn("write_warning", move |message: &str| {
        warnings
            .borrow_mut()
            .diagnostics
            .push(DiagnosticEntry::warning(message));
    });

    // A closed or broken stdout must not abort the run; the line is still recorded.
    let printed = Rc::clone(sink);
    let echo = RefCell::new(echo);
    engine.on_print(move |line| {
        let mut out = echo.borrow_mut();
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            tracing::debug!("Could not echo script output: {}", e);
        }
        printed.borrow_mut().output.push(line.to_string());
    });

    engine.on_debug(|text, source, pos| {
        tracing::debug!(target: "scriptpack::script", "{} ({} @ {})", text, source.unwrap_or("main"), pos);
    });
}

impl RhaiContext {
    fn drain_into(&self, record: &mut RunRecord) {
        let mut sink = self.sink.borrow_mut();
        record.diagnostics.append(&mut sink.diagnostics);
        record.output.append(&mut sink.output);
    }
}

impl ExecutionContext for RhaiContext {
    fn execute(
        &mut self,
        source: &str,
        args: &[String],
        record: &mut RunRecord,
    ) -> Result<(), ScriptFault> {
        let Some(engine) = self.engine.as_ref() else {
            return Err(ScriptFault {
                message: "execution context is closed".to_string(),
                trace: Vec::new(),
            });
        };

        let mut scope = Scope::new();
        let bound: Array = args.iter().map(|a| Dynamic::from(a.clone())).collect();
        scope.push_constant(ARGS_BINDING, bound);

        let result = engine
            .compile_with_scope(&scope, source)
            .map_err(fault_from_parse)
            .and_then(|ast| {
                engine
                    .run_ast_with_scope(&mut scope, &ast)
                    .map_err(|e| fault_from_eval(&e))
            });

        self.drain_into(record);
        result
    }

    fn close(&mut self) {
        self.engine = None;
        let mut sink = self.sink.borrow_mut();
        sink.diagnostics.clear();
        sink.output.clear();
    }
}

fn fault_from_parse(err: ParseError) -> ScriptFault {
    ScriptFault {
        message: format!("Syntax error: {}", err.err_type()),
        trace: vec![format!("at {}", err.position())],
    }
}

fn fault_from_eval(err: &EvalAltResult) -> ScriptFault {
    let mut trace = Vec::new();
    let mut current = err;
    loop {
        match current {
            EvalAltResult::ErrorInFunctionCall(name, source, inner, pos) => {
                if source.is_empty() {
                    trace.push(format!("in call to '{}' at {}", name, pos));
                } else {
                    trace.push(format!("in call to '{}' ({}) at {}", name, source, pos));
                }
                current = inner.as_ref();
            }
            EvalAltResult::ErrorInModule(name, inner, pos) => {
                trace.push(format!("in module '{}' at {}", name, pos));
                current = inner.as_ref();
            }
            innermost => {
                trace.push(format!("at {}", innermost.position()));
                return ScriptFault {
                    message: innermost.to_string(),
                    trace,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn home_with_modules(modules: &[(&str, &str)]) -> (tempfile::TempDir, EngineEnv) {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path().join("runtime");
        let modules_dir = home.join("modules");
        fs::create_dir_all(&modules_dir).unwrap();
        for (name, body) in modules {
            fs::write(modules_dir.join(name), body).unwrap();
        }
        (tmp, EngineEnv::new(home, vec![modules_dir]))
    }

    fn run(env: &EngineEnv, caps: &[Capability], src: &str, args: &[&str]) -> (Result<(), ScriptFault>, RunRecord) {
        let engine = RhaiEngine::new();
        let mut ctx = engine.open_context(env, caps).unwrap();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut record = RunRecord::default();
        let result = ctx.execute(src, &args, &mut record);
        ctx.close();
        (result, record)
    }

    #[test]
    fn test_args_are_bound_verbatim() {
        let (_tmp, env) = home_with_modules(&[]);
        let src = r#"
            print(Args.len());
            for a in Args { print("[" + a + "]"); }
        "#;
        let (result, record) = run(&env, Capability::STANDARD, src, &["", "two words", " x "]);
        result.unwrap();
        assert_eq!(record.output, vec!["3", "[]", "[two words]", "[ x ]"]);
    }

    #[test]
    fn test_empty_args() {
        let (_tmp, env) = home_with_modules(&[]);
        let (result, record) = run(&env, Capability::STANDARD, "print(Args.len());", &[]);
        result.unwrap();
        assert_eq!(record.output, vec!["0"]);
    }

    #[test]
    fn test_diagnostics_in_order() {
        let (_tmp, env) = home_with_modules(&[]);
        let src = r#"
            write_warning("w");
            write_error("e1");
            write_error("e2");
        "#;
        let (result, record) = run(&env, Capability::STANDARD, src, &[]);
        result.unwrap();
        assert_eq!(
            record.diagnostics,
            vec![
                DiagnosticEntry::warning("w"),
                DiagnosticEntry::error("e1"),
                DiagnosticEntry::error("e2"),
            ]
        );
    }

    #[test]
    fn test_imports_resolve_from_module_dir() {
        let (_tmp, env) = home_with_modules(&[("text.rhai", "fn shout(s) { s.to_upper() + \"!\" }")]);
        let src = r#"
            import "text" as text;
            print(text::shout(Args[0]));
        "#;
        let (result, record) = run(&env, Capability::STANDARD, src, &["hey"]);
        result.unwrap();
        assert_eq!(record.output, vec!["HEY!"]);
    }

    #[test]
    fn test_missing_module_is_fault() {
        let (_tmp, env) = home_with_modules(&[]);
        let (result, _) = run(&env, Capability::STANDARD, "import \"nope\" as n;", &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_capability_not_allowed_is_unavailable() {
        let (_tmp, env) = home_with_modules(&[]);
        let (result, _) = run(&env, &[Capability::Core], "sha256(\"x\");", &[]);
        let fault = result.unwrap_err();
        assert!(fault.message.contains("sha256"), "{}", fault.message);

        let (result, _) = run(&env, &[Capability::Core, Capability::Security], "sha256(\"x\");", &[]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_syntax_error_is_fault_with_position() {
        let (_tmp, env) = home_with_modules(&[]);
        let (result, _) = run(&env, Capability::STANDARD, "let = ;", &[]);
        let fault = result.unwrap_err();
        assert!(fault.message.starts_with("Syntax error"));
        assert!(fault.trace[0].contains("line 1"));
    }

    #[test]
    fn test_throw_keeps_earlier_diagnostics_and_trace() {
        let (_tmp, env) = home_with_modules(&[]);
        let src = r#"
            fn fail() { throw "bad input"; }
            write_warning("before");
            fail();
        "#;
        let (result, record) = run(&env, Capability::STANDARD, src, &[]);
        let fault = result.unwrap_err();
        assert!(fault.message.contains("bad input"));
        assert!(fault.trace.iter().any(|l| l.contains("fail")));
        assert_eq!(record.diagnostics, vec![DiagnosticEntry::warning("before")]);
    }

    #[test]
    fn test_undefined_variable_rejected_at_compile() {
        let (_tmp, env) = home_with_modules(&[]);
        let (result, _) = run(&env, Capability::STANDARD, "print(nope);", &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_fails_without_home() {
        let engine = RhaiEngine::new();
        let env = EngineEnv::new(Path::new("/definitely/not/here/runtime"), vec![]);
        assert!(matches!(
            engine.open_context(&env, Capability::STANDARD),
            Err(SessionError::EngineInit { .. })
        ));
    }

    #[test]
    fn test_closed_context_refuses_to_run() {
        let (_tmp, env) = home_with_modules(&[]);
        let engine = RhaiEngine::new();
        let mut ctx = engine.open_context(&env, Capability::STANDARD).unwrap();
        ctx.close();
        let mut record = RunRecord::default();
        assert!(ctx.execute("print(1);", &[], &mut record).is_err());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }
    }

    fn broken_pipe() -> Box<dyn Write> {
        Box::new(BrokenPipe)
    }

    #[test]
    fn test_print_survives_broken_stdout() {
        let (_tmp, env) = home_with_modules(&[]);
        let engine = RhaiEngine::with_echo(broken_pipe);
        let mut ctx = engine.open_context(&env, Capability::STANDARD).unwrap();
        let mut record = RunRecord::default();
        let src = r#"
            print("one");
            print("two");
            write_error("after output");
        "#;
        ctx.execute(src, &[], &mut record).unwrap();
        ctx.close();
        assert_eq!(record.output, vec!["one", "two"]);
        assert_eq!(record.diagnostics, vec![DiagnosticEntry::error("after output")]);
    }
}
