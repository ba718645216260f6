use std::mem::ManuallyDrop;

use rustpython::{
    vm::{builtins::PyBaseExceptionRef, AsObject, Interpreter, PyResult, VirtualMachine},
    InterpreterConfig,
};
use tracing::{debug, warn};

use crate::script::ScriptFile;

/// How a script run ended, as far as the exit status is concerned.
pub enum ScriptOutcome {
    Completed,
    /// An uncaught exception. It has been reported and does not change the exit status.
    Raised,
    /// `SystemExit`; its code becomes the exit status on finalize.
    Exited(PyBaseExceptionRef),
}

/// An initialized interpreter. It is finalized exactly once, by [`EmbeddedRuntime::finalize`]
/// or on drop.
pub struct EmbeddedRuntime {
    interpreter: ManuallyDrop<Interpreter>,
}

impl EmbeddedRuntime {
    pub fn initialize() -> Self {
        debug!("initializing interpreter");
        let interpreter = InterpreterConfig::new().init_stdlib().interpreter();
        Self {
            interpreter: ManuallyDrop::new(interpreter),
        }
    }

    /// Runs `script` as `__main__`, reporting uncaught exceptions the way the interpreter
    /// does at top level.
    pub fn run_main(&self, script: &ScriptFile) -> ScriptOutcome {
        self.interpreter.enter(|vm| match run_as_main(vm, script) {
            Ok(()) => {
                debug!(script = %script.name(), "script completed");
                ScriptOutcome::Completed
            }
            Err(exc) if exc.fast_isinstance(vm.ctx.exceptions.system_exit) => {
                debug!(script = %script.name(), "script raised SystemExit");
                ScriptOutcome::Exited(exc)
            }
            Err(exc) => {
                vm.print_exception(exc);
                warn!(
                    script = %script.name(),
                    "script raised an uncaught exception, exit status is left unchanged"
                );
                ScriptOutcome::Raised
            }
        })
    }

    /// Flushes the standard streams, runs `atexit` handlers and returns the exit status.
    pub fn finalize(self, outcome: ScriptOutcome) -> u8 {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the interpreter is moved out exactly once.
        let interpreter = unsafe { ManuallyDrop::take(&mut this.interpreter) };
        let exit = match outcome {
            ScriptOutcome::Exited(exc) => Some(exc),
            ScriptOutcome::Completed | ScriptOutcome::Raised => None,
        };
        let status = interpreter.finalize(exit);
        debug!(status, "interpreter finalized");
        status
    }
}

impl Drop for EmbeddedRuntime {
    fn drop(&mut self) {
        // SAFETY: `finalize` forgets `self`, so this is the only other place the interpreter
        // is moved out.
        let interpreter = unsafe { ManuallyDrop::take(&mut self.interpreter) };
        interpreter.finalize(None);
        debug!("interpreter finalized on drop");
    }
}

fn run_as_main(vm: &VirtualMachine, script: &ScriptFile) -> PyResult<()> {
    let scope = vm.new_scope_with_builtins();
    let main_module = vm.new_module("__main__", scope.globals.clone(), None);
    scope
        .globals
        .set_item("__name__", vm.ctx.new_str("__main__").into(), vm)?;
    vm.sys_module
        .get_attr("modules", vm)?
        .set_item("__main__", main_module.into(), vm)?;

    vm.run_code_string(scope, script.source(), script.name().into_owned())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn script(dir: &tempfile::TempDir, source: &str) -> ScriptFile {
        let path = dir.path().join("zt_ast.py");
        std::fs::write(&path, source).unwrap();
        ScriptFile::open(path).unwrap()
    }

    fn run(source: &str) -> u8 {
        let dir = tempfile::tempdir().unwrap();
        let script = script(&dir, source);
        let runtime = EmbeddedRuntime::initialize();
        let outcome = runtime.run_main(&script);
        runtime.finalize(outcome)
    }

    #[test]
    fn test_noop_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = script(&dir, "pass\n");
        let runtime = EmbeddedRuntime::initialize();
        let outcome = runtime.run_main(&script);
        assert!(matches!(outcome, ScriptOutcome::Completed));
        assert_eq!(runtime.finalize(outcome), 0);
    }

    #[test]
    fn test_script_runs_as_main() {
        let source = r#"
import sys
assert __name__ == "__main__", __name__
assert __file__.endswith("zt_ast.py"), __file__
assert "__main__" in sys.modules
"#;
        let dir = tempfile::tempdir().unwrap();
        let script = script(&dir, source);
        let runtime = EmbeddedRuntime::initialize();
        assert!(matches!(runtime.run_main(&script), ScriptOutcome::Completed));
    }

    #[test]
    fn test_script_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran.txt");
        let source = format!(
            "with open({:?}, 'w') as f:\n    f.write('ran')\n",
            marker.to_str().unwrap()
        );
        assert_eq!(run(&source), 0);
        assert_eq!(std::fs::read_to_string(marker).unwrap(), "ran");
    }

    #[test]
    fn test_uncaught_exception_keeps_status() {
        let dir = tempfile::tempdir().unwrap();
        let script = script(&dir, "raise ValueError('boom')\n");
        let runtime = EmbeddedRuntime::initialize();
        let outcome = runtime.run_main(&script);
        assert!(matches!(outcome, ScriptOutcome::Raised));
        assert_eq!(runtime.finalize(outcome), 0);
    }

    #[test]
    fn test_syntax_error_keeps_status() {
        assert_eq!(run("def broken(:\n"), 0);
    }

    #[test]
    fn test_system_exit_code() {
        assert_eq!(run("import sys\nsys.exit(3)\n"), 3);
        assert_eq!(run("import sys\nsys.exit()\n"), 0);
        assert_eq!(run("raise SystemExit('bye')\n"), 1);
    }

    #[test]
    fn test_stdlib_is_available() {
        let source = r#"
import ast, sys
tree = ast.parse("if False:\n    pass\n")
sys.exit(7 if isinstance(tree.body[0], ast.If) else 5)
"#;
        assert_eq!(run(source), 7);
    }

    fn register_atexit_marker(runtime: &EmbeddedRuntime, dir: &tempfile::TempDir) -> PathBuf {
        let marker = dir.path().join("atexit.txt");
        let source = format!(
            "import atexit\n\ndef done():\n    with open({:?}, 'w') as f:\n        f.write('done')\n\natexit.register(done)\n",
            marker.to_str().unwrap()
        );
        let script = script(dir, &source);
        assert!(matches!(runtime.run_main(&script), ScriptOutcome::Completed));
        assert!(!marker.exists());
        marker
    }

    #[test]
    fn test_finalize_runs_atexit() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = EmbeddedRuntime::initialize();
        let marker = register_atexit_marker(&runtime, &dir);

        assert_eq!(runtime.finalize(ScriptOutcome::Completed), 0);
        assert_eq!(std::fs::read_to_string(marker).unwrap(), "done");
    }

    #[test]
    fn test_drop_finalizes() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = EmbeddedRuntime::initialize();
        let marker = register_atexit_marker(&runtime, &dir);

        drop(runtime);
        assert_eq!(std::fs::read_to_string(marker).unwrap(), "done");
    }
}
