mod error;
mod interpreter;
mod script;

pub use error::{LaunchError, Result, OPEN_FAILURE_STATUS};
pub use interpreter::{EmbeddedRuntime, ScriptOutcome};
pub use script::ScriptFile;

use session::Session;
use tracing::debug;

/// Runs the session's script to completion in a fresh interpreter and returns the exit status.
///
/// The only error is failing to open the script. An exception escaping the script is reported
/// by the interpreter and still yields status 0, unless it is `SystemExit`.
pub fn launch(session: &Session) -> Result<u8> {
    // Initialize before touching the file. On an open failure the runtime is released when
    // it goes out of scope.
    let runtime = EmbeddedRuntime::initialize();

    let script = ScriptFile::open(session.script_path())?;
    debug!(script = %script.name(), "running script as __main__");
    let outcome = runtime.run_main(&script);
    drop(script);

    Ok(runtime.finalize(outcome))
}
