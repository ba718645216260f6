use std::{io::IsTerminal, process::ExitCode};

use clap::Parser;
use session::{Session, SCRIPT_FILE_NAME};
use tracing::{error, Level};

#[derive(Parser, Debug)]
#[command(
    version,
    about = format!("Runs `{SCRIPT_FILE_NAME}` from the working directory in an embedded Python interpreter")
)]
struct CommandLine {}

fn main() -> ExitCode {
    let CommandLine {} = CommandLine::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_max_level(Level::WARN)
        .without_time()
        .with_target(false)
        .init();

    match runtime::launch(&Session::from_working_dir()) {
        Ok(status) => ExitCode::from(status),
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_status())
        }
    }
}
