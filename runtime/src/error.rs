use std::path::PathBuf;

use thiserror::Error;

/// Exit status for a script that cannot be opened, `-1` as the OS reports it.
pub const OPEN_FAILURE_STATUS: u8 = 255;

#[derive(Debug, Error)]
pub enum LaunchError {
    /// Missing, unreadable, a directory, or not UTF-8. All of them end the launch the same way.
    #[error("cannot open `{}`: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    pub fn exit_status(&self) -> u8 {
        match self {
            LaunchError::Open { .. } => OPEN_FAILURE_STATUS,
        }
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;
