use std::path::{Path, PathBuf};

/// The script every launch runs. It is looked up relative to a working directory.
pub const SCRIPT_FILE_NAME: &str = "zt_ast.py";

/// Session is a struct that holds where the script of a single launch is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    script_path: PathBuf,
}

impl Session {
    pub fn new(script_path: PathBuf) -> Self {
        Self { script_path }
    }

    /// The script as seen from the process working directory.
    ///
    /// The path is kept relative, so the OS resolves it at open time and the
    /// interpreter sees the bare file name as `__file__`.
    pub fn from_working_dir() -> Self {
        Self::new(PathBuf::from(SCRIPT_FILE_NAME))
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SCRIPT_FILE_NAME))
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::from_working_dir()
    }
}
