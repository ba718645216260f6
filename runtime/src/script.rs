use std::{
    borrow::Cow,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::{LaunchError, Result};

/// Contents of the script, read through a handle that does not outlive [`ScriptFile::open`].
#[derive(Debug)]
pub struct ScriptFile {
    path: PathBuf,
    source: String,
}

impl ScriptFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |source| LaunchError::Open {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(open_error)?;
        // A directory opens fine on unix; reading it is what fails.
        let mut source = String::new();
        file.read_to_string(&mut source).map_err(open_error)?;
        debug!(path = %path.display(), bytes = source.len(), "script read");

        Ok(Self {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The name the interpreter reports in tracebacks and `__file__`.
    pub fn name(&self) -> Cow<'_, str> {
        self.path.to_string_lossy()
    }
}
