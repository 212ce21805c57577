use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::explorer::{ExplorationStats, ExplorerConfig};
use crate::outcome::{ExecutionOutcome, ExitStatus};
use crate::vector::TestVector;

/// Prefix of output directories picked automatically, followed by a counter.
pub const DEFAULT_PREFIX: &str = "symtest-out-";

/// Symbolic link to the most recent automatically named output directory.
pub const LAST_LINK: &str = "symtest-last";

/// Name of the run summary written by [OutputDirectory::write_info].
pub const INFO_FILE: &str = "info.json";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    KTest(#[from] ktest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One generated test as recorded in the run summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestRecord {
    pub file: String,
    pub outcome: ExecutionOutcome,
    pub exit_status: ExitStatus,
}

/// Summary of an exploration written next to the generated tests.
#[derive(Clone, Debug, Serialize)]
pub struct RunInfo {
    pub program: String,
    pub solver: String,
    pub config: ExplorerConfig,
    pub stats: ExplorationStats,
    pub tests: Vec<TestRecord>,
    pub errors: Vec<String>,
}

/// Directory receiving the KTEST files of one exploration.
#[derive(Clone, Debug)]
pub struct OutputDirectory {
    path: PathBuf,
}

impl OutputDirectory {
    /// Creates `path`, which must not exist yet. Missing parents are created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::create_dir(path)?;
        Ok(Self {
            path: path.to_owned(),
        })
    }

    /// Creates the first free `symtest-out-N` directory under `parent` and points
    /// [LAST_LINK] at it.
    pub fn create_next(parent: impl AsRef<Path>) -> Result<Self> {
        let parent = parent.as_ref();
        fs::create_dir_all(parent)?;

        let mut counter = 0;
        let path = loop {
            let candidate = parent.join(format!("{DEFAULT_PREFIX}{counter}"));
            match fs::create_dir(&candidate) {
                Ok(()) => break candidate,
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => counter += 1,
                Err(err) => return Err(err.into()),
            }
        };

        let output = Self { path };
        if let Err(err) = output.update_last_link(parent) {
            tracing::warn!("failed to update {LAST_LINK} link: {err}");
        }

        Ok(output)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the KTEST file for `vector`. Aborting paths also get a `.abort.err` file holding the
    /// abort message.
    pub fn write_test(
        &self,
        vector: &TestVector,
        outcome: &ExecutionOutcome,
        args: &[String],
    ) -> Result<PathBuf> {
        let path = self.path.join(vector.file_name());
        vector.to_ktest(args.to_vec()).to_file(&path)?;

        if let ExecutionOutcome::Abort(message) = outcome {
            let error_path = path.with_extension("abort.err");
            fs::write(error_path, format!("Error: abort\nMessage: {message}\n"))?;
        }

        tracing::debug!(path = %path.display(), "wrote test");
        Ok(path)
    }

    pub fn write_info(&self, info: &RunInfo) -> Result<()> {
        let json = serde_json::to_string_pretty(info)?;
        fs::write(self.path.join(INFO_FILE), json)?;
        Ok(())
    }

    #[cfg(unix)]
    fn update_last_link(&self, parent: &Path) -> io::Result<()> {
        let link = parent.join(LAST_LINK);
        match fs::remove_file(&link) {
            Ok(()) => (),
            Err(err) if err.kind() == io::ErrorKind::NotFound => (),
            Err(err) => return Err(err),
        }

        let target = self.path.file_name().map(PathBuf::from).unwrap_or_default();
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(not(unix))]
    fn update_last_link(&self, _parent: &Path) -> io::Result<()> {
        Ok(())
    }
}
