//! Engine Process Spawning
//!
//! Builds the engine command: no arguments, no shell, the executable's own
//! directory as working directory, all three standard streams piped and no
//! console window on Windows.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::error::{Error, Result};
use crate::models::EngineProcess;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// A freshly spawned engine with its pipes split out
pub struct SpawnedEngine {
    pub child: Child,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
    pub process: EngineProcess,
}

/// Resolve `path` to an absolute path and the directory to run it in
pub fn resolve_executable(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let executable = std::path::absolute(path).map_err(|source| Error::SpawnFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let working_directory = executable
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((executable, working_directory))
}

/// Spawn the engine at `path`
pub fn spawn_engine(path: &Path) -> Result<SpawnedEngine> {
    let (executable, working_directory) = resolve_executable(path)?;

    debug!(
        path = %executable.display(),
        cwd = %working_directory.display(),
        "Spawning engine"
    );

    let mut cmd = Command::new(&executable);
    cmd.current_dir(&working_directory)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    let mut child = cmd.spawn().map_err(|source| Error::SpawnFailed {
        path: executable.clone(),
        source,
    })?;

    let stdin = child.stdin.take().ok_or(Error::PipeUnavailable("stdin"))?;
    let stdout = child.stdout.take().ok_or(Error::PipeUnavailable("stdout"))?;
    let stderr = child.stderr.take().ok_or(Error::PipeUnavailable("stderr"))?;

    let process = EngineProcess::started(executable, working_directory, child.id());
    info!(pid = ?process.pid, path = %process.executable.display(), "Engine spawned");

    Ok(SpawnedEngine {
        child,
        stdin,
        stdout,
        stderr,
        process,
    })
}
