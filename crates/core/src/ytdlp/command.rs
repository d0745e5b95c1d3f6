//! Subprocess runner shared by the yt-dlp collaborators.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::batch::{EnumerationError, ItemError};

/// Captured output of a successful run.
#[derive(Debug)]
pub(crate) struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Why a run did not succeed.
#[derive(Debug)]
pub(crate) enum CommandError {
    NotFound { path: PathBuf },
    Io(std::io::Error),
    Timeout { timeout_secs: u64 },
    Failed { code: Option<i32>, stderr: String },
}

/// Runs `program` with `args`, killing it if it outlives `timeout_secs`.
pub(crate) async fn run(
    program: &Path,
    args: &[String],
    timeout_secs: u64,
) -> Result<CommandOutput, CommandError> {
    debug!(program = %program.display(), ?args, "Spawning process");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandError::NotFound {
                    path: program.to_path_buf(),
                }
            } else {
                CommandError::Io(e)
            }
        })?;

    // Dropping the wait future on timeout drops the child, which kills it.
    let output = match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(CommandError::Io(e)),
        Err(_) => return Err(CommandError::Timeout { timeout_secs }),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return Err(CommandError::Failed {
            code: output.status.code(),
            stderr,
        });
    }

    Ok(CommandOutput { stdout, stderr })
}

fn non_empty(stderr: String) -> Option<String> {
    if stderr.trim().is_empty() {
        None
    } else {
        Some(stderr)
    }
}

impl From<CommandError> for ItemError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::NotFound { path } => ItemError::ToolNotFound { path },
            CommandError::Io(e) => ItemError::Io(e),
            CommandError::Timeout { timeout_secs } => ItemError::Timeout { timeout_secs },
            CommandError::Failed { code, stderr } => ItemError::failed(
                format!("yt-dlp exited with code: {:?}", code),
                non_empty(stderr),
            ),
        }
    }
}

impl From<CommandError> for EnumerationError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::NotFound { path } => EnumerationError::ToolNotFound { path },
            CommandError::Io(e) => EnumerationError::Io(e),
            CommandError::Timeout { timeout_secs } => EnumerationError::Timeout { timeout_secs },
            CommandError::Failed { code, stderr } => EnumerationError::failed(
                format!("yt-dlp exited with code: {:?}", code),
                non_empty(stderr),
            ),
        }
    }
}
