//! Subprocess invocation for the external collaborators.
//!
//! Each collaborator (slim-lint, the Tailwind sorter) is modeled as a
//! single call: spawn, pipe the input to stdin, capture stdout/stderr
//! and the exit status atomically. No timeouts and no cancellation —
//! the dispatch loop blocks for the duration by design.

use std::path::Path;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} not found in PATH")]
    NotFound { tool: String },
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error running {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one collaborator run.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run `program args...` with `stdin_data` piped to its stdin.
///
/// The program is resolved on PATH first so a missing tool surfaces as
/// [`ToolError::NotFound`] rather than a spawn error with no context.
pub(crate) async fn invoke(
    program: &str,
    args: &[String],
    cwd: &Path,
    stdin_data: &str,
) -> Result<ToolOutput, ToolError> {
    let resolved = which::which(program).map_err(|_| ToolError::NotFound {
        tool: program.to_string(),
    })?;

    let mut cmd = Command::new(&resolved);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| ToolError::Spawn {
        tool: program.to_string(),
        source,
    })?;

    // The stdin write must run concurrently with output capture: a
    // child that fills its stdout pipe before draining stdin would
    // otherwise deadlock against us filling the stdin pipe.
    let stdin = child.stdin.take();
    let write_stdin = async {
        if let Some(mut stdin) = stdin {
            match stdin.write_all(stdin_data.as_bytes()).await {
                Ok(()) => {}
                // The child exited or closed stdin early; its exit
                // status and output tell the real story.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e),
            }
            // Dropping stdin closes the pipe so the child sees EOF.
        }
        Ok(())
    };

    let (write_result, output) = tokio::join!(write_stdin, child.wait_with_output());
    write_result.map_err(|source| ToolError::Io {
        tool: program.to_string(),
        source,
    })?;
    let output = output.map_err(|source| ToolError::Io {
        tool: program.to_string(),
        source,
    })?;

    Ok(ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        status: output.status,
    })
}
