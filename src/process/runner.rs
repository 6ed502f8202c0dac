//! Subprocess execution behind a mockable trait.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::SubprocessError;

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn new(code: Option<i32>, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Convert a non-zero exit into a [`SubprocessError::NonZeroExit`].
    pub fn into_result(self, program: &str) -> Result<ProcessOutput, SubprocessError> {
        if self.success() {
            Ok(self)
        } else {
            Err(SubprocessError::NonZeroExit {
                program: program.to_string(),
                code: self.code,
                stderr: self.stderr,
            })
        }
    }
}

/// Trait for running external commands.
///
/// Every VCS and LLM call goes through this abstraction so tests can swap
/// the real subprocesses for a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run a command to completion, capturing stdout and stderr.
    ///
    /// A non-zero exit is not an error here; callers inspect
    /// [`ProcessOutput::success`].
    async fn output(&self, program: &str, args: &[String]) -> Result<ProcessOutput, SubprocessError>;

    /// Run a command with `input` on stdin while its stdout and stderr stream
    /// straight to ours.
    async fn pipe_through(
        &self,
        program: &str,
        args: &[String],
        input: &str,
        limit: Duration,
    ) -> Result<(), SubprocessError>;
}

/// Runner that spawns real processes in a fixed working directory.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    workdir: PathBuf,
}

impl SystemRunner {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

fn spawn_error(program: &str, source: std::io::Error) -> SubprocessError {
    if source.kind() == ErrorKind::NotFound {
        SubprocessError::NotInstalled {
            program: program.to_string(),
        }
    } else {
        SubprocessError::SpawnFailed {
            program: program.to_string(),
            source,
        }
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn output(&self, program: &str, args: &[String]) -> Result<ProcessOutput, SubprocessError> {
        debug!("Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| spawn_error(program, e))?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn pipe_through(
        &self,
        program: &str,
        args: &[String],
        input: &str,
        limit: Duration,
    ) -> Result<(), SubprocessError> {
        debug!("Running {} with {} args and {} bytes on stdin", program, args.len(), input.len());

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(program, e))?;

        let stdin = child.stdin.take();
        let run = async {
            if let Some(mut pipe) = stdin {
                // A child that exits without reading all of stdin is judged
                // by its exit status, not by the broken pipe.
                match pipe.write_all(input.as_bytes()).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                    Err(e) => {
                        return Err(SubprocessError::Io {
                            program: program.to_string(),
                            source: e,
                        });
                    }
                }
                drop(pipe);
            }
            child.wait().await.map_err(|e| SubprocessError::Io {
                program: program.to_string(),
                source: e,
            })
        };

        let status = timeout(limit, run)
            .await
            .map_err(|_| SubprocessError::Timeout {
                program: program.to_string(),
                secs: limit.as_secs(),
            })??;

        if !status.success() {
            return Err(SubprocessError::NonZeroExit {
                program: program.to_string(),
                code: status.code(),
                stderr: String::new(),
            });
        }

        Ok(())
    }
}
