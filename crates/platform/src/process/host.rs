//! Host process operations backed by `tokio::process`

use async_trait::async_trait;
use portpatch_errors::{Error, PlatformError};
use portpatch_events::EventEmitter;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use super::{CommandOutput, PlatformCommand, ProcessOperations};
use crate::context::PlatformContext;

/// Runs programs on the host, resolving them through `PATH`
#[derive(Debug, Default, Clone, Copy)]
pub struct HostProcessOperations;

impl HostProcessOperations {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessOperations for HostProcessOperations {
    async fn execute_command(
        &self,
        ctx: &PlatformContext,
        cmd: PlatformCommand,
    ) -> Result<CommandOutput, Error> {
        let start = Instant::now();
        let shown = cmd.display();
        ctx.emit_debug(format!("exec: {shown}"));

        let mut command = Command::new(cmd.program());
        command
            .args(cmd.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cmd.get_current_dir() {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| {
            let err = if e.kind() == std::io::ErrorKind::NotFound {
                PlatformError::CommandNotFound {
                    command: cmd.program().to_string(),
                }
            } else {
                PlatformError::ProcessExecutionFailed {
                    command: shown.clone(),
                    message: e.to_string(),
                }
            };
            ctx.emit_operation_failed(format!("exec {}", cmd.program()), err.to_string());
            err
        })?;

        debug!(
            command = %shown,
            exit_code = ?output.status.code(),
            elapsed_ms = start.elapsed().as_millis(),
            "process finished"
        );

        Ok(CommandOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    async fn which(&self, program: &str) -> Result<PathBuf, Error> {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 {
            return if is_executable(candidate).await {
                Ok(candidate.to_path_buf())
            } else {
                Err(PlatformError::CommandNotFound {
                    command: program.to_string(),
                }
                .into())
            };
        }

        let path_var = std::env::var_os("PATH").unwrap_or_default();
        for dir in std::env::split_paths(&path_var) {
            let full = dir.join(program);
            if is_executable(&full).await {
                return Ok(full);
            }
        }

        Err(PlatformError::CommandNotFound {
            command: program.to_string(),
        }
        .into())
    }
}

#[cfg(unix)]
async fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
async fn is_executable(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
