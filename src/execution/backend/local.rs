//! Local synchronous backend
//!
//! Runs the plugin executable as a child process on this host and waits for
//! it to exit.

use crate::execution::backend::BackendKind;
use crate::execution::error::{ExecutionError, ExecutionResult};
use crate::execution::request::ExecutionRequest;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }

    fn failure(request: &ExecutionRequest, cause: String) -> ExecutionError {
        ExecutionError::BackendExecution {
            plugin: request.plugin_name.clone(),
            backend: BackendKind::Local,
            cause,
        }
    }

    pub(crate) async fn run(&self, request: &ExecutionRequest) -> ExecutionResult<()> {
        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|e| {
                Self::failure(
                    request,
                    format!(
                        "cannot create output directory {}: {}",
                        request.output_dir.display(),
                        e
                    ),
                )
            })?;

        let invocation = request.executable.invocation();
        let (program, leading) = invocation
            .split_first()
            .ok_or_else(|| Self::failure(request, "empty command line".to_string()))?;

        log::debug!(
            "Running {} {} {}",
            program,
            leading.join(" "),
            request.args.join(" ")
        );

        let output = Command::new(program)
            .args(leading)
            .args(&request.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Self::failure(request, format!("failed to spawn '{}': {}", program, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            log::debug!("{} stdout: {}", request.plugin_name, stdout.trim());
        }

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(Self::failure(
                request,
                format!("exited with {}: {}", output.status, stderr.trim()),
            ))
        }
    }
}
