//! Descriptor Resolution
//!
//! Obtains a plugin's self-description by running its container image with no
//! arguments and parsing what it prints on stdout.

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::types::PluginDescriptor;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

/// Container runtime seam used to obtain descriptors
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Fetch the latest version of `image` from its registry
    async fn pull(&self, image: &str) -> Result<(), String>;

    /// Run `image` with no arguments in a transient container and return stdout
    async fn run(&self, image: &str) -> Result<Vec<u8>, String>;
}

/// Container runtime driving the docker command line
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn invoke(&self, args: &[&str]) -> Result<Vec<u8>, String> {
        log::debug!("Running {} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| format!("failed to launch '{}': {}", self.program, e))?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!(
                "'{} {}' exited with {}: {}",
                self.program,
                args.first().copied().unwrap_or_default(),
                output.status,
                stderr.trim()
            ))
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn pull(&self, image: &str) -> Result<(), String> {
        self.invoke(&["pull", image]).await.map(|_| ())
    }

    async fn run(&self, image: &str) -> Result<Vec<u8>, String> {
        // --rm removes the container whether or not the run succeeded
        self.invoke(&["run", "--rm", image]).await
    }
}

/// Resolves plugin descriptors from container images
#[derive(Clone)]
pub struct DescriptorResolver {
    runtime: Arc<dyn ContainerRuntime>,
}

impl std::fmt::Debug for DescriptorResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorResolver").finish_non_exhaustive()
    }
}

impl DescriptorResolver {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Pull, run and parse the descriptor of `image`
    ///
    /// A failed pull is not fatal: the locally cached image, if any, is used.
    pub async fn resolve(&self, image: &str) -> PluginResult<PluginDescriptor> {
        if let Err(cause) = self.runtime.pull(image).await {
            log::warn!(
                "Could not pull '{}', falling back to the local image: {}",
                image,
                cause
            );
        }

        let stdout =
            self.runtime
                .run(image)
                .await
                .map_err(|cause| PluginError::ContainerRuntime {
                    image: image.to_string(),
                    cause,
                })?;

        let descriptor = PluginDescriptor::from_slice(&stdout).map_err(|reason| {
            PluginError::InvalidDescriptor {
                image: image.to_string(),
                reason,
            }
        })?;

        log::debug!(
            "Resolved descriptor for '{}': {} ({}), {} parameters",
            image,
            descriptor.selfexec,
            descriptor.plugin_type,
            descriptor.parameters.len()
        );
        Ok(descriptor)
    }
}
