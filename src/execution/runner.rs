//! Run orchestration
//!
//! Ties the catalog, descriptor resolution, request compilation and backend
//! dispatch together for a single plugin instance.

use crate::catalog::api::{InstanceStatus, OutputFile, PluginInstance, SharedCatalog};
use crate::core::retry::{retry_async, RetryPolicy};
use crate::execution::backend::{Backend, DispatchOutcome, JobHandle};
use crate::execution::error::{ExecutionError, ExecutionResult};
use crate::execution::outputs::register_outputs;
use crate::execution::reconciler::StatusReconciler;
use crate::execution::request::{compile, DirectoryOverrides};
use crate::plugin::api::{DescriptorResolver, PluginError};
use chrono::Utc;

/// Caller-supplied settings for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub overrides: DirectoryOverrides,
    /// Defaults to one worker
    pub number_of_workers: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Synchronous run finished and its outputs were registered
    Completed { outputs: Vec<OutputFile> },
    /// Remote job accepted; poll it with the handle
    Submitted(JobHandle),
}

#[derive(Clone)]
pub struct PluginRunner {
    catalog: SharedCatalog,
    resolver: DescriptorResolver,
    backend: Backend,
}

impl PluginRunner {
    pub fn new(catalog: SharedCatalog, resolver: DescriptorResolver, backend: Backend) -> Self {
        Self {
            catalog,
            resolver,
            backend,
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Run a catalog instance with the given `(name, value)` parameters
    pub async fn run_plugin_instance(
        &self,
        instance_id: u64,
        parameter_values: &[(String, String)],
        options: &RunOptions,
    ) -> ExecutionResult<RunOutcome> {
        let mut instance = self.catalog.get_instance(instance_id).await?;
        let plugin = self
            .catalog
            .get_plugin(&instance.plugin_name)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ExecutionError::Plugin(PluginError::NotFound {
                        name: instance.plugin_name.clone(),
                    })
                } else {
                    ExecutionError::Catalog(e)
                }
            })?;
        let previous = match instance.previous_id {
            Some(id) => Some(self.catalog.get_instance(id).await?),
            None => None,
        };

        let descriptor = self.resolver.resolve(&plugin.dock_image).await?;
        let request = compile(
            &instance,
            previous.as_ref(),
            &plugin,
            &descriptor,
            parameter_values,
            &options.overrides,
            self.backend.kind(),
        )
        .with_workers(options.number_of_workers.unwrap_or(1));

        let completed = match self.backend.dispatch(&request).await {
            Ok(DispatchOutcome::Completed) => register_outputs(&self.catalog, &mut instance)
                .await
                .map(|outputs| RunOutcome::Completed { outputs }),
            Ok(DispatchOutcome::Submitted(handle)) => return Ok(RunOutcome::Submitted(handle)),
            Err(e) if self.backend.is_synchronous() => Err(e),
            Err(e) => return Err(e),
        };

        // synchronous runs always leave the instance terminal
        if let Err(e) = &completed {
            self.record_failure(&mut instance, e).await;
        }
        completed
    }

    async fn record_failure(&self, instance: &mut PluginInstance, error: &ExecutionError) {
        log::warn!("Instance {} failed: {}", instance.id, error);
        instance.status = InstanceStatus::FinishedWithError;
        instance.end_date = Some(Utc::now());
        if let Err(save) = self.catalog.save_instance(instance).await {
            log::error!("Failed to record failure of instance {}: {}", instance.id, save);
        }
    }

    /// Reconcile the catalog status of a remote job
    pub async fn check_plugin_instance_status(
        &self,
        handle: &JobHandle,
    ) -> ExecutionResult<InstanceStatus> {
        StatusReconciler::new(self.catalog.clone(), self.backend.clone())
            .poll(handle)
            .await
    }

    /// Cancel a remote job and close its instance
    ///
    /// An instance that already reached a terminal status is left as is.
    pub async fn cancel_plugin_instance(
        &self,
        handle: &JobHandle,
    ) -> ExecutionResult<InstanceStatus> {
        let mut instance = self.catalog.get_instance(handle.instance_id).await?;
        if instance.status.is_terminal() {
            return Ok(instance.status);
        }

        self.backend.cancel(handle).await?;
        instance.status = InstanceStatus::Cancelled;
        instance.end_date = Some(Utc::now());
        self.catalog.save_instance(&instance).await?;
        log::info!("Cancelled instance {} (job '{}')", instance.id, handle.job_id);
        Ok(instance.status)
    }

    /// Probe the backend until it reports available or the policy runs out
    pub async fn check_backend_available(&self, policy: RetryPolicy) -> ExecutionResult<()> {
        let kind = self.backend.kind();
        retry_async(&format!("probe {} backend", kind), policy, || async {
            match self.backend.probe().await {
                Ok(true) => Ok(()),
                Ok(false) => Err(ExecutionError::BackendUnavailable {
                    backend: kind,
                    cause: "backend reported it is not ready".to_string(),
                }),
                Err(e) => Err(e),
            }
        })
        .await?;
        log::info!("The {} backend is available", kind);
        Ok(())
    }

    pub async fn shutdown_backend(&self) -> ExecutionResult<()> {
        self.backend.request_shutdown().await?;
        log::info!("Requested shutdown of the {} backend", self.backend.kind());
        Ok(())
    }
}
