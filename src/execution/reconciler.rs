//! Status Reconciler
//!
//! Folds the state of remote jobs back into the catalog. Once an instance is
//! terminal the reconciler stops asking the backend about it, so repeated
//! polls never register outputs twice.

use crate::catalog::api::{InstanceStatus, SharedCatalog};
use crate::execution::backend::{Backend, JobHandle, RemoteJobState};
use crate::execution::error::ExecutionResult;
use crate::execution::outputs::register_outputs;
use chrono::Utc;

#[derive(Clone)]
pub struct StatusReconciler {
    catalog: SharedCatalog,
    backend: Backend,
}

impl StatusReconciler {
    pub fn new(catalog: SharedCatalog, backend: Backend) -> Self {
        Self { catalog, backend }
    }

    /// Refresh the catalog status of the instance behind `handle`
    pub async fn poll(&self, handle: &JobHandle) -> ExecutionResult<InstanceStatus> {
        let mut instance = self.catalog.get_instance(handle.instance_id).await?;
        if instance.status.is_terminal() {
            return Ok(instance.status);
        }

        let next = match self.backend.poll(handle).await? {
            RemoteJobState::Queued => InstanceStatus::Queued,
            RemoteJobState::Running => InstanceStatus::Started,
            RemoteJobState::Succeeded => {
                register_outputs(&self.catalog, &mut instance).await?;
                return Ok(instance.status);
            }
            RemoteJobState::Failed => InstanceStatus::FinishedWithError,
            RemoteJobState::Cancelled => InstanceStatus::Cancelled,
            RemoteJobState::Unknown(status) => {
                log::warn!(
                    "Remote job '{}' reported unrecognised status '{}', keeping '{}'",
                    handle.job_id,
                    status,
                    instance.status
                );
                return Ok(instance.status);
            }
        };

        if next != instance.status {
            log::info!(
                "Instance {} moved from '{}' to '{}'",
                instance.id,
                instance.status,
                next
            );
            instance.status = next;
            if next.is_terminal() {
                instance.end_date = Some(Utc::now());
            }
            self.catalog.save_instance(&instance).await?;
        }
        Ok(instance.status)
    }

    pub async fn check_available(&self) -> ExecutionResult<bool> {
        self.backend.probe().await
    }

    pub async fn request_shutdown(&self) -> ExecutionResult<()> {
        self.backend.request_shutdown().await
    }
}
