//! Backend Dispatcher
//!
//! A backend is a tagged variant carrying only its own connection data. The
//! local and in-process backends run to completion during `dispatch`; the
//! remote backend returns a [`JobHandle`] immediately and is polled later.

pub(crate) mod internal;
pub(crate) mod local;
pub(crate) mod remote;

use crate::execution::error::{ExecutionError, ExecutionResult};
use crate::execution::request::ExecutionRequest;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub use internal::{InProcessEntry, InProcessFn, InternalBackend};
pub use local::LocalBackend;
pub use remote::{ComputeService, HttpComputeService, JobSpec, RemoteBackend, RemoteJobState};

/// Backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    Local,
    Internal,
    Remote,
}

/// Reference to an in-flight remote job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
    pub instance_id: u64,
}

/// Result of a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Synchronous backend finished the run
    Completed,
    /// Asynchronous backend accepted the job
    Submitted(JobHandle),
}

#[derive(Clone)]
pub enum Backend {
    Local(LocalBackend),
    Internal(InternalBackend),
    Remote(RemoteBackend),
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Backend").field(&self.kind()).finish()
    }
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Local(_) => BackendKind::Local,
            Backend::Internal(_) => BackendKind::Internal,
            Backend::Remote(_) => BackendKind::Remote,
        }
    }

    pub fn is_synchronous(&self) -> bool {
        !matches!(self, Backend::Remote(_))
    }

    /// Hand a compiled request to the backend
    ///
    /// Never writes to the catalog.
    pub async fn dispatch(&self, request: &ExecutionRequest) -> ExecutionResult<DispatchOutcome> {
        if request.plugin_type.consumes_input() && request.input_dir.is_none() {
            return Err(ExecutionError::MissingInputDirectory {
                plugin: request.plugin_name.clone(),
            });
        }

        log::info!(
            "Dispatching instance {} of '{}' to the {} backend",
            request.instance_id,
            request.plugin_name,
            self.kind()
        );

        match self {
            Backend::Local(local) => local.run(request).await.map(|_| DispatchOutcome::Completed),
            Backend::Internal(internal) => internal
                .run(request)
                .await
                .map(|_| DispatchOutcome::Completed),
            Backend::Remote(remote) => remote.submit(request).await.map(DispatchOutcome::Submitted),
        }
    }

    /// Query the state of a remote job
    pub async fn poll(&self, handle: &JobHandle) -> ExecutionResult<RemoteJobState> {
        match self {
            Backend::Remote(remote) => remote.status(handle).await,
            _ => Err(ExecutionError::Unsupported {
                backend: self.kind(),
                operation: "poll",
            }),
        }
    }

    /// Withdraw a remote job
    pub async fn cancel(&self, handle: &JobHandle) -> ExecutionResult<()> {
        match self {
            Backend::Remote(remote) => remote.cancel(handle).await,
            _ => Err(ExecutionError::Unsupported {
                backend: self.kind(),
                operation: "cancel",
            }),
        }
    }

    /// Report whether the backend can accept work
    pub async fn probe(&self) -> ExecutionResult<bool> {
        match self {
            Backend::Local(_) => Ok(true),
            Backend::Internal(internal) => Ok(internal.has_entries()),
            Backend::Remote(remote) => remote.check_available().await,
        }
    }

    /// Ask the backend's service to shut down
    pub async fn request_shutdown(&self) -> ExecutionResult<()> {
        match self {
            Backend::Remote(remote) => remote.request_shutdown().await,
            _ => Err(ExecutionError::Unsupported {
                backend: self.kind(),
                operation: "shutdown",
            }),
        }
    }
}
