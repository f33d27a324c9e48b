//! Asynchronous remote backend
//!
//! Jobs are submitted to a compute service and tracked by job id. The
//! service owns scheduling; this side only describes the job and asks about
//! its state.

use crate::execution::backend::{BackendKind, JobHandle};
use crate::execution::error::{ExecutionError, ExecutionResult};
use crate::execution::request::ExecutionRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default prefix of remote job ids
pub const DEFAULT_JOB_PREFIX: &str = "plugctl-jid-";

/// Job description sent to the compute service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub jid: String,
    pub image: String,
    pub plugin_name: String,
    pub plugin_type: String,
    /// Program and leading arguments
    pub entrypoint: Vec<String>,
    pub args: Vec<String>,
    pub input_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub cpu_limit: String,
    pub memory_limit: String,
    pub number_of_workers: u32,
    pub owner: String,
}

impl JobSpec {
    pub fn from_request(job_id: &str, request: &ExecutionRequest) -> Self {
        Self {
            jid: job_id.to_string(),
            image: request.image.clone(),
            plugin_name: request.plugin_name.clone(),
            plugin_type: request.plugin_type.to_string(),
            entrypoint: request.executable.invocation(),
            args: request.args.clone(),
            input_dir: request.catalog_input_dir.clone(),
            output_dir: request.catalog_output_dir.clone(),
            cpu_limit: request.cpu_limit.clone(),
            memory_limit: request.memory_limit.clone(),
            number_of_workers: request.number_of_workers,
            owner: request.owner.clone(),
        }
    }
}

/// Job state reported by the compute service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteJobState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    Unknown(String),
}

impl RemoteJobState {
    pub fn from_status(status: &str) -> Self {
        match status {
            "queued" | "pending" => RemoteJobState::Queued,
            "started" | "running" => RemoteJobState::Running,
            "finishedSuccessfully" | "finished" | "success" | "completed" => {
                RemoteJobState::Succeeded
            }
            "finishedWithError" | "error" | "failed" => RemoteJobState::Failed,
            "cancelled" | "canceled" => RemoteJobState::Cancelled,
            other => RemoteJobState::Unknown(other.to_string()),
        }
    }
}

/// Remote compute protocol
#[async_trait]
pub trait ComputeService: Send + Sync {
    /// Submit a job, returning the id the service assigned
    async fn submit(&self, job: &JobSpec) -> Result<String, String>;

    /// Raw status string of a job
    async fn status(&self, job_id: &str) -> Result<String, String>;

    async fn cancel(&self, job_id: &str) -> Result<(), String>;

    async fn check_available(&self) -> Result<bool, String>;

    async fn request_shutdown(&self) -> Result<(), String>;
}

/// Compute service reached over HTTP with JSON bodies
#[derive(Debug, Clone)]
pub struct HttpComputeService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpComputeService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    async fn checked(
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<reqwest::Response, String> {
        let response = response.map_err(|e| format!("Network request failed: {}", e))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(format!(
                "HTTP {} - {}",
                status.as_u16(),
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error").to_string()
                } else {
                    body
                }
            ))
        }
    }

    async fn json_field(response: reqwest::Response, field: &str) -> Result<String, String> {
        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to read response body: {}", e))?;
        body.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| format!("response has no '{}' field: {}", field, body))
    }
}

#[async_trait]
impl ComputeService for HttpComputeService {
    async fn submit(&self, job: &JobSpec) -> Result<String, String> {
        let response =
            Self::checked(self.client.post(self.url("jobs")).json(job).send().await).await?;
        Self::json_field(response, "jid").await
    }

    async fn status(&self, job_id: &str) -> Result<String, String> {
        let url = self.url(&format!("jobs/{}", job_id));
        let response = Self::checked(self.client.get(url).send().await).await?;
        Self::json_field(response, "status").await
    }

    async fn cancel(&self, job_id: &str) -> Result<(), String> {
        let url = self.url(&format!("jobs/{}", job_id));
        Self::checked(self.client.delete(url).send().await)
            .await
            .map(|_| ())
    }

    async fn check_available(&self) -> Result<bool, String> {
        match self.client.get(self.url("health")).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => Err(format!("Network request failed: {}", e)),
        }
    }

    async fn request_shutdown(&self) -> Result<(), String> {
        Self::checked(self.client.post(self.url("shutdown")).send().await)
            .await
            .map(|_| ())
    }
}

#[derive(Clone)]
pub struct RemoteBackend {
    service: Arc<dyn ComputeService>,
    job_prefix: String,
}

impl std::fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("job_prefix", &self.job_prefix)
            .finish_non_exhaustive()
    }
}

impl RemoteBackend {
    pub fn new(service: Arc<dyn ComputeService>) -> Self {
        Self {
            service,
            job_prefix: DEFAULT_JOB_PREFIX.to_string(),
        }
    }

    pub fn with_job_prefix(mut self, prefix: &str) -> Self {
        self.job_prefix = prefix.to_string();
        self
    }

    pub fn job_id(&self, instance_id: u64) -> String {
        format!("{}{}", self.job_prefix, instance_id)
    }

    fn unavailable(cause: String) -> ExecutionError {
        ExecutionError::BackendUnavailable {
            backend: BackendKind::Remote,
            cause,
        }
    }

    pub(crate) async fn submit(&self, request: &ExecutionRequest) -> ExecutionResult<JobHandle> {
        let job_id = self.job_id(request.instance_id);
        let spec = JobSpec::from_request(&job_id, request);

        let assigned = self.service.submit(&spec).await.map_err(Self::unavailable)?;
        let job_id = if assigned.is_empty() { job_id } else { assigned };
        log::info!(
            "Submitted instance {} as remote job '{}'",
            request.instance_id,
            job_id
        );

        Ok(JobHandle {
            job_id,
            instance_id: request.instance_id,
        })
    }

    pub(crate) async fn status(&self, handle: &JobHandle) -> ExecutionResult<RemoteJobState> {
        let status = self
            .service
            .status(&handle.job_id)
            .await
            .map_err(Self::unavailable)?;
        log::debug!("Remote job '{}' reports '{}'", handle.job_id, status);
        Ok(RemoteJobState::from_status(&status))
    }

    pub async fn cancel(&self, handle: &JobHandle) -> ExecutionResult<()> {
        self.service
            .cancel(&handle.job_id)
            .await
            .map_err(Self::unavailable)
    }

    pub(crate) async fn check_available(&self) -> ExecutionResult<bool> {
        self.service.check_available().await.map_err(Self::unavailable)
    }

    pub(crate) async fn request_shutdown(&self) -> ExecutionResult<()> {
        self.service
            .request_shutdown()
            .await
            .map_err(Self::unavailable)
    }
}
