//! Execution Test Utilities
//!
//! Catalog fixtures, a scripted compute service and shell-script plugins.

use crate::catalog::api::*;
use crate::execution::backend::{ComputeService, JobSpec};
use crate::plugin::api::{DescriptorResolver, PluginType};
use crate::plugin::tests::utils::MockRuntime;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const FS_IMAGE: &str = "fnndsc/pl-simplefsapp";
pub const DS_IMAGE: &str = "fnndsc/pl-simpledsapp";

/// Compute service answering from scripted state
#[derive(Debug, Default)]
pub struct FakeComputeService {
    pub submitted: Mutex<Vec<JobSpec>>,
    pub status: Mutex<String>,
    pub status_calls: AtomicUsize,
    pub availability: Mutex<VecDeque<bool>>,
    pub probe_calls: AtomicUsize,
    pub reject_submissions: AtomicBool,
    pub shutdown_requested: AtomicBool,
    pub cancelled: Mutex<Vec<String>>,
}

impl FakeComputeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, status: &str) {
        *self.status.lock().unwrap() = status.to_string();
    }

    pub fn script_availability(&self, answers: &[bool]) {
        *self.availability.lock().unwrap() = answers.iter().copied().collect();
    }
}

#[async_trait]
impl ComputeService for FakeComputeService {
    async fn submit(&self, job: &JobSpec) -> Result<String, String> {
        if self.reject_submissions.load(Ordering::SeqCst) {
            return Err("HTTP 503 - Service Unavailable".to_string());
        }
        self.submitted.lock().unwrap().push(job.clone());
        Ok(job.jid.clone())
    }

    async fn status(&self, _job_id: &str) -> Result<String, String> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.status.lock().unwrap().clone())
    }

    async fn cancel(&self, job_id: &str) -> Result<(), String> {
        self.cancelled.lock().unwrap().push(job_id.to_string());
        Ok(())
    }

    async fn check_available(&self) -> Result<bool, String> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.availability.lock().unwrap().pop_front().unwrap_or(false))
    }

    async fn request_shutdown(&self) -> Result<(), String> {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Descriptor of a plugin implemented by `script` run through `sh`
pub fn script_descriptor(plugin_type: &str, selfexec: &str, dir: &Path) -> Value {
    json!({
        "type": plugin_type,
        "selfexec": selfexec,
        "selfpath": dir.to_string_lossy(),
        "execshell": "sh",
        "title": "script plugin",
        "parameters": [
            {"name": "message", "type": "str", "optional": true, "default": "hi",
             "help": "text to write", "flag": "--message", "action": "store"},
            {"name": "loud", "type": "bool", "optional": true, "default": false,
             "help": "shout", "flag": "--loud", "action": "store_true"}
        ]
    })
}

/// Temporary workspace holding scripts, outputs and a seeded catalog
pub struct Workspace {
    pub dir: TempDir,
    pub catalog: MemoryCatalog,
    pub runtime: Arc<MockRuntime>,
    counter: AtomicUsize,
}

impl Workspace {
    /// Catalog with `simplefsapp` and `simpledsapp` registered
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let catalog = MemoryCatalog::new();
        let runtime = Arc::new(MockRuntime::new());

        // fs: writes the message into <out>/sub/result.txt
        std::fs::write(
            dir.path().join("simplefsapp.sh"),
            "out=\"$1\"\nmkdir -p \"$out/sub\"\necho \"$@\" > \"$out/sub/result.txt\"\n",
        )
        .unwrap();
        // ds: copies every input file into the output directory
        std::fs::write(
            dir.path().join("simpledsapp.sh"),
            "cp \"$1\"/* \"$2\"/\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.sh"), "echo boom >&2\nexit 3\n").unwrap();

        runtime.set_descriptor(
            FS_IMAGE,
            &script_descriptor("fs", "simplefsapp.sh", dir.path()),
        );
        runtime.set_descriptor(
            DS_IMAGE,
            &script_descriptor("ds", "simpledsapp.sh", dir.path()),
        );

        let mut fs = Plugin::new("simplefsapp", FS_IMAGE, PluginType::Fs);
        fs.cpu_limit = "500m".to_string();
        catalog.create_plugin(fs).await.unwrap();
        catalog
            .create_plugin(Plugin::new("simpledsapp", DS_IMAGE, PluginType::Ds))
            .await
            .unwrap();

        Self {
            dir,
            catalog,
            runtime,
            counter: AtomicUsize::new(0),
        }
    }

    pub fn shared(&self) -> SharedCatalog {
        Arc::new(self.catalog.clone())
    }

    pub fn resolver(&self) -> DescriptorResolver {
        DescriptorResolver::new(self.runtime.clone())
    }

    /// Handle onto the same records whose completion step fails `failures` times
    pub fn unreliable(&self, failures: usize) -> SharedCatalog {
        Arc::new(UnreliableCatalog::new(self.catalog.clone(), failures))
    }

    pub fn output_dir(&self, name: &str) -> PathBuf {
        self.dir.path().join("outputs").join(name)
    }

    /// Point the fs plugin image at the failing script
    pub fn break_fs_plugin(&self) {
        self.runtime.set_descriptor(
            FS_IMAGE,
            &script_descriptor("fs", "broken.sh", self.dir.path()),
        );
    }

    pub async fn instance(&self, plugin: &str, previous: Option<u64>) -> PluginInstance {
        let label = format!("{}-{}", plugin, self.counter.fetch_add(1, Ordering::SeqCst));
        let mut instance = PluginInstance::new(plugin, "chris", self.output_dir(&label));
        if let Some(id) = previous {
            instance = instance.with_previous(id);
        }
        self.catalog.create_instance(instance).await.unwrap()
    }
}

/// Catalog whose `complete_instance` fails the first `failures` times
pub struct UnreliableCatalog {
    inner: MemoryCatalog,
    failures: AtomicUsize,
}

impl UnreliableCatalog {
    pub fn new(inner: MemoryCatalog, failures: usize) -> Self {
        Self {
            inner,
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl Catalog for UnreliableCatalog {
    async fn create_plugin(&self, plugin: Plugin) -> CatalogResult<Plugin> {
        self.inner.create_plugin(plugin).await
    }

    async fn get_plugin(&self, name: &str) -> CatalogResult<Plugin> {
        self.inner.get_plugin(name).await
    }

    async fn save_plugin(&self, plugin: &Plugin) -> CatalogResult<()> {
        self.inner.save_plugin(plugin).await
    }

    async fn delete_plugin(&self, name: &str) -> CatalogResult<()> {
        self.inner.delete_plugin(name).await
    }

    async fn list_plugins(&self) -> CatalogResult<Vec<Plugin>> {
        self.inner.list_plugins().await
    }

    async fn create_parameter(
        &self,
        parameter: PluginParameter,
    ) -> CatalogResult<PluginParameter> {
        self.inner.create_parameter(parameter).await
    }

    async fn list_parameters(&self, plugin_name: &str) -> CatalogResult<Vec<PluginParameter>> {
        self.inner.list_parameters(plugin_name).await
    }

    async fn create_instance(&self, instance: PluginInstance) -> CatalogResult<PluginInstance> {
        self.inner.create_instance(instance).await
    }

    async fn get_instance(&self, id: u64) -> CatalogResult<PluginInstance> {
        self.inner.get_instance(id).await
    }

    async fn save_instance(&self, instance: &PluginInstance) -> CatalogResult<()> {
        self.inner.save_instance(instance).await
    }

    async fn register_output_files(
        &self,
        instance_id: u64,
        paths: Vec<PathBuf>,
    ) -> CatalogResult<Vec<OutputFile>> {
        self.inner.register_output_files(instance_id, paths).await
    }

    async fn complete_instance(
        &self,
        instance: &PluginInstance,
        paths: Vec<PathBuf>,
    ) -> CatalogResult<Vec<OutputFile>> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(CatalogError::Storage {
                path: PathBuf::from("unreliable"),
                cause: "disk full".to_string(),
            });
        }
        self.inner.complete_instance(instance, paths).await
    }

    async fn list_output_files(&self, instance_id: u64) -> CatalogResult<Vec<OutputFile>> {
        self.inner.list_output_files(instance_id).await
    }
}

pub fn values(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
