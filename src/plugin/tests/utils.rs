//! Plugin Test Utilities
//!
//! Scripted container runtime and catalog wrappers shared by the plugin tests.

use crate::catalog::api::*;
use crate::plugin::descriptor::{ContainerRuntime, DescriptorResolver};
use crate::plugin::registrar::PluginRegistrar;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Container runtime answering from a table of image outputs
#[derive(Debug, Default)]
pub struct MockRuntime {
    outputs: Mutex<HashMap<String, Result<Vec<u8>, String>>>,
    pub fail_pull: bool,
    pub pulls: AtomicUsize,
    pub runs: AtomicUsize,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pull_failure(mut self) -> Self {
        self.fail_pull = true;
        self
    }

    pub fn set_descriptor(&self, image: &str, descriptor: &Value) {
        self.set_output(image, Ok(descriptor.to_string().into_bytes()));
    }

    pub fn set_output(&self, image: &str, output: Result<Vec<u8>, String>) {
        self.outputs
            .lock()
            .unwrap()
            .insert(image.to_string(), output);
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn pull(&self, image: &str) -> Result<(), String> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pull {
            Err(format!("registry unreachable for {}", image))
        } else {
            Ok(())
        }
    }

    async fn run(&self, image: &str) -> Result<Vec<u8>, String> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.outputs
            .lock()
            .unwrap()
            .get(image)
            .cloned()
            .unwrap_or_else(|| Err(format!("Unable to find image '{}' locally", image)))
    }
}

/// Descriptor of a filesystem plugin with one `--dir` parameter
pub fn fs_descriptor() -> Value {
    json!({
        "type": "fs",
        "selfexec": "simplefsapp.py",
        "selfpath": "/usr/src/simplefsapp",
        "execshell": "python3",
        "authors": "FNNDSC",
        "title": "Simple chris fs app",
        "category": "",
        "description": "A simple chris fs app demo",
        "documentation": "",
        "license": "Opensource (MIT)",
        "version": "0.1",
        "parameters": [
            {"name": "dir", "type": "path", "optional": true, "default": "./",
             "help": "look up directory", "flag": "--dir", "action": "store"}
        ]
    })
}

/// Descriptor of a data-consuming plugin with two parameters
pub fn ds_descriptor() -> Value {
    json!({
        "type": "ds",
        "selfexec": "simpledsapp.py",
        "selfpath": "/usr/src/simpledsapp",
        "execshell": "python3",
        "authors": "FNNDSC",
        "title": "Simple chris ds app",
        "category": "",
        "description": "A simple chris ds app demo",
        "documentation": "",
        "license": "Opensource (MIT)",
        "version": "0.1",
        "cpu_limit": "500m",
        "memory_limit": "1Gi",
        "parameters": [
            {"name": "prefix", "type": "str", "optional": false, "default": null,
             "help": "prefix for file names", "flag": "--prefix", "action": "store"},
            {"name": "sleepLength", "type": "int", "optional": true, "default": 0,
             "help": "time to sleep", "flag": "--sleepLength", "action": "store"}
        ]
    })
}

/// Registrar over the given catalog answering from `runtime`
pub fn registrar(catalog: SharedCatalog, runtime: Arc<MockRuntime>) -> PluginRegistrar {
    PluginRegistrar::new(catalog, DescriptorResolver::new(runtime))
}

/// Catalog whose parameter writes start failing after a number of successes
pub struct FlakyCatalog {
    inner: MemoryCatalog,
    parameter_budget: AtomicUsize,
}

impl FlakyCatalog {
    pub fn new(inner: MemoryCatalog, parameter_budget: usize) -> Self {
        Self {
            inner,
            parameter_budget: AtomicUsize::new(parameter_budget),
        }
    }
}

#[async_trait]
impl Catalog for FlakyCatalog {
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
        let remaining = self.parameter_budget.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(CatalogError::Storage {
                path: PathBuf::from("flaky"),
                cause: "disk full".to_string(),
            });
        }
        self.parameter_budget.store(remaining - 1, Ordering::SeqCst);
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
        self.inner.complete_instance(instance, paths).await
    }

    async fn list_output_files(&self, instance_id: u64) -> CatalogResult<Vec<OutputFile>> {
        self.inner.list_output_files(instance_id).await
    }
}
