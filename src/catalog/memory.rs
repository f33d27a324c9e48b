//! In-process catalog

use crate::catalog::error::CatalogResult;
use crate::catalog::state::CatalogState;
use crate::catalog::traits::Catalog;
use crate::catalog::types::{OutputFile, Plugin, PluginInstance, PluginParameter};
use crate::core::version::catalog_schema_version;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Catalog held entirely in memory
///
/// Cloning yields another handle onto the same records.
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(CatalogState::new(catalog_schema_version()))),
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn create_plugin(&self, plugin: Plugin) -> CatalogResult<Plugin> {
        self.state.write().await.create_plugin(plugin)
    }

    async fn get_plugin(&self, name: &str) -> CatalogResult<Plugin> {
        self.state.read().await.get_plugin(name)
    }

    async fn save_plugin(&self, plugin: &Plugin) -> CatalogResult<()> {
        self.state.write().await.save_plugin(plugin)
    }

    async fn delete_plugin(&self, name: &str) -> CatalogResult<()> {
        self.state.write().await.delete_plugin(name)
    }

    async fn list_plugins(&self) -> CatalogResult<Vec<Plugin>> {
        Ok(self.state.read().await.list_plugins())
    }

    async fn create_parameter(
        &self,
        parameter: PluginParameter,
    ) -> CatalogResult<PluginParameter> {
        self.state.write().await.create_parameter(parameter)
    }

    async fn list_parameters(&self, plugin_name: &str) -> CatalogResult<Vec<PluginParameter>> {
        self.state.read().await.list_parameters(plugin_name)
    }

    async fn create_instance(&self, instance: PluginInstance) -> CatalogResult<PluginInstance> {
        self.state.write().await.create_instance(instance)
    }

    async fn get_instance(&self, id: u64) -> CatalogResult<PluginInstance> {
        self.state.read().await.get_instance(id)
    }

    async fn save_instance(&self, instance: &PluginInstance) -> CatalogResult<()> {
        self.state.write().await.save_instance(instance)
    }

    async fn register_output_files(
        &self,
        instance_id: u64,
        paths: Vec<PathBuf>,
    ) -> CatalogResult<Vec<OutputFile>> {
        self.state
            .write()
            .await
            .register_output_files(instance_id, paths)
    }

    async fn complete_instance(
        &self,
        instance: &PluginInstance,
        paths: Vec<PathBuf>,
    ) -> CatalogResult<Vec<OutputFile>> {
        self.state.write().await.complete_instance(instance, paths)
    }

    async fn list_output_files(&self, instance_id: u64) -> CatalogResult<Vec<OutputFile>> {
        self.state.read().await.list_output_files(instance_id)
    }
}
