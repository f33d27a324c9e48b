//! Traits for the catalog collaborator

use crate::catalog::error::CatalogResult;
use crate::catalog::types::{OutputFile, Plugin, PluginInstance, PluginParameter};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Persistent registry of plugins, parameters, instances and output files
///
/// Lookups by key return [`CatalogError::NotFound`](crate::catalog::api::CatalogError)
/// rather than an empty option. Implementations enforce plugin name
/// uniqueness inside `create_plugin` and cascade `delete_plugin` to the
/// plugin's parameters.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Persist a new plugin, assigning its id
    async fn create_plugin(&self, plugin: Plugin) -> CatalogResult<Plugin>;

    async fn get_plugin(&self, name: &str) -> CatalogResult<Plugin>;

    /// Overwrite an existing plugin record
    async fn save_plugin(&self, plugin: &Plugin) -> CatalogResult<()>;

    /// Delete a plugin and its parameters
    async fn delete_plugin(&self, name: &str) -> CatalogResult<()>;

    async fn list_plugins(&self) -> CatalogResult<Vec<Plugin>>;

    async fn create_parameter(&self, parameter: PluginParameter)
        -> CatalogResult<PluginParameter>;

    /// Parameters of a plugin in creation order
    async fn list_parameters(&self, plugin_name: &str) -> CatalogResult<Vec<PluginParameter>>;

    async fn create_instance(&self, instance: PluginInstance) -> CatalogResult<PluginInstance>;

    async fn get_instance(&self, id: u64) -> CatalogResult<PluginInstance>;

    async fn save_instance(&self, instance: &PluginInstance) -> CatalogResult<()>;

    async fn register_output_files(
        &self,
        instance_id: u64,
        paths: Vec<PathBuf>,
    ) -> CatalogResult<Vec<OutputFile>>;

    /// Save `instance` and replace its output files in one step
    async fn complete_instance(
        &self,
        instance: &PluginInstance,
        paths: Vec<PathBuf>,
    ) -> CatalogResult<Vec<OutputFile>>;

    async fn list_output_files(&self, instance_id: u64) -> CatalogResult<Vec<OutputFile>>;
}

/// Catalog handle shared between the registrar, the runner and the reconciler
pub type SharedCatalog = Arc<dyn Catalog>;
