//! File-backed catalog
//!
//! The whole catalog is one JSON document. Every mutation is applied to a
//! copy of the in-memory state, written to a sibling temporary file and
//! renamed over the original; the in-memory state is only replaced once the
//! rename succeeded, so a failed write leaves both views unchanged.

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::state::CatalogState;
use crate::catalog::traits::Catalog;
use crate::catalog::types::{OutputFile, Plugin, PluginInstance, PluginParameter};
use crate::core::version::catalog_schema_version;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct JsonFileCatalog {
    path: PathBuf,
    state: Mutex<CatalogState>,
}

fn storage_error(path: &Path, cause: impl std::fmt::Display) -> CatalogError {
    CatalogError::Storage {
        path: path.to_path_buf(),
        cause: cause.to_string(),
    }
}

impl JsonFileCatalog {
    /// Open the catalog at `path`, creating an empty one if it does not exist
    pub async fn open(path: impl Into<PathBuf>) -> CatalogResult<Self> {
        let path = path.into();
        let expected = catalog_schema_version();

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let state: CatalogState =
                    serde_json::from_slice(&bytes).map_err(|e| storage_error(&path, e))?;
                if state.schema_version != expected {
                    return Err(CatalogError::SchemaMismatch {
                        path,
                        found: state.schema_version,
                        expected,
                    });
                }
                log::debug!("Loaded catalog from {}", path.display());
                state
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Creating new catalog at {}", path.display());
                let state = CatalogState::new(expected);
                persist(&path, &state).await?;
                state
            }
            Err(e) => return Err(storage_error(&path, e)),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read<T>(&self, op: impl FnOnce(&CatalogState) -> CatalogResult<T>) -> CatalogResult<T> {
        let state = self.state.lock().await;
        op(&state)
    }

    async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut CatalogState) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let result = op(&mut next)?;
        persist(&self.path, &next).await?;
        *state = next;
        Ok(result)
    }
}

async fn persist(path: &Path, state: &CatalogState) -> CatalogResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| storage_error(path, e))?;
    }

    let bytes = serde_json::to_vec_pretty(state).map_err(|e| storage_error(path, e))?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| storage_error(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| storage_error(path, e))
}

#[async_trait]
impl Catalog for JsonFileCatalog {
    async fn create_plugin(&self, plugin: Plugin) -> CatalogResult<Plugin> {
        self.mutate(|s| s.create_plugin(plugin)).await
    }

    async fn get_plugin(&self, name: &str) -> CatalogResult<Plugin> {
        self.read(|s| s.get_plugin(name)).await
    }

    async fn save_plugin(&self, plugin: &Plugin) -> CatalogResult<()> {
        self.mutate(|s| s.save_plugin(plugin)).await
    }

    async fn delete_plugin(&self, name: &str) -> CatalogResult<()> {
        self.mutate(|s| s.delete_plugin(name)).await
    }

    async fn list_plugins(&self) -> CatalogResult<Vec<Plugin>> {
        self.read(|s| Ok(s.list_plugins())).await
    }

    async fn create_parameter(
        &self,
        parameter: PluginParameter,
    ) -> CatalogResult<PluginParameter> {
        self.mutate(|s| s.create_parameter(parameter)).await
    }

    async fn list_parameters(&self, plugin_name: &str) -> CatalogResult<Vec<PluginParameter>> {
        self.read(|s| s.list_parameters(plugin_name)).await
    }

    async fn create_instance(&self, instance: PluginInstance) -> CatalogResult<PluginInstance> {
        self.mutate(|s| s.create_instance(instance)).await
    }

    async fn get_instance(&self, id: u64) -> CatalogResult<PluginInstance> {
        self.read(|s| s.get_instance(id)).await
    }

    async fn save_instance(&self, instance: &PluginInstance) -> CatalogResult<()> {
        self.mutate(|s| s.save_instance(instance)).await
    }

    async fn register_output_files(
        &self,
        instance_id: u64,
        paths: Vec<PathBuf>,
    ) -> CatalogResult<Vec<OutputFile>> {
        self.mutate(|s| s.register_output_files(instance_id, paths))
            .await
    }

    async fn complete_instance(
        &self,
        instance: &PluginInstance,
        paths: Vec<PathBuf>,
    ) -> CatalogResult<Vec<OutputFile>> {
        self.mutate(|s| s.complete_instance(instance, paths)).await
    }

    async fn list_output_files(&self, instance_id: u64) -> CatalogResult<Vec<OutputFile>> {
        self.read(|s| s.list_output_files(instance_id)).await
    }
}
