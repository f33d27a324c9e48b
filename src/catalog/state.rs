//! Catalog state shared by the in-memory and file-backed catalogs
//!
//! All integrity rules (unique plugin names, cascading deletes, owner
//! existence) live here so every implementation enforces them identically.

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::types::{OutputFile, Plugin, PluginInstance, PluginParameter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct CatalogState {
    pub schema_version: u32,
    next_id: u64,
    plugins: BTreeMap<String, Plugin>,
    parameters: Vec<PluginParameter>,
    instances: BTreeMap<u64, PluginInstance>,
    outputs: Vec<OutputFile>,
}

impl CatalogState {
    pub fn new(schema_version: u32) -> Self {
        Self {
            schema_version,
            ..Default::default()
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn create_plugin(&mut self, mut plugin: Plugin) -> CatalogResult<Plugin> {
        if self.plugins.contains_key(&plugin.name) {
            return Err(CatalogError::DuplicateName { name: plugin.name });
        }
        plugin.id = self.allocate_id();
        self.plugins.insert(plugin.name.clone(), plugin.clone());
        Ok(plugin)
    }

    pub fn get_plugin(&self, name: &str) -> CatalogResult<Plugin> {
        self.plugins
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("plugin", name))
    }

    pub fn save_plugin(&mut self, plugin: &Plugin) -> CatalogResult<()> {
        match self.plugins.get_mut(&plugin.name) {
            Some(stored) if stored.id == plugin.id => {
                *stored = plugin.clone();
                Ok(())
            }
            _ => Err(CatalogError::not_found("plugin", &plugin.name)),
        }
    }

    /// Remove a plugin together with its parameters
    pub fn delete_plugin(&mut self, name: &str) -> CatalogResult<()> {
        let plugin = self
            .plugins
            .remove(name)
            .ok_or_else(|| CatalogError::not_found("plugin", name))?;
        self.parameters.retain(|p| p.plugin_id != plugin.id);
        Ok(())
    }

    pub fn list_plugins(&self) -> Vec<Plugin> {
        self.plugins.values().cloned().collect()
    }

    pub fn create_parameter(
        &mut self,
        mut parameter: PluginParameter,
    ) -> CatalogResult<PluginParameter> {
        let owner = self.get_plugin(&parameter.plugin_name)?;
        if owner.id != parameter.plugin_id {
            return Err(CatalogError::not_found("plugin", parameter.plugin_id));
        }
        parameter.id = self.allocate_id();
        self.parameters.push(parameter.clone());
        Ok(parameter)
    }

    pub fn list_parameters(&self, plugin_name: &str) -> CatalogResult<Vec<PluginParameter>> {
        let owner = self.get_plugin(plugin_name)?;
        Ok(self
            .parameters
            .iter()
            .filter(|p| p.plugin_id == owner.id)
            .cloned()
            .collect())
    }

    pub fn create_instance(&mut self, mut instance: PluginInstance) -> CatalogResult<PluginInstance> {
        self.get_plugin(&instance.plugin_name)?;
        if let Some(previous_id) = instance.previous_id {
            self.get_instance(previous_id)?;
        }
        instance.id = self.allocate_id();
        self.instances.insert(instance.id, instance.clone());
        Ok(instance)
    }

    pub fn get_instance(&self, id: u64) -> CatalogResult<PluginInstance> {
        self.instances
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("plugin instance", id))
    }

    pub fn save_instance(&mut self, instance: &PluginInstance) -> CatalogResult<()> {
        let stored = self
            .instances
            .get_mut(&instance.id)
            .ok_or_else(|| CatalogError::not_found("plugin instance", instance.id))?;
        *stored = instance.clone();
        Ok(())
    }

    pub fn register_output_files(
        &mut self,
        instance_id: u64,
        paths: Vec<PathBuf>,
    ) -> CatalogResult<Vec<OutputFile>> {
        self.get_instance(instance_id)?;
        let mut registered = Vec::with_capacity(paths.len());
        for path in paths {
            let file = OutputFile {
                id: self.allocate_id(),
                instance_id,
                path,
            };
            self.outputs.push(file.clone());
            registered.push(file);
        }
        Ok(registered)
    }

    /// Store the final state of an instance together with its output files
    ///
    /// Rows previously registered for the instance are replaced.
    pub fn complete_instance(
        &mut self,
        instance: &PluginInstance,
        paths: Vec<PathBuf>,
    ) -> CatalogResult<Vec<OutputFile>> {
        self.get_instance(instance.id)?;
        self.outputs.retain(|f| f.instance_id != instance.id);
        let registered = self.register_output_files(instance.id, paths)?;
        self.save_instance(instance)?;
        Ok(registered)
    }

    pub fn list_output_files(&self, instance_id: u64) -> CatalogResult<Vec<OutputFile>> {
        self.get_instance(instance_id)?;
        Ok(self
            .outputs
            .iter()
            .filter(|f| f.instance_id == instance_id)
            .cloned()
            .collect())
    }
}
