//! Plugin Catalog Registrar
//!
//! Admits plugins into the catalog from their container images, refreshes
//! them from a newer image and removes them. Admission is persist, validate,
//! then delete on failure: the catalog trait has no multi-step transaction, so
//! the compensating delete is what keeps a rejected plugin out of the catalog.

use crate::catalog::api::{CatalogError, Plugin, PluginParameter, SharedCatalog};
use crate::plugin::descriptor::DescriptorResolver;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::types::{ParameterDescriptor, PluginDescriptor};
use crate::plugin::validation::PluginValidator;
use chrono::Utc;
use std::collections::HashSet;

/// Map a catalog lookup failure for `name` into the plugin error vocabulary
fn lookup_error(name: &str, error: CatalogError) -> PluginError {
    if error.is_not_found() {
        PluginError::NotFound {
            name: name.to_string(),
        }
    } else {
        PluginError::Catalog(error)
    }
}

/// Copy the descriptor-sourced fields onto a plugin record
///
/// Optional resource fields only replace the current value when the
/// descriptor reports them. The plugin type and image are left alone.
fn apply_descriptor(plugin: &mut Plugin, descriptor: &PluginDescriptor) {
    plugin.authors = descriptor.authors.clone();
    plugin.title = descriptor.title.clone();
    plugin.category = descriptor.category.clone();
    plugin.description = descriptor.description.clone();
    plugin.documentation = descriptor.documentation.clone();
    plugin.license = descriptor.license.clone();
    plugin.version = descriptor.version.clone();

    if let Some(min) = descriptor.min_number_of_workers {
        plugin.min_number_of_workers = min;
    }
    if let Some(max) = descriptor.max_number_of_workers {
        plugin.max_number_of_workers = max;
    }
    if let Some(cpu) = &descriptor.cpu_limit {
        plugin.cpu_limit = cpu.clone();
    }
    if let Some(memory) = &descriptor.memory_limit {
        plugin.memory_limit = memory.clone();
    }
}

fn to_parameter(plugin: &Plugin, declared: &ParameterDescriptor) -> PluginParameter {
    PluginParameter {
        id: 0,
        plugin_id: plugin.id,
        plugin_name: plugin.name.clone(),
        name: declared.name.clone(),
        param_type: declared.param_type,
        optional: declared.optional,
        default: declared.default_as_string(),
        help: declared.help.clone(),
        flag: declared.flag.clone(),
        action: declared.action,
    }
}

/// Registers, refreshes and removes catalog plugins
#[derive(Clone)]
pub struct PluginRegistrar {
    catalog: SharedCatalog,
    resolver: DescriptorResolver,
    validator: PluginValidator,
}

impl PluginRegistrar {
    pub fn new(catalog: SharedCatalog, resolver: DescriptorResolver) -> Self {
        let validator = PluginValidator::new(catalog.clone());
        Self {
            catalog,
            resolver,
            validator,
        }
    }

    /// Register the plugin shipped in `image`
    pub async fn add_plugin(&self, image: &str) -> PluginResult<Plugin> {
        let descriptor = self.resolver.resolve(image).await?;
        let name = descriptor.name();

        match self.catalog.get_plugin(&name).await {
            Ok(_) => return Err(PluginError::DuplicateName { name }),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(PluginError::Catalog(e)),
        }

        let mut plugin = Plugin::new(&name, image, descriptor.plugin_type);
        apply_descriptor(&mut plugin, &descriptor);

        let plugin = self
            .catalog
            .create_plugin(plugin)
            .await
            .map_err(|e| match e {
                // lost a race against a concurrent registration
                CatalogError::DuplicateName { name } => PluginError::DuplicateName { name },
                other => PluginError::Catalog(other),
            })?;

        self.validator.validate(&plugin).await?;

        for declared in &descriptor.parameters {
            if let Err(e) = self
                .catalog
                .create_parameter(to_parameter(&plugin, declared))
                .await
            {
                log::warn!(
                    "Failed to store parameter '{}' of '{}', removing plugin",
                    declared.name,
                    name
                );
                if let Err(cleanup) = self.catalog.delete_plugin(&name).await {
                    log::error!("Failed to remove plugin '{}': {}", name, cleanup);
                }
                return Err(PluginError::Catalog(e));
            }
        }

        log::info!(
            "Registered plugin '{}' ({}) from '{}' with {} parameters",
            plugin.name,
            plugin.plugin_type,
            image,
            descriptor.parameters.len()
        );
        Ok(plugin)
    }

    /// Refresh a registered plugin from a newer build of its image
    ///
    /// Descriptor fields are overwritten; parameters are append-only.
    pub async fn update_plugin(&self, image: &str) -> PluginResult<Plugin> {
        let descriptor = self.resolver.resolve(image).await?;
        let name = descriptor.name();

        let mut plugin = self
            .catalog
            .get_plugin(&name)
            .await
            .map_err(|e| lookup_error(&name, e))?;

        if descriptor.plugin_type != plugin.plugin_type {
            log::warn!(
                "Ignoring plugin type change of '{}' from {} to {}",
                name,
                plugin.plugin_type,
                descriptor.plugin_type
            );
        }
        if image != plugin.dock_image {
            log::warn!(
                "Plugin '{}' stays bound to image '{}' (update requested from '{}')",
                name,
                plugin.dock_image,
                image
            );
        }

        apply_descriptor(&mut plugin, &descriptor);
        plugin.modification_date = Utc::now();
        self.catalog.save_plugin(&plugin).await?;

        self.validator.validate(&plugin).await?;

        let existing: HashSet<String> = self
            .catalog
            .list_parameters(&name)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();

        let mut added = 0;
        for declared in descriptor
            .parameters
            .iter()
            .filter(|p| !existing.contains(&p.name))
        {
            if let Err(e) = self
                .catalog
                .create_parameter(to_parameter(&plugin, declared))
                .await
            {
                log::warn!(
                    "Failed to store new parameter '{}' of '{}' after adding {} others",
                    declared.name,
                    name,
                    added
                );
                return Err(PluginError::Catalog(e));
            }
            added += 1;
        }

        log::info!("Updated plugin '{}', {} new parameters", name, added);
        Ok(plugin)
    }

    /// Remove a plugin and its parameters
    pub async fn remove_plugin(&self, name: &str) -> PluginResult<()> {
        self.catalog
            .delete_plugin(name)
            .await
            .map_err(|e| lookup_error(name, e))?;
        log::info!("Removed plugin '{}'", name);
        Ok(())
    }

    pub async fn get_plugin(&self, name: &str) -> PluginResult<Plugin> {
        self.catalog
            .get_plugin(name)
            .await
            .map_err(|e| lookup_error(name, e))
    }

    pub async fn get_parameters(&self, name: &str) -> PluginResult<Vec<PluginParameter>> {
        self.catalog
            .list_parameters(name)
            .await
            .map_err(|e| lookup_error(name, e))
    }
}
