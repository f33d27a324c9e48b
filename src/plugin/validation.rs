//! Resource and parameter validation for registered plugins
//!
//! Validation runs against a plugin that already exists in the catalog. When
//! the record breaks a resource rule it is deleted again (cascading to its
//! parameters) so the catalog never keeps an inadmissible plugin.

use crate::catalog::api::{Plugin, SharedCatalog};
use crate::plugin::error::{PluginError, PluginResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// Smallest memory limit accepted when expressed in mebibytes
pub const MIN_MEMORY_MI: u64 = 128;
/// Smallest cpu limit accepted, in millicores
pub const MIN_CPU_MILLICORES: u64 = 250;

static MEMORY_LIMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)(Mi|Gi)$").expect("memory limit pattern is valid")
});

static CPU_LIMIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)m$").expect("cpu limit pattern is valid"));

/// Check a memory limit of the form `<int>Mi` or `<int>Gi`
pub fn check_memory_limit(limit: &str) -> Result<(), String> {
    let caps = MEMORY_LIMIT
        .captures(limit)
        .ok_or_else(|| format!("Memory Limit format incorrect: '{}'", limit))?;
    let amount: u64 = caps[1]
        .parse()
        .map_err(|_| format!("Memory Limit format incorrect: '{}'", limit))?;

    if &caps[2] == "Mi" && amount < MIN_MEMORY_MI {
        return Err(format!(
            "Memory Limit should be at least {}Mi, got '{}'",
            MIN_MEMORY_MI, limit
        ));
    }
    Ok(())
}

/// Check a cpu limit of the form `<int>m`
pub fn check_cpu_limit(limit: &str) -> Result<(), String> {
    let caps = CPU_LIMIT
        .captures(limit)
        .ok_or_else(|| format!("CPU Limit format incorrect: '{}'", limit))?;
    let millicores: u64 = caps[1]
        .parse()
        .map_err(|_| format!("CPU Limit format incorrect: '{}'", limit))?;

    if millicores < MIN_CPU_MILLICORES {
        return Err(format!(
            "CPU Limit should be at least {}m, got '{}'",
            MIN_CPU_MILLICORES, limit
        ));
    }
    Ok(())
}

/// Apply the resource rules in order, reporting the first violation
pub fn check_plugin_values(plugin: &Plugin) -> Result<(), String> {
    if plugin.min_number_of_workers > plugin.max_number_of_workers {
        return Err(format!(
            "Minimum number of workers ({}) should be less than or equal to the maximum ({})",
            plugin.min_number_of_workers, plugin.max_number_of_workers
        ));
    }
    check_memory_limit(&plugin.memory_limit)?;
    check_cpu_limit(&plugin.cpu_limit)
}

/// Validator that removes plugins failing the resource rules
#[derive(Clone)]
pub struct PluginValidator {
    catalog: SharedCatalog,
}

impl PluginValidator {
    pub fn new(catalog: SharedCatalog) -> Self {
        Self { catalog }
    }

    /// Validate a persisted plugin, deleting it on failure
    pub async fn validate(&self, plugin: &Plugin) -> PluginResult<()> {
        let Err(cause) = check_plugin_values(plugin) else {
            return Ok(());
        };

        log::warn!("Rejecting plugin '{}': {}", plugin.name, cause);
        if let Err(e) = self.catalog.delete_plugin(&plugin.name).await {
            log::error!(
                "Failed to remove rejected plugin '{}' from the catalog: {}",
                plugin.name,
                e
            );
        }

        Err(PluginError::CatalogAdmission {
            name: plugin.name.clone(),
            cause,
        })
    }
}
