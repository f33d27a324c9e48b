//! Catalog entities
//!
//! Records persisted by the catalog collaborator: plugins, their declared
//! parameters, plugin instances and the output files an instance produced.

use crate::plugin::types::{ParameterAction, ParameterType, PluginType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};

/// Registered plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    /// Surrogate id assigned by the catalog on creation
    pub id: u64,
    /// Unique across the catalog
    pub name: String,
    pub dock_image: String,
    pub plugin_type: PluginType,
    pub authors: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub documentation: String,
    pub license: String,
    pub version: String,
    pub min_number_of_workers: u32,
    pub max_number_of_workers: u32,
    pub cpu_limit: String,
    pub memory_limit: String,
    pub creation_date: DateTime<Utc>,
    pub modification_date: DateTime<Utc>,
}

impl Plugin {
    pub const DEFAULT_NUMBER_OF_WORKERS: u32 = 1;
    pub const DEFAULT_CPU_LIMIT: &'static str = "1000m";
    pub const DEFAULT_MEMORY_LIMIT: &'static str = "200Mi";

    /// Unsaved plugin with resource defaults applied
    pub fn new(name: &str, dock_image: &str, plugin_type: PluginType) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.to_string(),
            dock_image: dock_image.to_string(),
            plugin_type,
            authors: String::new(),
            title: String::new(),
            category: String::new(),
            description: String::new(),
            documentation: String::new(),
            license: String::new(),
            version: String::new(),
            min_number_of_workers: Self::DEFAULT_NUMBER_OF_WORKERS,
            max_number_of_workers: Self::DEFAULT_NUMBER_OF_WORKERS,
            cpu_limit: Self::DEFAULT_CPU_LIMIT.to_string(),
            memory_limit: Self::DEFAULT_MEMORY_LIMIT.to_string(),
            creation_date: now,
            modification_date: now,
        }
    }
}

/// Parameter declared by a registered plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginParameter {
    pub id: u64,
    pub plugin_id: u64,
    pub plugin_name: String,
    pub name: String,
    pub param_type: ParameterType,
    pub optional: bool,
    /// String form of the default; empty when there is none
    pub default: String,
    pub help: String,
    pub flag: String,
    pub action: ParameterAction,
}

/// Instance status vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum InstanceStatus {
    Queued,
    Started,
    FinishedSuccessfully,
    FinishedWithError,
    Cancelled,
}

impl InstanceStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InstanceStatus::FinishedSuccessfully
                | InstanceStatus::FinishedWithError
                | InstanceStatus::Cancelled
        )
    }
}

/// One execution of a plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginInstance {
    pub id: u64,
    pub plugin_name: String,
    /// Pipeline predecessor
    pub previous_id: Option<u64>,
    pub owner: String,
    pub status: InstanceStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub output_path: PathBuf,
}

impl PluginInstance {
    /// Unsaved instance in the `started` state
    pub fn new(plugin_name: &str, owner: &str, output_path: impl Into<PathBuf>) -> Self {
        Self {
            id: 0,
            plugin_name: plugin_name.to_string(),
            previous_id: None,
            owner: owner.to_string(),
            status: InstanceStatus::Started,
            start_date: Utc::now(),
            end_date: None,
            output_path: output_path.into(),
        }
    }

    pub fn with_previous(mut self, previous_id: u64) -> Self {
        self.previous_id = Some(previous_id);
        self
    }

    /// Directory owned by this instance for its outputs
    pub fn get_output_path(&self) -> &Path {
        &self.output_path
    }
}

/// File produced by an instance and registered after a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub id: u64,
    pub instance_id: u64,
    pub path: PathBuf,
}
