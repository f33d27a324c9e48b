//! Public API for the plugin system
//!
//! This module provides the complete public API for the plugin system.
//! External modules should import from here rather than directly from internal modules.

// Catalog admission
pub use crate::plugin::registrar::PluginRegistrar;

// Descriptor resolution
pub use crate::plugin::descriptor::{ContainerRuntime, DescriptorResolver, DockerCli};

// Descriptor and catalog enumerations
pub use crate::plugin::types::{
    derive_name, ParameterAction, ParameterDescriptor, ParameterType, PluginDescriptor,
    PluginType,
};

// Resource validation
pub use crate::plugin::validation::{
    check_cpu_limit, check_memory_limit, check_plugin_values, PluginValidator,
};

// Error handling
pub use crate::plugin::error::{PluginError, PluginResult};
