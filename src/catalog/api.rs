//! Public API for the catalog
//!
//! External modules should import from here rather than directly from internal modules.

// Entities
pub use crate::catalog::types::{
    InstanceStatus, OutputFile, Plugin, PluginInstance, PluginParameter,
};

// Collaborator interface
pub use crate::catalog::traits::{Catalog, SharedCatalog};

// Implementations
pub use crate::catalog::file::JsonFileCatalog;
pub use crate::catalog::memory::MemoryCatalog;

// Error handling
pub use crate::catalog::error::{CatalogError, CatalogResult};
