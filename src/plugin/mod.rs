//! Plugin System Module
//!
//! Resolves plugin descriptors from container images, validates resource
//! declarations and admits plugins into the catalog.

// Internal modules - all access should go through api module
pub(crate) mod descriptor;
pub(crate) mod error;
pub(crate) mod registrar;
pub(crate) mod types;
pub(crate) mod validation;

// Public API module - the only public interface for the plugin system
pub mod api;

#[cfg(test)]
pub(crate) mod tests;
