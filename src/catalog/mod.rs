//! Plugin Catalog
//!
//! The persistent registry of plugins, their parameters, plugin instances and
//! registered output files, accessed through the async [`api::Catalog`] trait.

// Internal modules - all access should go through api module
pub(crate) mod error;
pub(crate) mod file;
pub(crate) mod memory;
pub(crate) mod state;
pub(crate) mod traits;
pub(crate) mod types;

// Public API module - the only public interface for the catalog
pub mod api;

#[cfg(test)]
mod tests;
