//! Plugin Execution
//!
//! Compiles execution requests for plugin instances, dispatches them to a
//! local, in-process or remote backend and reconciles remote job status with
//! the catalog.

// Internal modules - all access should go through api module
pub(crate) mod backend;
pub(crate) mod error;
pub(crate) mod outputs;
pub(crate) mod reconciler;
pub(crate) mod request;
pub(crate) mod runner;

// Public API module - the only public interface for plugin execution
pub mod api;

#[cfg(test)]
mod tests;
