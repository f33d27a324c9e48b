//! Test modules for the plugin system
//!
//! Descriptor resolution, catalog admission and error reporting, driven
//! through a scripted container runtime.

pub(crate) mod utils;
