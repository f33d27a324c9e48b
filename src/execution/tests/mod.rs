//! Test modules for plugin execution

mod utils;
