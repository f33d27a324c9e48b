pub mod app;
pub mod catalog;
pub mod core;
pub mod execution;
pub mod plugin;
