//! Command-line arguments
//!
//! Exactly one catalog or backend operation is selected per invocation; the
//! remaining flags override values from the configuration file.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "plugctl")]
#[command(about = "Plugin registration and execution manager")]
#[command(version)]
#[command(group(
    ArgGroup::new("operation")
        .required(true)
        .args(["add", "remove", "modify", "check_backend", "shutdown_backend"])
))]
pub struct Args {
    /// Register the plugin published by a container image
    #[arg(short = 'a', long = "add", value_name = "IMAGE")]
    pub add: Option<String>,

    /// Remove a registered plugin and its parameters
    #[arg(short = 'r', long = "remove", value_name = "NAME")]
    pub remove: Option<String>,

    /// Refresh a registered plugin from its container image
    #[arg(short = 'm', long = "modify", value_name = "IMAGE")]
    pub modify: Option<String>,

    /// Probe the remote compute backend until it answers
    #[arg(long = "check-backend")]
    pub check_backend: bool,

    /// Ask the remote compute backend to shut down
    #[arg(long = "shutdown-backend")]
    pub shutdown_backend: bool,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Catalog file path
    #[arg(long = "catalog", value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Container runtime program
    #[arg(long = "container-program", value_name = "PROGRAM")]
    pub container_program: Option<String>,

    /// Base URL of the remote compute service
    #[arg(long = "remote-url", value_name = "URL")]
    pub remote_url: Option<String>,

    /// Force coloured output
    #[arg(short = 'g', long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable coloured output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,
}

/// The operation selected on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Add(String),
    Remove(String),
    Modify(String),
    CheckBackend,
    ShutdownBackend,
}

impl Operation {
    /// Context line reported when the operation fails
    pub fn description(&self) -> String {
        match self {
            Operation::Add(image) => format!("Registering plugin from '{}'", image),
            Operation::Remove(name) => format!("Removing plugin '{}'", name),
            Operation::Modify(image) => format!("Updating plugin from '{}'", image),
            Operation::CheckBackend => "Checking remote backend availability".to_string(),
            Operation::ShutdownBackend => "Shutting down remote backend".to_string(),
        }
    }

    pub fn needs_remote(&self) -> bool {
        matches!(self, Operation::CheckBackend | Operation::ShutdownBackend)
    }
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected operation, `None` only for hand-built `Args`
    pub fn operation(&self) -> Option<Operation> {
        if let Some(image) = &self.add {
            return Some(Operation::Add(image.clone()));
        }
        if let Some(name) = &self.remove {
            return Some(Operation::Remove(name.clone()));
        }
        if let Some(image) = &self.modify {
            return Some(Operation::Modify(image.clone()));
        }
        if self.check_backend {
            return Some(Operation::CheckBackend);
        }
        if self.shutdown_backend {
            return Some(Operation::ShutdownBackend);
        }
        None
    }

    /// --color gives Some(true), --no-color Some(false), neither None (auto/TTY)
    pub fn color_override(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
