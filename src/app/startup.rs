//! Application startup
//!
//! Parses the command line, loads configuration, initialises logging and runs
//! the selected operation on a single-threaded tokio runtime.

use super::cli::args::{Args, Operation};
use super::cli::config::{ConfigError, Settings};
use crate::catalog::api::{CatalogError, JsonFileCatalog, SharedCatalog};
use crate::core::error_handling::{log_error_with_context, ContextualError};
use crate::core::logging::init_logging;
use crate::core::version::build_summary;
use crate::execution::api::{
    Backend, BackendKind, ExecutionError, HttpComputeService, PluginRunner, RemoteBackend,
};
use crate::plugin::api::{DescriptorResolver, DockerCli, PluginError, PluginRegistrar};
use clap::Parser;
use colored::Colorize;
use std::io::IsTerminal;
use std::sync::Arc;
use thiserror::Error;

/// Any failure surfaced at the command-line boundary
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl ContextualError for AppError {
    fn is_user_actionable(&self) -> bool {
        match self {
            AppError::Config(e) => e.is_user_actionable(),
            AppError::Catalog(e) => e.is_user_actionable(),
            AppError::Plugin(e) => e.is_user_actionable(),
            AppError::Execution(e) => e.is_user_actionable(),
        }
    }

    fn user_message(&self) -> Option<String> {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Catalog(e) => e.user_message(),
            AppError::Plugin(e) => e.user_message(),
            AppError::Execution(e) => e.user_message(),
        }
    }
}

/// Binary entry point
pub fn startup() {
    let args = Args::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(run(args));
    std::process::exit(code);
}

/// Run one invocation and return the process exit code
pub async fn run(args: Args) -> i32 {
    let Some(operation) = args.operation() else {
        eprintln!("Error: no operation selected");
        return 2;
    };

    // Configuration problems are reported before the logger exists
    let mut settings = match Settings::load(args.config_file.as_deref()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(e) = settings.merge_args(&args) {
        eprintln!("Error: {}", e);
        return 1;
    }

    let color = args
        .color_override()
        .unwrap_or_else(|| std::io::stdout().is_terminal());
    colored::control::set_override(color);

    if let Err(e) = init_logging(&settings.logging_options(color)) {
        eprintln!("Warning: logging not initialised: {}", e);
    }
    log::debug!("{}", build_summary());

    match execute(&operation, &settings).await {
        Ok(()) => 0,
        Err(e) => {
            log_error_with_context(&e, &operation.description());
            1
        }
    }
}

async fn execute(operation: &Operation, settings: &Settings) -> Result<(), AppError> {
    // refuse backend operations before the catalog is touched
    if operation.needs_remote() {
        settings.remote_url()?;
    }

    match operation {
        Operation::Add(image) => {
            let plugin = registrar(settings).await?.add_plugin(image).await?;
            println!("{} plugin '{}' ({})", "Registered".green(), plugin.name, image);
        }
        Operation::Modify(image) => {
            let plugin = registrar(settings).await?.update_plugin(image).await?;
            println!("{} plugin '{}' ({})", "Updated".green(), plugin.name, image);
        }
        Operation::Remove(name) => {
            registrar(settings).await?.remove_plugin(name).await?;
            println!("{} plugin '{}'", "Removed".green(), name);
        }
        Operation::CheckBackend => {
            let runner = remote_runner(settings).await?;
            runner
                .check_backend_available(settings.probe_policy())
                .await?;
            println!("{} remote backend is available", "OK".green());
        }
        Operation::ShutdownBackend => {
            remote_runner(settings).await?.shutdown_backend().await?;
            println!("{} remote backend shutdown requested", "OK".green());
        }
    }
    Ok(())
}

async fn open_catalog(settings: &Settings) -> Result<SharedCatalog, AppError> {
    let catalog = JsonFileCatalog::open(settings.catalog_path()).await?;
    log::debug!("Using catalog {}", catalog.path().display());
    Ok(Arc::new(catalog))
}

fn resolver(settings: &Settings) -> DescriptorResolver {
    let runtime = DockerCli::new(settings.container.program.clone());
    log::debug!("Using container runtime '{}'", runtime.program());
    DescriptorResolver::new(Arc::new(runtime))
}

async fn registrar(settings: &Settings) -> Result<PluginRegistrar, AppError> {
    Ok(PluginRegistrar::new(
        open_catalog(settings).await?,
        resolver(settings),
    ))
}

async fn remote_runner(settings: &Settings) -> Result<PluginRunner, AppError> {
    let url = settings.remote_url()?;
    let service = HttpComputeService::new(url, settings.remote_timeout()).map_err(|cause| {
        ExecutionError::BackendUnavailable {
            backend: BackendKind::Remote,
            cause,
        }
    })?;
    let backend = Backend::Remote(
        RemoteBackend::new(Arc::new(service)).with_job_prefix(&settings.remote.job_prefix),
    );
    Ok(PluginRunner::new(
        open_catalog(settings).await?,
        resolver(settings),
        backend,
    ))
}
