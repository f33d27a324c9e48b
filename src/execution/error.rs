//! Execution Error Handling
//!
//! Error types for compiling, dispatching and reconciling plugin executions.

use crate::catalog::api::CatalogError;
use crate::core::error_handling::ContextualError;
use crate::execution::backend::BackendKind;
use crate::plugin::api::PluginError;

/// Result type alias for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// Synchronous backend reported failure
    #[error("Plugin '{plugin}' failed on the {backend} backend: {cause}")]
    BackendExecution {
        plugin: String,
        backend: BackendKind,
        cause: String,
    },

    /// Remote backend could not be reached or refused the request
    #[error("The {backend} backend is unavailable: {cause}")]
    BackendUnavailable { backend: BackendKind, cause: String },

    /// Data-consuming plugin without a resolvable input directory
    #[error("Plugin '{plugin}' consumes input but no input directory could be resolved")]
    MissingInputDirectory { plugin: String },

    #[error("Operation '{operation}' is not supported by the {backend} backend")]
    Unsupported {
        backend: BackendKind,
        operation: &'static str,
    },

    #[error("Failed to register outputs of instance {instance_id}: {cause}")]
    OutputRegistration { instance_id: u64, cause: String },

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl ContextualError for ExecutionError {
    fn is_user_actionable(&self) -> bool {
        match self {
            ExecutionError::MissingInputDirectory { .. } => true,
            ExecutionError::Unsupported { .. } => true,
            ExecutionError::BackendExecution { .. } => true,
            ExecutionError::BackendUnavailable { .. } => false,
            ExecutionError::OutputRegistration { .. } => false,
            ExecutionError::Plugin(e) => e.is_user_actionable(),
            ExecutionError::Catalog(e) => e.is_user_actionable(),
        }
    }

    fn user_message(&self) -> Option<String> {
        if self.is_user_actionable() {
            Some(self.to_string())
        } else {
            None
        }
    }
}
