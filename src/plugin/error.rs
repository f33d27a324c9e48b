//! Plugin Error Handling
//!
//! Error types for descriptor resolution and catalog admission (add, update,
//! remove) of plugins.

use crate::catalog::api::CatalogError;

/// Result type alias for plugin operations
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Errors raised while resolving, validating or registering plugins
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Malformed or untrusted plugin self-description
    #[error("Invalid descriptor from image '{image}': {reason}")]
    InvalidDescriptor { image: String, reason: String },

    /// A plugin with this name is already registered
    #[error("Plugin '{name}' already exists in the catalog")]
    DuplicateName { name: String },

    /// No plugin with this name is registered
    #[error("Couldn't find plugin '{name}' in the catalog")]
    NotFound { name: String },

    /// Post-persist invariant violation; the plugin row has been removed
    #[error("Unable to register plugin '{name}': {cause}")]
    CatalogAdmission { name: String, cause: String },

    /// The container runtime failed to produce a descriptor
    #[error("Container runtime failed for image '{image}': {cause}")]
    ContainerRuntime { image: String, cause: String },

    /// Catalog storage failure
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl crate::core::error_handling::ContextualError for PluginError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            PluginError::InvalidDescriptor { .. }
                | PluginError::DuplicateName { .. }
                | PluginError::NotFound { .. }
                | PluginError::CatalogAdmission { .. }
        )
    }

    fn user_message(&self) -> Option<String> {
        if self.is_user_actionable() {
            Some(self.to_string())
        } else {
            None
        }
    }
}
