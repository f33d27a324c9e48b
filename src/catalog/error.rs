//! Catalog Error Types

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("A plugin named '{name}' already exists")]
    DuplicateName { name: String },

    #[error("Catalog storage failure at {}: {cause}", path.display())]
    Storage { path: PathBuf, cause: String },

    #[error(
        "Catalog at {} has schema version {found}, expected {expected}",
        path.display()
    )]
    SchemaMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

impl CatalogError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        CatalogError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}

impl crate::core::error_handling::ContextualError for CatalogError {
    fn is_user_actionable(&self) -> bool {
        match self {
            CatalogError::NotFound { .. } => true,
            CatalogError::DuplicateName { .. } => true,
            CatalogError::SchemaMismatch { .. } => true, // user points at another file
            CatalogError::Storage { .. } => false,
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

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
