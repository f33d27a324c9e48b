//! Output registration
//!
//! Records every file an instance left in its output directory and marks the
//! instance as finished successfully.

use crate::catalog::api::{InstanceStatus, OutputFile, PluginInstance, SharedCatalog};
use crate::execution::error::{ExecutionError, ExecutionResult};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Regular files below `dir`, sorted
pub fn collect_output_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let pattern = format!(
        "{}/**/*",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let entries = glob::glob(&pattern).map_err(|e| format!("bad output pattern: {}", e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| e.to_string())?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Register the outputs of a successful run and close the instance
pub async fn register_outputs(
    catalog: &SharedCatalog,
    instance: &mut PluginInstance,
) -> ExecutionResult<Vec<OutputFile>> {
    let output_dir = instance.get_output_path().to_path_buf();
    let files = collect_output_files(&output_dir).map_err(|cause| {
        ExecutionError::OutputRegistration {
            instance_id: instance.id,
            cause,
        }
    })?;

    let mut finished = instance.clone();
    finished.status = InstanceStatus::FinishedSuccessfully;
    finished.end_date = Some(Utc::now());
    let registered = catalog.complete_instance(&finished, files).await?;
    *instance = finished;

    log::info!(
        "Instance {} finished successfully with {} output files",
        instance.id,
        registered.len()
    );
    Ok(registered)
}
