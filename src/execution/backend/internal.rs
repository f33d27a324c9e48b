//! In-process synchronous backend
//!
//! Plugins compiled into the binary register an entry point with
//! [`in_process_plugin!`](crate::in_process_plugin); entry points can also be
//! attached to a backend value directly. Entry points run on the blocking
//! thread pool.

use crate::execution::backend::BackendKind;
use crate::execution::error::{ExecutionError, ExecutionResult};
use crate::execution::request::ExecutionRequest;
use std::collections::HashMap;
use std::sync::Arc;

/// Entry point signature: the compiled argument list in, success or a cause out
pub type InProcessFn = fn(&[String]) -> Result<(), String>;

/// Link-time registration of an in-process plugin
pub struct InProcessEntry {
    pub name: &'static str,
    pub entry: InProcessFn,
}

inventory::collect!(InProcessEntry);

/// Macro for registering in-process plugins
#[macro_export]
macro_rules! in_process_plugin {
    ($name:expr, $entry:expr) => {
        ::inventory::submit! {
            $crate::execution::api::InProcessEntry {
                name: $name,
                entry: $entry,
            }
        }
    };
}

#[derive(Debug, Clone, Default)]
pub struct InternalBackend {
    explicit: Arc<HashMap<String, InProcessFn>>,
}

impl InternalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an entry point to this backend value
    pub fn with_entry(mut self, name: &str, entry: InProcessFn) -> Self {
        Arc::make_mut(&mut self.explicit).insert(name.to_string(), entry);
        self
    }

    /// Entry point for `plugin_name`; explicit entries shadow registered ones
    pub fn lookup(&self, plugin_name: &str) -> Option<InProcessFn> {
        self.explicit.get(plugin_name).copied().or_else(|| {
            inventory::iter::<InProcessEntry>()
                .find(|e| e.name == plugin_name)
                .map(|e| e.entry)
        })
    }

    pub fn has_entries(&self) -> bool {
        !self.explicit.is_empty() || inventory::iter::<InProcessEntry>().next().is_some()
    }

    /// Names of every available entry point
    pub fn entry_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .explicit
            .keys()
            .cloned()
            .chain(inventory::iter::<InProcessEntry>().map(|e| e.name.to_string()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub(crate) async fn run(&self, request: &ExecutionRequest) -> ExecutionResult<()> {
        let failure = |cause: String| ExecutionError::BackendExecution {
            plugin: request.plugin_name.clone(),
            backend: BackendKind::Internal,
            cause,
        };

        let entry = self
            .lookup(&request.plugin_name)
            .ok_or_else(|| failure("no in-process entry point registered".to_string()))?;

        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|e| {
                failure(format!(
                    "cannot create output directory {}: {}",
                    request.output_dir.display(),
                    e
                ))
            })?;

        let args = request.args.clone();
        match tokio::task::spawn_blocking(move || entry(&args)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(cause)) => Err(failure(cause)),
            Err(join) if join.is_panic() => Err(failure("entry point panicked".to_string())),
            Err(join) => Err(failure(join.to_string())),
        }
    }
}
