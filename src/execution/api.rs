//! Public API for plugin execution
//!
//! External modules should import from here rather than directly from internal modules.

// Run orchestration
pub use crate::execution::runner::{PluginRunner, RunOptions, RunOutcome};

// Request compilation
pub use crate::execution::request::{
    compile, DirectoryOverrides, ExecutableSpec, ExecutionRequest, SAVE_INPUT_META,
    SAVE_OUTPUT_META,
};

// Backends
pub use crate::execution::backend::remote::DEFAULT_JOB_PREFIX;
pub use crate::execution::backend::{
    Backend, BackendKind, ComputeService, DispatchOutcome, HttpComputeService, InProcessEntry,
    InProcessFn, InternalBackend, JobHandle, JobSpec, LocalBackend, RemoteBackend,
    RemoteJobState,
};

// Status reconciliation and outputs
pub use crate::execution::outputs::{collect_output_files, register_outputs};
pub use crate::execution::reconciler::StatusReconciler;

// Error handling
pub use crate::execution::error::{ExecutionError, ExecutionResult};
