//! Generic error handling utilities
//!
//! Provides unified error reporting at the CLI boundary for every subsystem
//! error type (plugin admission, execution, catalog, configuration).

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// User-actionable errors (a bad descriptor, a duplicate name, a limit that
/// does not parse) are shown verbatim. System errors (storage, network,
/// container runtime) show the operation context and keep the detail at
/// debug level.
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the user can act on
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<String>;
}

/// Build the primary line reported for an error
pub fn fatal_line<E: ContextualError>(error: &E, operation_context: &str) -> String {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => format!("FATAL: {}", user_msg),
        _ => format!("FATAL: {}", operation_context),
    }
}

/// Log errors with appropriate detail level based on error specificity
///
/// # Examples
/// ```rust,no_run
/// # use plugctl::core::error_handling::log_error_with_context;
/// # use plugctl::plugin::api::PluginError;
/// let err = PluginError::NotFound { name: "simplefsapp".to_string() };
/// log_error_with_context(&err, "Removing plugin");
/// // Logs: "FATAL: Couldn't find plugin 'simplefsapp' in the catalog"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    log::error!("{}", fatal_line(error, operation_context));
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
