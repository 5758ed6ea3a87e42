//! Error types for the pass pipeline engine.

use thiserror::Error;

/// Errors that can occur while building or running a pass pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PassManagerError {
    /// A flow condition was supplied without a predicate.
    #[error("The controller needs a callable. Value cannot be None. (alias: {alias})")]
    MissingPredicate {
        /// Alias the empty condition was registered under.
        alias: String,
    },

    /// A flow condition names an alias that no controller is registered for.
    #[error("No flow controller registered for alias '{0}'")]
    UnknownController(String),

    /// Attempt to remove an alias that is not registered.
    #[error("Flow controller not found: {0}")]
    ControllerNotFound(String),

    /// A do-while loop did not converge within its iteration budget.
    #[error("Maximum iteration reached. max_iteration={max_iteration}")]
    MaxIterationReached {
        /// The configured iteration ceiling.
        max_iteration: usize,
    },

    /// Pass execution failed.
    #[error("Pass '{name}' failed: {reason}")]
    PassFailed { name: String, reason: String },

    /// Invalid pipeline configuration.
    #[error("Invalid pass configuration: {0}")]
    InvalidConfiguration(String),

    /// A property could not be read with the requested type.
    #[error("Property '{key}' is invalid: {reason}")]
    Property { key: String, reason: String },
}

impl PassManagerError {
    /// Shorthand for a failure raised from inside a pass.
    pub fn pass_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PassFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for pass pipeline operations.
pub type PassResult<T> = Result<T, PassManagerError>;
