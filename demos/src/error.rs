//! Error type of the demo transpiler.

use arvak_passmanager::PassManagerError;
use arvak_pulse::PulseError;
use thiserror::Error;

/// Errors reported by the demo pipelines.
///
/// Engine errors are wrapped transparently, so the message a user sees is
/// exactly the one the engine produced.
#[derive(Debug, Error)]
pub enum TranspilerError {
    /// Building or running the pass pipeline failed.
    #[error(transparent)]
    PassManager(#[from] PassManagerError),

    /// Building a pulse schedule failed.
    #[error(transparent)]
    Schedule(#[from] PulseError),

    /// A program statement could not be parsed.
    #[error("Cannot parse '{statement}': {reason}")]
    Parse { statement: String, reason: String },
}

/// Result type for the demo pipelines.
pub type TranspilerResult<T> = Result<T, TranspilerError>;
