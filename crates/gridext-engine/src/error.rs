//! Engine error types.

use thiserror::Error;

/// Result type alias for decision-core operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while computing a decision.
///
/// Per-predicate and per-scorer failures are contained by the set and
/// aggregator (fail-closed / zero-score); the variants here only escape
/// a call when the whole call must fail.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("predicate {name} failed: {message}")]
    Predicate { name: &'static str, message: String },

    #[error("priority function {name} failed: {message}")]
    Priority { name: &'static str, message: String },

    #[error("call deadline exceeded")]
    DeadlineExceeded,

    #[error("malformed input: {0}")]
    MalformedInput(String),
}
