//! Per-call deadline tracking.
//!
//! Evaluation is synchronous CPU work, so the deadline is checked at
//! per-node boundaries rather than via an async timeout. A call that
//! runs out of time fails whole with `DeadlineExceeded` — the caller
//! never sees a partially evaluated result.

use std::time::{Duration, Instant};

use crate::error::{EngineError, EngineResult};

/// Monotonic deadline for one decision call.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now().checked_add(budget))
    }

    /// A deadline that never fires.
    pub fn none() -> Self {
        Self(None)
    }

    /// Err(`DeadlineExceeded`) once the deadline has passed.
    pub fn check(&self) -> EngineResult<()> {
        match self.0 {
            Some(at) if Instant::now() >= at => Err(EngineError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
