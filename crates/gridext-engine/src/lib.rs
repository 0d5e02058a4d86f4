//! gridext-engine — the extender decision core.
//!
//! Given one decision call from the orchestrator's core scheduler, this
//! crate filters candidate nodes (predicates), ranks the survivors
//! (weighted priorities), proposes eviction victims when nothing fits
//! (preemption), and optionally commits the final assignment (bind).
//! It owns no cluster state: every call is computed from the request
//! payload against an immutable registry shared across calls.
//!
//! # Components
//!
//! - **`predicate`** — feasibility checks and the AND-combining set
//! - **`priority`** — per-node scoring functions
//! - **`aggregate`** — weighted score combination and ranking
//! - **`preempt`** — greedy minimal-eviction victim selection
//! - **`bind`** — delegating/declining bind modes
//! - **`pipeline`** — per-call phase sequencing and registry assembly

pub mod aggregate;
pub mod bind;
pub mod deadline;
pub mod error;
pub mod pipeline;
pub mod predicate;
pub mod preempt;
pub mod priority;

pub use aggregate::{RankedNode, ScoringAggregator, WeightedPriority};
pub use bind::{BindDelegate, BindOutcome, ClusterCommit, CommitError};
pub use deadline::Deadline;
pub use error::{EngineError, EngineResult};
pub use pipeline::{DecisionPipeline, ExtenderRegistry, FilterDecision};
pub use predicate::{FailureReason, FilterOutcome, Predicate, PredicateSet, Verdict};
pub use preempt::{PreemptionEngine, VictimsByNode};
pub use priority::{MAX_PRIORITY_SCORE, PriorityFunction};
