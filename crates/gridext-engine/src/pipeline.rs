//! Decision pipeline — sequences the phases of one extension call.
//!
//! Each incoming call is stateless relative to prior calls; the
//! pipeline only orders sub-calls within one request:
//!
//! ```text
//! Idle → Filtering → (Feasible | Infeasible)
//!                      → [Prioritizing] → [Preempting] → [Binding] → Idle
//! ```
//!
//! The registry (predicates + weighted priorities) is immutable and
//! shared across concurrent calls behind an `Arc`; reconfiguration
//! means building a new registry and swapping the whole `Arc`, never
//! mutating one in place.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use gridext_core::{ConfigError, ExtenderConfig, NodeName, NodeSnapshot, Unit, UnitRef};

use crate::aggregate::{RankedNode, ScoringAggregator, WeightedPriority};
use crate::bind::{BindDelegate, BindOutcome, ClusterCommit};
use crate::deadline::Deadline;
use crate::error::EngineResult;
use crate::predicate::{FilterOutcome, PredicateSet, builtin as builtin_predicate};
use crate::preempt::{PreemptionEngine, VictimsByNode};
use crate::priority::builtin as builtin_priority;

/// Immutable per-process registry of decision functions.
pub struct ExtenderRegistry {
    pub predicates: Arc<PredicateSet>,
    pub aggregator: ScoringAggregator,
}

impl ExtenderRegistry {
    /// Build the registry from configuration. Unknown names are
    /// startup errors, not per-call errors.
    pub fn from_config(config: &ExtenderConfig) -> Result<Self, ConfigError> {
        let mut predicates = Vec::with_capacity(config.predicates.len());
        for name in &config.predicates {
            let predicate = builtin_predicate(name)
                .ok_or_else(|| ConfigError::UnknownPredicate(name.clone()))?;
            predicates.push(predicate);
        }

        let mut priorities = Vec::with_capacity(config.priorities.len());
        for entry in &config.priorities {
            let function = builtin_priority(&entry.name)
                .ok_or_else(|| ConfigError::UnknownPriority(entry.name.clone()))?;
            priorities.push(WeightedPriority {
                function,
                weight: entry.weight,
            });
        }

        Ok(Self {
            predicates: Arc::new(PredicateSet::new(predicates)),
            aggregator: ScoringAggregator::new(priorities),
        })
    }
}

/// Result of a filter call, with optional preemption fallback output.
#[derive(Debug)]
pub struct FilterDecision {
    pub outcome: FilterOutcome,
    /// Populated only when filtering found nothing and the caller
    /// requested preemption-aware filtering.
    pub preemption: Option<VictimsByNode>,
}

/// Phase of one in-flight decision call, for traceability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Filtering,
    Prioritizing,
    Preempting,
    Binding,
}

/// Orchestrates filter / prioritize / preempt / bind for one call.
pub struct DecisionPipeline {
    registry: Arc<ExtenderRegistry>,
    preemption: PreemptionEngine,
    bind_delegate: BindDelegate,
    deadline_budget: Duration,
}

impl DecisionPipeline {
    pub fn new(
        config: &ExtenderConfig,
        registry: Arc<ExtenderRegistry>,
        commit: Option<Arc<dyn ClusterCommit>>,
    ) -> Self {
        let bind_delegate = match (config.bind_mode, commit) {
            (gridext_core::BindMode::Delegating, Some(commit)) => {
                BindDelegate::Delegating(commit)
            }
            // Delegating mode without a collaborator falls back to
            // declining: the caller is told "unsupported" rather than
            // getting conflict errors from a missing backend.
            _ => BindDelegate::Declining,
        };

        Self {
            preemption: PreemptionEngine::new(registry.predicates.clone()),
            registry,
            bind_delegate,
            deadline_budget: Duration::from_millis(config.deadline_ms),
        }
    }

    /// Whether bind calls are supported at all (out-of-band flag for
    /// the caller's extender configuration).
    pub fn supports_bind(&self) -> bool {
        self.bind_delegate.supports_bind()
    }

    fn deadline(&self, override_ms: Option<u64>) -> Deadline {
        Deadline::after(
            override_ms
                .map(Duration::from_millis)
                .unwrap_or(self.deadline_budget),
        )
    }

    /// Filter call: predicate evaluation, then — only when nothing is
    /// feasible and the caller asked for it — preemption fallback.
    pub fn filter(
        &self,
        unit: &Unit,
        candidates: &[NodeSnapshot],
        preemption_aware: bool,
        deadline_ms: Option<u64>,
    ) -> EngineResult<FilterDecision> {
        let deadline = self.deadline(deadline_ms);
        let mut phase = Phase::Filtering;
        debug!(unit = %unit.qualified_name(), candidates = candidates.len(), ?phase, "filter call");

        let outcome = self
            .registry
            .predicates
            .evaluate(unit, candidates, deadline)?;

        let preemption = if outcome.is_infeasible() && preemption_aware {
            phase = Phase::Preempting;
            debug!(unit = %unit.qualified_name(), ?phase, "no feasible node, trying preemption");
            Some(self.preemption.preempt(unit, candidates, deadline)?)
        } else {
            None
        };

        Ok(FilterDecision {
            outcome,
            preemption,
        })
    }

    /// Prioritize call: rank the caller-supplied list as-is. Filtering
    /// is assumed to have happened upstream.
    pub fn prioritize(
        &self,
        unit: &Unit,
        nodes: &[NodeSnapshot],
        deadline_ms: Option<u64>,
    ) -> EngineResult<Vec<RankedNode>> {
        let deadline = self.deadline(deadline_ms);
        debug!(unit = %unit.qualified_name(), nodes = nodes.len(), phase = ?Phase::Prioritizing, "prioritize call");
        self.registry.aggregator.score(unit, nodes, deadline)
    }

    /// Preempt call: victim selection across the supplied nodes.
    pub fn preempt(
        &self,
        unit: &Unit,
        nodes: &[NodeSnapshot],
        deadline_ms: Option<u64>,
    ) -> EngineResult<VictimsByNode> {
        let deadline = self.deadline(deadline_ms);
        debug!(unit = %unit.qualified_name(), nodes = nodes.len(), phase = ?Phase::Preempting, "preempt call");
        self.preemption.preempt(unit, nodes, deadline)
    }

    /// Bind call: one attempt, terminal for the call.
    pub fn bind(&self, unit: &UnitRef, node: &NodeName) -> BindOutcome {
        debug!(
            unit = %format!("{}/{}", unit.namespace, unit.name),
            node = %node,
            phase = ?Phase::Binding,
            "bind call"
        );
        self.bind_delegate.bind(unit, node)
    }
}
