//! Feasibility predicates and the AND-combining predicate set.
//!
//! A predicate is a pure check of (unit, node). The set runs every
//! registered predicate against every candidate in registration order;
//! a node survives only if all of them admit it. A predicate that
//! errors internally marks that node inadmissible (fail-closed) without
//! disturbing evaluation of the other nodes.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use gridext_core::{NodeName, NodeSnapshot, TaintEffect, Unit};

use crate::deadline::Deadline;
use crate::error::EngineResult;

/// Why a node was rejected. The first failing predicate wins, so the
/// reason is deterministic for a fixed registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    InsufficientCpu,
    InsufficientMemory,
    NodeLabelMismatch,
    TaintNotTolerated,
    InternalError,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InsufficientCpu => "insufficient-cpu",
            FailureReason::InsufficientMemory => "insufficient-memory",
            FailureReason::NodeLabelMismatch => "node-label-mismatch",
            FailureReason::TaintNotTolerated => "taint-not-tolerated",
            FailureReason::InternalError => "internal-error",
        }
    }
}

/// Outcome of one predicate for one (unit, node) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    Reject(FailureReason),
}

/// A named feasibility check. Implementations must be pure: no side
/// effects, no cross-node state.
pub trait Predicate: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, unit: &Unit, node: &NodeSnapshot) -> EngineResult<Verdict>;
}

/// Result of running the whole set over a candidate list.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Admissible nodes, in candidate-set order.
    pub feasible: Vec<NodeSnapshot>,
    /// Rejected nodes with the first failing predicate's reason.
    pub failures: BTreeMap<NodeName, FailureReason>,
}

impl FilterOutcome {
    pub fn is_infeasible(&self) -> bool {
        self.feasible.is_empty()
    }
}

/// Ordered collection of predicates, AND-combined per node.
pub struct PredicateSet {
    predicates: Vec<Arc<dyn Predicate>>,
}

impl PredicateSet {
    pub fn new(predicates: Vec<Arc<dyn Predicate>>) -> Self {
        Self { predicates }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.predicates.iter().map(|p| p.name()).collect()
    }

    /// Evaluate every candidate. Feasible nodes keep input order;
    /// failed nodes carry the first failing predicate's reason.
    pub fn evaluate(
        &self,
        unit: &Unit,
        candidates: &[NodeSnapshot],
        deadline: Deadline,
    ) -> EngineResult<FilterOutcome> {
        let mut feasible = Vec::new();
        let mut failures = BTreeMap::new();

        for node in candidates {
            deadline.check()?;
            match self.admit(unit, node) {
                None => feasible.push(node.clone()),
                Some(reason) => {
                    failures.insert(node.name.clone(), reason);
                }
            }
        }

        Ok(FilterOutcome { feasible, failures })
    }

    /// Run the set against a single node. `None` means admissible.
    ///
    /// Short-circuits on the first rejection; predicates are evaluated
    /// in registration order so the reported reason is stable.
    pub fn admit(&self, unit: &Unit, node: &NodeSnapshot) -> Option<FailureReason> {
        for predicate in &self.predicates {
            match predicate.evaluate(unit, node) {
                Ok(Verdict::Admit) => {}
                Ok(Verdict::Reject(reason)) => return Some(reason),
                Err(err) => {
                    warn!(
                        predicate = predicate.name(),
                        node = %node.name,
                        unit = %unit.qualified_name(),
                        error = %err,
                        "predicate errored, treating node as inadmissible"
                    );
                    return Some(FailureReason::InternalError);
                }
            }
        }
        None
    }
}

// ── Built-in predicates ───────────────────────────────────────────

/// Rejects nodes whose allocatable resources cannot hold the unit.
/// CPU is checked before memory, so a node short on both reports
/// `insufficient-cpu`.
pub struct ResourceFit;

impl Predicate for ResourceFit {
    fn name(&self) -> &'static str {
        "resource-fit"
    }

    fn evaluate(&self, unit: &Unit, node: &NodeSnapshot) -> EngineResult<Verdict> {
        if node.allocatable.cpu_millis < unit.resources.cpu_millis {
            return Ok(Verdict::Reject(FailureReason::InsufficientCpu));
        }
        if node.allocatable.memory_bytes < unit.resources.memory_bytes {
            return Ok(Verdict::Reject(FailureReason::InsufficientMemory));
        }
        Ok(Verdict::Admit)
    }
}

/// Rejects nodes missing any of the unit's required labels.
pub struct NodeLabelSelector;

impl Predicate for NodeLabelSelector {
    fn name(&self) -> &'static str {
        "node-label-selector"
    }

    fn evaluate(&self, unit: &Unit, node: &NodeSnapshot) -> EngineResult<Verdict> {
        let matched = unit
            .scheduling
            .required_labels
            .iter()
            .all(|(k, v)| node.labels.get(k).is_some_and(|nv| nv == v));
        if matched {
            Ok(Verdict::Admit)
        } else {
            Ok(Verdict::Reject(FailureReason::NodeLabelMismatch))
        }
    }
}

/// Rejects nodes carrying a `NoSchedule` taint the unit does not
/// tolerate. `PreferNoSchedule` taints never reject here.
pub struct TaintToleration;

impl Predicate for TaintToleration {
    fn name(&self) -> &'static str {
        "taint-toleration"
    }

    fn evaluate(&self, unit: &Unit, node: &NodeSnapshot) -> EngineResult<Verdict> {
        for taint in &node.taints {
            if taint.effect != TaintEffect::NoSchedule {
                continue;
            }
            let tolerated = unit
                .scheduling
                .tolerations
                .iter()
                .any(|t| t.tolerates(taint));
            if !tolerated {
                return Ok(Verdict::Reject(FailureReason::TaintNotTolerated));
            }
        }
        Ok(Verdict::Admit)
    }
}

/// Look up a built-in predicate by its registered name.
pub fn builtin(name: &str) -> Option<Arc<dyn Predicate>> {
    match name {
        "resource-fit" => Some(Arc::new(ResourceFit)),
        "node-label-selector" => Some(Arc::new(NodeLabelSelector)),
        "taint-toleration" => Some(Arc::new(TaintToleration)),
        _ => None,
    }
}
