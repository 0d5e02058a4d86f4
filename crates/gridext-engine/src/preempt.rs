//! Preemption victim selection.
//!
//! Invoked only after filtering found no admissible node under current
//! occupancy. For each candidate node independently, the engine removes
//! evictable occupants one at a time in ascending priority order,
//! re-running the full predicate set against the reduced snapshot after
//! each removal, and stops at the first admissible state. The exact
//! removed set is that node's victim set.
//!
//! Nodes that stay inadmissible after every evictable occupant is gone
//! are omitted from the result. An empty overall map means "no node can
//! be made feasible" — a valid outcome, not an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use gridext_core::{NodeName, NodeSnapshot, Occupant, Unit};

use crate::deadline::Deadline;
use crate::error::EngineResult;
use crate::predicate::PredicateSet;

/// Victim lists keyed by node, in eviction order.
pub type VictimsByNode = BTreeMap<NodeName, Vec<Occupant>>;

/// Greedy minimal-eviction victim selector.
///
/// Shares the predicate set used for filtering, so a victim set is
/// valid exactly when the same checks that rejected the node start
/// admitting it.
pub struct PreemptionEngine {
    predicates: Arc<PredicateSet>,
}

impl PreemptionEngine {
    pub fn new(predicates: Arc<PredicateSet>) -> Self {
        Self { predicates }
    }

    /// Compute victim sets for every node that can be made admissible.
    ///
    /// Nodes are evaluated in input order; each node's computation is
    /// independent of the others (the caller's core scheduler picks the
    /// final node).
    pub fn preempt(
        &self,
        unit: &Unit,
        nodes: &[NodeSnapshot],
        deadline: Deadline,
    ) -> EngineResult<VictimsByNode> {
        let mut victims_by_node = VictimsByNode::new();

        for node in nodes {
            deadline.check()?;
            if let Some(victims) = self.victims_for_node(unit, node, deadline)? {
                victims_by_node.insert(node.name.clone(), victims);
            }
        }

        Ok(victims_by_node)
    }

    /// Victim set for one node, or `None` if no eviction sequence makes
    /// the unit admissible there.
    fn victims_for_node(
        &self,
        unit: &Unit,
        node: &NodeSnapshot,
        deadline: Deadline,
    ) -> EngineResult<Option<Vec<Occupant>>> {
        // Already admissible: feasible without evicting anyone.
        if self.predicates.admit(unit, node).is_none() {
            return Ok(Some(Vec::new()));
        }

        // Eviction candidates: strictly lower priority, not marked
        // non-evictable. Stable sort keeps occupant order within a
        // priority band deterministic.
        let mut candidates: Vec<&Occupant> = node
            .occupants
            .iter()
            .filter(|o| !o.non_evictable && o.priority < unit.priority)
            .collect();
        candidates.sort_by_key(|o| o.priority);

        let mut evicted: Vec<Occupant> = Vec::new();
        let mut evicted_uids: Vec<String> = Vec::new();

        for occupant in candidates {
            deadline.check()?;
            evicted.push(occupant.clone());
            evicted_uids.push(occupant.uid.clone());

            let reduced = node.without_occupants(&evicted_uids);
            if self.predicates.admit(unit, &reduced).is_none() {
                debug!(
                    node = %node.name,
                    unit = %unit.qualified_name(),
                    victims = evicted.len(),
                    "node becomes admissible after eviction"
                );
                return Ok(Some(evicted));
            }
        }

        // Every evictable occupant removed and still inadmissible —
        // no partial victim set is returned for this node.
        Ok(None)
    }
}
