//! Per-node scoring functions.
//!
//! Each function is invoked once per call with the full admissible node
//! list — not per node — so functions that need relative comparison
//! (spreading, balance) see every candidate. Raw scores are integers in
//! `0..=MAX_PRIORITY_SCORE`; the aggregator clamps anything above.

use std::sync::Arc;

use gridext_core::{NodeSnapshot, Unit};

use crate::error::EngineResult;

/// Upper bound of a single function's per-node score.
pub const MAX_PRIORITY_SCORE: u64 = 10;

/// A named soft-scoring heuristic.
///
/// `score` must return exactly one value per input node, in input
/// order. Implementations must be deterministic functions of their
/// arguments.
pub trait PriorityFunction: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, unit: &Unit, nodes: &[NodeSnapshot]) -> EngineResult<Vec<u64>>;
}

// ── Built-in priority functions ───────────────────────────────────

/// Prefers nodes with the largest free-resource fraction after the
/// unit lands. The CPU and memory fractions are averaged.
pub struct LeastAllocated;

impl PriorityFunction for LeastAllocated {
    fn name(&self) -> &'static str {
        "least-allocated"
    }

    fn score(&self, unit: &Unit, nodes: &[NodeSnapshot]) -> EngineResult<Vec<u64>> {
        Ok(nodes
            .iter()
            .map(|node| {
                let remaining = node.allocatable.saturating_sub(&unit.resources);
                let cpu = fraction(remaining.cpu_millis, node.capacity.cpu_millis);
                let mem = fraction(remaining.memory_bytes, node.capacity.memory_bytes);
                ((cpu + mem) / 2.0 * MAX_PRIORITY_SCORE as f64).round() as u64
            })
            .collect())
    }
}

fn fraction(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Scores by the fraction of the unit's preferred labels the node
/// carries. Neutral midpoint when the unit has no preferences.
pub struct PreferredLabelAffinity;

impl PriorityFunction for PreferredLabelAffinity {
    fn name(&self) -> &'static str {
        "preferred-label-affinity"
    }

    fn score(&self, unit: &Unit, nodes: &[NodeSnapshot]) -> EngineResult<Vec<u64>> {
        let preferred = &unit.scheduling.preferred_labels;
        Ok(nodes
            .iter()
            .map(|node| {
                if preferred.is_empty() {
                    return MAX_PRIORITY_SCORE / 2;
                }
                let matched = preferred
                    .iter()
                    .filter(|(k, v)| node.labels.get(*k).is_some_and(|nv| nv == *v))
                    .count();
                (matched as f64 / preferred.len() as f64 * MAX_PRIORITY_SCORE as f64).round()
                    as u64
            })
            .collect())
    }
}

/// Spreads units of the same owner: nodes hosting fewer same-owner
/// occupants score higher, relative to the most loaded candidate.
pub struct OwnerSpread;

impl PriorityFunction for OwnerSpread {
    fn name(&self) -> &'static str {
        "owner-spread"
    }

    fn score(&self, unit: &Unit, nodes: &[NodeSnapshot]) -> EngineResult<Vec<u64>> {
        let Some(owner) = &unit.owner else {
            // No owner — nothing to spread against.
            return Ok(vec![MAX_PRIORITY_SCORE / 2; nodes.len()]);
        };

        let counts: Vec<usize> = nodes
            .iter()
            .map(|node| {
                node.occupants
                    .iter()
                    .filter(|o| o.owner.as_deref() == Some(owner.as_str()))
                    .count()
            })
            .collect();

        let max = counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return Ok(vec![MAX_PRIORITY_SCORE; nodes.len()]);
        }

        Ok(counts
            .into_iter()
            .map(|c| {
                ((max - c) as f64 / max as f64 * MAX_PRIORITY_SCORE as f64).round() as u64
            })
            .collect())
    }
}

/// Scores every node zero. The neutral baseline scorer: with it alone
/// registered, ranking degenerates to caller order.
pub struct ZeroPriority;

impl PriorityFunction for ZeroPriority {
    fn name(&self) -> &'static str {
        "zero"
    }

    fn score(&self, _unit: &Unit, nodes: &[NodeSnapshot]) -> EngineResult<Vec<u64>> {
        Ok(vec![0; nodes.len()])
    }
}

/// Look up a built-in priority function by its registered name.
pub fn builtin(name: &str) -> Option<Arc<dyn PriorityFunction>> {
    match name {
        "least-allocated" => Some(Arc::new(LeastAllocated)),
        "preferred-label-affinity" => Some(Arc::new(PreferredLabelAffinity)),
        "owner-spread" => Some(Arc::new(OwnerSpread)),
        "zero" => Some(Arc::new(ZeroPriority)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridext_core::{Occupant, ResourceVector, UnitScheduling};
    use std::collections::HashMap;

    fn make_unit(cpu: u64, mem: u64) -> Unit {
        Unit {
            name: "unit".to_string(),
            namespace: "default".to_string(),
            uid: "u-1".to_string(),
            resources: ResourceVector::new(cpu, mem),
            scheduling: UnitScheduling::default(),
            priority: 0,
            owner: None,
        }
    }

    fn make_node(name: &str, free_cpu: u64, free_mem: u64) -> NodeSnapshot {
        NodeSnapshot {
            name: name.to_string(),
            labels: HashMap::new(),
            taints: Vec::new(),
            capacity: ResourceVector::new(free_cpu, free_mem),
            allocatable: ResourceVector::new(free_cpu, free_mem),
            occupants: Vec::new(),
        }
    }

    fn owned_occupant(uid: &str, owner: &str) -> Occupant {
        Occupant {
            name: format!("occ-{uid}"),
            namespace: "default".to_string(),
            uid: uid.to_string(),
            priority: 0,
            resources: ResourceVector::default(),
            non_evictable: false,
            owner: Some(owner.to_string()),
        }
    }

    #[test]
    fn least_allocated_prefers_emptier_node() {
        let unit = make_unit(500, 512);
        let nodes = vec![make_node("full", 600, 600), make_node("empty", 4000, 4096)];

        let scores = LeastAllocated.score(&unit, &nodes).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn least_allocated_zero_capacity_scores_zero() {
        let unit = make_unit(0, 0);
        let mut node = make_node("n1", 0, 0);
        node.capacity = ResourceVector::default();

        let scores = LeastAllocated.score(&unit, &[node]).unwrap();
        assert_eq!(scores, vec![0]);
    }

    #[test]
    fn affinity_counts_matched_preferences() {
        let mut unit = make_unit(0, 0);
        unit.scheduling
            .preferred_labels
            .insert("gpu".to_string(), "true".to_string());
        unit.scheduling
            .preferred_labels
            .insert("region".to_string(), "us-east".to_string());

        let mut both = make_node("both", 0, 0);
        both.labels.insert("gpu".to_string(), "true".to_string());
        both.labels
            .insert("region".to_string(), "us-east".to_string());
        let mut one = make_node("one", 0, 0);
        one.labels.insert("gpu".to_string(), "true".to_string());
        let none = make_node("none", 0, 0);

        let scores = PreferredLabelAffinity
            .score(&unit, &[both, one, none])
            .unwrap();
        assert_eq!(scores, vec![10, 5, 0]);
    }

    #[test]
    fn affinity_neutral_without_preferences() {
        let unit = make_unit(0, 0);
        let scores = PreferredLabelAffinity
            .score(&unit, &[make_node("n1", 0, 0)])
            .unwrap();
        assert_eq!(scores, vec![5]);
    }

    #[test]
    fn owner_spread_penalizes_crowded_nodes() {
        let mut unit = make_unit(0, 0);
        unit.owner = Some("web".to_string());

        let mut crowded = make_node("crowded", 0, 0);
        crowded.occupants = vec![owned_occupant("a", "web"), owned_occupant("b", "web")];
        let mut half = make_node("half", 0, 0);
        half.occupants = vec![owned_occupant("c", "web"), owned_occupant("d", "other")];
        let empty = make_node("empty", 0, 0);

        let scores = OwnerSpread.score(&unit, &[crowded, half, empty]).unwrap();
        assert_eq!(scores, vec![0, 5, 10]);
    }

    #[test]
    fn owner_spread_full_marks_when_owner_absent_everywhere() {
        let mut unit = make_unit(0, 0);
        unit.owner = Some("web".to_string());

        let scores = OwnerSpread
            .score(&unit, &[make_node("n1", 0, 0), make_node("n2", 0, 0)])
            .unwrap();
        assert_eq!(scores, vec![10, 10]);
    }

    #[test]
    fn zero_priority_scores_all_zero() {
        let unit = make_unit(0, 0);
        let nodes = vec![make_node("n1", 0, 0), make_node("n2", 0, 0)];
        assert_eq!(ZeroPriority.score(&unit, &nodes).unwrap(), vec![0, 0]);
    }

    #[test]
    fn builtin_lookup_resolves_all_registered_names() {
        for name in [
            "least-allocated",
            "preferred-label-affinity",
            "owner-spread",
            "zero",
        ] {
            assert!(builtin(name).is_some(), "missing builtin {name}");
        }
        assert!(builtin("no-such-priority").is_none());
    }
}
