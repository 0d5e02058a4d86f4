//! Weighted score aggregation and ranking.
//!
//! Combines the registered priority functions into one ranked list:
//! `total(node) = Σ weight_f × score_f(node)`. A function that errors
//! (or returns the wrong number of scores) contributes zero for every
//! node and is logged as a warning — one bad scorer never aborts the
//! call. Equal totals keep the candidate list's relative order, so the
//! caller-visible ranking is deterministic.

use std::sync::Arc;

use tracing::warn;

use gridext_core::{NodeName, NodeSnapshot, Unit};

use crate::deadline::Deadline;
use crate::error::EngineResult;
use crate::priority::{MAX_PRIORITY_SCORE, PriorityFunction};

/// A priority function with its configured weight.
pub struct WeightedPriority {
    pub function: Arc<dyn PriorityFunction>,
    pub weight: u64,
}

/// One entry of the ranked output, highest total first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedNode {
    pub name: NodeName,
    pub total: u64,
}

/// Linear combiner over the registered priority functions.
pub struct ScoringAggregator {
    functions: Vec<WeightedPriority>,
}

impl ScoringAggregator {
    pub fn new(functions: Vec<WeightedPriority>) -> Self {
        Self { functions }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.functions.iter().map(|f| f.function.name()).collect()
    }

    /// Score and rank `nodes` for `unit`, highest total first.
    pub fn score(
        &self,
        unit: &Unit,
        nodes: &[NodeSnapshot],
        deadline: Deadline,
    ) -> EngineResult<Vec<RankedNode>> {
        let mut totals = vec![0u64; nodes.len()];

        for weighted in &self.functions {
            deadline.check()?;
            if weighted.weight == 0 {
                continue;
            }

            let scores = match weighted.function.score(unit, nodes) {
                Ok(scores) if scores.len() == nodes.len() => scores,
                Ok(scores) => {
                    warn!(
                        function = weighted.function.name(),
                        expected = nodes.len(),
                        got = scores.len(),
                        "priority function returned wrong score count, contributing zero"
                    );
                    continue;
                }
                Err(err) => {
                    warn!(
                        function = weighted.function.name(),
                        unit = %unit.qualified_name(),
                        error = %err,
                        "priority function errored, contributing zero"
                    );
                    continue;
                }
            };

            for (total, score) in totals.iter_mut().zip(scores) {
                *total += weighted.weight * score.min(MAX_PRIORITY_SCORE);
            }
        }

        let mut ranked: Vec<RankedNode> = nodes
            .iter()
            .zip(totals)
            .map(|(node, total)| RankedNode {
                name: node.name.clone(),
                total,
            })
            .collect();

        // Stable sort: equal totals preserve candidate order.
        ranked.sort_by(|a, b| b.total.cmp(&a.total));
        Ok(ranked)
    }
}
