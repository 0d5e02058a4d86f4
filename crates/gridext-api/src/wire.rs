//! Wire schema for the extender callbacks.
//!
//! One consistent schema for all four call types. Each call is a
//! single request carrying the structured input and expecting the
//! structured output — no partial or streamed delivery. The adapter
//! passes domain types through unchanged where possible; the only
//! adapter-owned shapes are the argument/result envelopes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gridext_core::{NodeName, NodeSnapshot, Occupant, Unit};

// ── Filter ────────────────────────────────────────────────────────

/// Input to a filter call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterArgs {
    pub unit: Unit,
    pub nodes: Vec<NodeSnapshot>,
    /// When true and no node is feasible, the response also carries
    /// preemption victim proposals.
    #[serde(default)]
    pub preemption_aware: bool,
    /// Caller-supplied deadline override in milliseconds.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

/// Output of a filter call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResult {
    /// Feasible nodes, in candidate order.
    pub nodes: Vec<NodeSnapshot>,
    /// Rejected nodes with the first failing predicate's reason code.
    pub failed_nodes: BTreeMap<NodeName, String>,
    /// Victim proposals, present only for preemption-aware calls that
    /// found no feasible node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preemption_victims: Option<BTreeMap<NodeName, Vec<Occupant>>>,
    /// Call-level error; when set the other fields must be ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FilterResult {
    pub fn error(message: String) -> Self {
        Self {
            nodes: Vec::new(),
            failed_nodes: BTreeMap::new(),
            preemption_victims: None,
            error: Some(message),
        }
    }
}

// ── Prioritize ────────────────────────────────────────────────────

/// Input to a prioritize call. The node list is ranked as-is;
/// filtering is assumed to have happened upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrioritizeArgs {
    pub unit: Unit,
    pub nodes: Vec<NodeSnapshot>,
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

/// One ranked entry; the response is the full ordered list, highest
/// total first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostPriority {
    pub host: NodeName,
    pub score: u64,
}

// ── Preemption ────────────────────────────────────────────────────

/// Input to a preempt call. Occupants ride inside each node snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreemptionArgs {
    pub unit: Unit,
    pub nodes: Vec<NodeSnapshot>,
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

/// Identity-only victim form, for callers that re-evaluate against
/// their own cache rather than trusting the full objects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetaVictim {
    pub uid: String,
}

/// Output of a preempt call: the same victims in both representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreemptionResult {
    pub node_victims: BTreeMap<NodeName, Vec<Occupant>>,
    pub node_meta_victims: BTreeMap<NodeName, Vec<MetaVictim>>,
}

impl PreemptionResult {
    /// Derive both representations from the engine's victim map.
    pub fn from_victims(victims: BTreeMap<NodeName, Vec<Occupant>>) -> Self {
        let node_meta_victims = victims
            .iter()
            .map(|(node, occupants)| {
                (
                    node.clone(),
                    occupants
                        .iter()
                        .map(|o| MetaVictim { uid: o.uid.clone() })
                        .collect(),
                )
            })
            .collect();
        Self {
            node_victims: victims,
            node_meta_victims,
        }
    }
}

// ── Bind ──────────────────────────────────────────────────────────

/// Input to a bind call: unit identity plus target node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindArgs {
    pub unit_name: String,
    pub unit_namespace: String,
    pub unit_uid: String,
    pub node: NodeName,
}

// ── Version ───────────────────────────────────────────────────────

/// Served on `/version`; `supports_bind` is the out-of-band flag the
/// caller reads before ever issuing bind calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
    pub supports_bind: bool,
}
