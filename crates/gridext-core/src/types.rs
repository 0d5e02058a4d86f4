//! Domain types for one extender decision call.
//!
//! The caller's core scheduler serializes these into each callback; they
//! are immutable for the duration of the call. All types are JSON
//! serializable since the wire adapter passes them through unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a node in the cluster.
pub type NodeName = String;

// ── Unit ──────────────────────────────────────────────────────────

/// A workload unit awaiting placement.
///
/// `namespace/name` is globally unique; `uid` survives renames and is
/// what bind and preemption responses carry back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    /// Resources requested per instance of this unit.
    pub resources: ResourceVector,
    /// Placement constraints evaluated by predicates and priorities.
    #[serde(default)]
    pub scheduling: UnitScheduling,
    /// Preemption ordering: higher values preempt lower ones.
    #[serde(default)]
    pub priority: i32,
    /// Owning controller, used for spread scoring.
    #[serde(default)]
    pub owner: Option<String>,
}

impl Unit {
    /// Reduced identity used in bind calls and victim metadata.
    pub fn to_ref(&self) -> UnitRef {
        UnitRef {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            uid: self.uid.clone(),
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Identity-only view of a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitRef {
    pub name: String,
    pub namespace: String,
    pub uid: String,
}

/// Scheduling constraints carried by a unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UnitScheduling {
    /// Hard node-label requirements (all must match).
    #[serde(default)]
    pub required_labels: HashMap<String, String>,
    /// Soft node-label preferences (each match raises affinity score).
    #[serde(default)]
    pub preferred_labels: HashMap<String, String>,
    /// Taints this unit tolerates.
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
}

// ── Node ──────────────────────────────────────────────────────────

/// Read-only snapshot of a placement target.
///
/// The cluster at large mutates nodes; within one decision call this
/// snapshot is fixed and predicate evaluation must not alter it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSnapshot {
    pub name: NodeName,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub taints: Vec<Taint>,
    /// Total capacity of the node.
    pub capacity: ResourceVector,
    /// Resources still unclaimed under current occupancy.
    pub allocatable: ResourceVector,
    /// Units currently placed on this node (input to preemption).
    #[serde(default)]
    pub occupants: Vec<Occupant>,
}

impl NodeSnapshot {
    /// Snapshot with the given occupants removed and their resources
    /// returned to `allocatable`. Used by preemption simulation.
    pub fn without_occupants(&self, evicted_uids: &[String]) -> NodeSnapshot {
        let mut node = self.clone();
        let mut freed = ResourceVector::default();
        node.occupants.retain(|o| {
            if evicted_uids.contains(&o.uid) {
                freed = freed.saturating_add(&o.resources);
                false
            } else {
                true
            }
        });
        node.allocatable = node.allocatable.saturating_add(&freed);
        node
    }
}

/// A unit already running on a node, as seen by preemption.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Occupant {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    /// Occupants with lower priority than the incoming unit are
    /// eviction candidates.
    #[serde(default)]
    pub priority: i32,
    pub resources: ResourceVector,
    /// Marked occupants are never selected as victims.
    #[serde(default)]
    pub non_evictable: bool,
    #[serde(default)]
    pub owner: Option<String>,
}

impl Occupant {
    pub fn to_ref(&self) -> UnitRef {
        UnitRef {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            uid: self.uid.clone(),
        }
    }
}

// ── Resources ─────────────────────────────────────────────────────

/// CPU/memory vector. Arithmetic saturates so a stale snapshot can
/// never underflow into a huge free value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceVector {
    pub cpu_millis: u64,
    pub memory_bytes: u64,
}

impl ResourceVector {
    pub fn new(cpu_millis: u64, memory_bytes: u64) -> Self {
        Self {
            cpu_millis,
            memory_bytes,
        }
    }

    pub fn saturating_add(&self, other: &ResourceVector) -> ResourceVector {
        ResourceVector {
            cpu_millis: self.cpu_millis.saturating_add(other.cpu_millis),
            memory_bytes: self.memory_bytes.saturating_add(other.memory_bytes),
        }
    }

    pub fn saturating_sub(&self, other: &ResourceVector) -> ResourceVector {
        ResourceVector {
            cpu_millis: self.cpu_millis.saturating_sub(other.cpu_millis),
            memory_bytes: self.memory_bytes.saturating_sub(other.memory_bytes),
        }
    }

    /// True when every component of `other` fits into this vector.
    pub fn fits(&self, other: &ResourceVector) -> bool {
        self.cpu_millis >= other.cpu_millis && self.memory_bytes >= other.memory_bytes
    }
}

// ── Taints ────────────────────────────────────────────────────────

/// Node taint repelling units that do not tolerate it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaintEffect {
    /// Hard repel: filtered out unless tolerated.
    NoSchedule,
    /// Soft repel: admissible, priorities may penalize.
    PreferNoSchedule,
}

/// Unit-side toleration matching a taint by key (and value, if set).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Toleration {
    pub key: String,
    /// `None` tolerates any value for the key.
    #[serde(default)]
    pub value: Option<String>,
}

impl Toleration {
    pub fn tolerates(&self, taint: &Taint) -> bool {
        self.key == taint.key
            && match &self.value {
                Some(v) => *v == taint.value,
                None => true,
            }
    }
}
