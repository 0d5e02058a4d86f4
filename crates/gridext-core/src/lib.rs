//! gridext-core — domain types and configuration for the GridExt extender.
//!
//! These types model one decision call's view of the cluster: the unit
//! awaiting placement, read-only node snapshots, and the occupants
//! already running on them. Everything here is ephemeral — constructed
//! from the caller's request payload and discarded with the response.
//! Persistent cluster state lives in the orchestrator, not here.

pub mod config;
pub mod types;

pub use config::{BindMode, ConfigError, ExtenderConfig, PriorityConfig};
pub use types::{
    NodeName, NodeSnapshot, Occupant, ResourceVector, Taint, TaintEffect, Toleration, Unit,
    UnitRef, UnitScheduling,
};
