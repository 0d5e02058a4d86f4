//! Bind delegation.
//!
//! The extender either commits the final unit→node assignment itself
//! (delegating mode) or tells the caller to do it (declining mode).
//! The mode is fixed at configuration time; the caller learns it
//! out-of-band and must never retry an `Unsupported` outcome.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use gridext_core::{NodeName, UnitRef};

/// Failure reported by the cluster-state collaborator during commit.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CommitError(pub String);

/// External collaborator that owns cluster state mutation.
///
/// A commit either fully lands or fully fails; implementations must
/// not leave partial state behind, and the delegate never retries.
pub trait ClusterCommit: Send + Sync {
    fn commit(&self, unit: &UnitRef, node: &NodeName) -> Result<(), CommitError>;
}

/// Result of one bind attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum BindOutcome {
    /// The assignment was committed.
    Bound,
    /// This extender never binds; the caller must bind itself and must
    /// not retry here.
    Unsupported,
    /// The target node became infeasible between scoring and bind.
    /// Retryable — but retry policy belongs to the caller.
    Conflict(String),
}

/// Performs or refuses the final assignment, per configured mode.
pub enum BindDelegate {
    /// Always answers `Unsupported`, mutating nothing.
    Declining,
    /// Commits through the cluster-state collaborator, at most once
    /// per decision call.
    Delegating(Arc<dyn ClusterCommit>),
}

impl BindDelegate {
    /// Whether the caller may issue bind calls at all. Surfaced
    /// out-of-band via the version endpoint.
    pub fn supports_bind(&self) -> bool {
        matches!(self, BindDelegate::Delegating(_))
    }

    /// One bind attempt for one decision call. No internal retries.
    pub fn bind(&self, unit: &UnitRef, node: &NodeName) -> BindOutcome {
        match self {
            BindDelegate::Declining => BindOutcome::Unsupported,
            BindDelegate::Delegating(commit) => match commit.commit(unit, node) {
                Ok(()) => {
                    info!(
                        unit = %format!("{}/{}", unit.namespace, unit.name),
                        node = %node,
                        "unit bound"
                    );
                    BindOutcome::Bound
                }
                Err(err) => {
                    warn!(
                        unit = %format!("{}/{}", unit.namespace, unit.name),
                        node = %node,
                        error = %err,
                        "bind commit failed"
                    );
                    BindOutcome::Conflict(err.to_string())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn unit_ref() -> UnitRef {
        UnitRef {
            name: "api".to_string(),
            namespace: "prod".to_string(),
            uid: "u-1".to_string(),
        }
    }

    /// Records commits; fails when told to.
    struct RecordingCommit {
        committed: Mutex<Vec<(UnitRef, NodeName)>>,
        fail: bool,
    }

    impl RecordingCommit {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                committed: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    impl ClusterCommit for RecordingCommit {
        fn commit(&self, unit: &UnitRef, node: &NodeName) -> Result<(), CommitError> {
            if self.fail {
                return Err(CommitError("node already claimed".to_string()));
            }
            self.committed
                .lock()
                .unwrap()
                .push((unit.clone(), node.clone()));
            Ok(())
        }
    }

    #[test]
    fn declining_mode_always_unsupported() {
        let delegate = BindDelegate::Declining;
        assert!(!delegate.supports_bind());

        for node in ["n1", "n2", "n3"] {
            assert_eq!(
                delegate.bind(&unit_ref(), &node.to_string()),
                BindOutcome::Unsupported
            );
        }
    }

    #[test]
    fn delegating_mode_commits_once() {
        let commit = RecordingCommit::new(false);
        let delegate = BindDelegate::Delegating(commit.clone());
        assert!(delegate.supports_bind());

        let outcome = delegate.bind(&unit_ref(), &"n1".to_string());
        assert_eq!(outcome, BindOutcome::Bound);

        let committed = commit.committed.lock().unwrap();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].1, "n1");
    }

    #[test]
    fn commit_failure_is_conflict_with_no_mutation() {
        let commit = RecordingCommit::new(true);
        let delegate = BindDelegate::Delegating(commit.clone());

        let outcome = delegate.bind(&unit_ref(), &"n1".to_string());
        assert!(matches!(outcome, BindOutcome::Conflict(_)));
        assert!(commit.committed.lock().unwrap().is_empty());
    }

    #[test]
    fn bind_outcome_serializes_structurally() {
        // The caller distinguishes "never binds" from "retry later" by
        // shape, not by parsing message text.
        let unsupported = serde_json::to_value(BindOutcome::Unsupported).unwrap();
        assert_eq!(unsupported["outcome"], "unsupported");

        let conflict =
            serde_json::to_value(BindOutcome::Conflict("node gone".to_string())).unwrap();
        assert_eq!(conflict["outcome"], "conflict");
        assert_eq!(conflict["detail"], "node gone");
    }
}
