//! Extender regression tests.
//!
//! Drives the wire adapter in-process: builds the router from a config
//! exactly as the daemon does, then issues the callback requests the
//! core scheduler would send and checks the structured responses.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use gridext_api::build_router;
use gridext_api::wire::{FilterResult, HostPriority, PreemptionResult, VersionInfo};
use gridext_core::*;
use gridext_engine::{DecisionPipeline, ExtenderRegistry};

fn test_router(config: ExtenderConfig) -> Router {
    let registry = Arc::new(ExtenderRegistry::from_config(&config).unwrap());
    let pipeline = Arc::new(DecisionPipeline::new(&config, registry, None));
    build_router(pipeline)
}

fn default_router() -> Router {
    test_router(ExtenderConfig::default())
}

fn test_unit(cpu: u64, mem: u64) -> Unit {
    Unit {
        name: "api".to_string(),
        namespace: "prod".to_string(),
        uid: "u-1".to_string(),
        resources: ResourceVector::new(cpu, mem),
        scheduling: UnitScheduling::default(),
        priority: 100,
        owner: None,
    }
}

fn test_node(name: &str, free_cpu: u64, free_mem: u64) -> NodeSnapshot {
    NodeSnapshot {
        name: name.to_string(),
        labels: HashMap::new(),
        taints: Vec::new(),
        capacity: ResourceVector::new(free_cpu, free_mem),
        allocatable: ResourceVector::new(free_cpu, free_mem),
        occupants: Vec::new(),
    }
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn filter_returns_feasible_nodes_with_reasons() {
    // Unit needs 2 CPU; n1 has 1 CPU free, n2 has 4 CPU free.
    let router = default_router();

    let body = serde_json::json!({
        "unit": test_unit(2000, 0),
        "nodes": [test_node("n1", 1000, 1024), test_node("n2", 4000, 4096)],
    });

    let resp = router.oneshot(post_json("/filter", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let result: FilterResult = read_json(resp).await;
    assert!(result.error.is_none());
    assert_eq!(result.nodes.len(), 1);
    assert_eq!(result.nodes[0].name, "n2");
    assert_eq!(
        result.failed_nodes.get("n1"),
        Some(&"insufficient-cpu".to_string())
    );
}

#[tokio::test]
async fn filter_with_preemption_fallback_carries_victims() {
    let router = default_router();

    let mut node = test_node("n1", 2000, 4096);
    node.allocatable = ResourceVector::new(0, 4096);
    node.occupants = vec![Occupant {
        name: "victim".to_string(),
        namespace: "prod".to_string(),
        uid: "o-1".to_string(),
        priority: 1,
        resources: ResourceVector::new(2000, 0),
        non_evictable: false,
        owner: None,
    }];

    let body = serde_json::json!({
        "unit": test_unit(2000, 0),
        "nodes": [node],
        "preemption_aware": true,
    });

    let resp = router.oneshot(post_json("/filter", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let result: FilterResult = read_json(resp).await;
    assert!(result.nodes.is_empty());
    let victims = result.preemption_victims.unwrap();
    assert_eq!(victims.get("n1").unwrap()[0].uid, "o-1");
}

#[tokio::test]
async fn prioritize_ranks_highest_first() {
    let router = default_router();

    let body = serde_json::json!({
        "unit": test_unit(1000, 512),
        "nodes": [test_node("packed", 1200, 600), test_node("empty", 8000, 8192)],
    });

    let resp = router.oneshot(post_json("/prioritize", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let ranked: Vec<HostPriority> = read_json(resp).await;
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].host, "empty");
    assert!(ranked[0].score >= ranked[1].score);
}

#[tokio::test]
async fn prioritize_with_zero_priority_preserves_input_order() {
    let config = ExtenderConfig {
        priorities: vec![PriorityConfig {
            name: "zero".to_string(),
            weight: 0,
        }],
        ..ExtenderConfig::default()
    };
    let router = test_router(config);

    let body = serde_json::json!({
        "unit": test_unit(0, 0),
        "nodes": [test_node("n1", 1000, 1024), test_node("n2", 4000, 4096)],
    });

    let resp = router.oneshot(post_json("/prioritize", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let ranked: Vec<HostPriority> = read_json(resp).await;
    assert_eq!(
        ranked,
        vec![
            HostPriority { host: "n1".to_string(), score: 0 },
            HostPriority { host: "n2".to_string(), score: 0 },
        ]
    );
}

#[tokio::test]
async fn preemption_returns_both_victim_representations() {
    let router = default_router();

    let mut node = test_node("n1", 2000, 4096);
    node.allocatable = ResourceVector::new(0, 4096);
    node.occupants = vec![Occupant {
        name: "victim".to_string(),
        namespace: "prod".to_string(),
        uid: "o-1".to_string(),
        priority: 1,
        resources: ResourceVector::new(2000, 0),
        non_evictable: false,
        owner: None,
    }];

    let body = serde_json::json!({
        "unit": test_unit(2000, 0),
        "nodes": [node],
    });

    let resp = router.oneshot(post_json("/preemption", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let result: PreemptionResult = read_json(resp).await;
    assert_eq!(result.node_victims.get("n1").unwrap()[0].uid, "o-1");
    assert_eq!(result.node_meta_victims.get("n1").unwrap()[0].uid, "o-1");
}

#[tokio::test]
async fn preemption_skips_non_evictable_occupants() {
    let router = default_router();

    let mut node = test_node("n1", 2000, 4096);
    node.allocatable = ResourceVector::new(0, 4096);
    node.occupants = vec![Occupant {
        name: "critical".to_string(),
        namespace: "prod".to_string(),
        uid: "o-1".to_string(),
        priority: 1,
        resources: ResourceVector::new(2000, 0),
        non_evictable: true,
        owner: None,
    }];

    let body = serde_json::json!({
        "unit": test_unit(2000, 0),
        "nodes": [node],
    });

    let resp = router.oneshot(post_json("/preemption", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let result: PreemptionResult = read_json(resp).await;
    assert!(result.node_victims.is_empty());
    assert!(result.node_meta_victims.is_empty());
}

#[tokio::test]
async fn bind_declined_by_default_configuration() {
    let router = default_router();

    let body = serde_json::json!({
        "unit_name": "api",
        "unit_namespace": "prod",
        "unit_uid": "u-1",
        "node": "n1",
    });

    let resp = router.oneshot(post_json("/bind", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let outcome: serde_json::Value = read_json(resp).await;
    assert_eq!(outcome["outcome"], "unsupported");
}

#[tokio::test]
async fn version_reports_bind_capability() {
    let router = default_router();

    let req = Request::builder()
        .uri("/version")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let version: VersionInfo = read_json(resp).await;
    assert_eq!(version.name, "gridext");
    assert!(!version.supports_bind);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let router = default_router();

    let req = Request::builder()
        .method("POST")
        .uri("/filter")
        .header("content-type", "application/json")
        .body(Body::from("{\"not\": \"a filter request\"}"))
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn expired_deadline_is_a_timeout_outcome() {
    let router = default_router();

    let body = serde_json::json!({
        "unit": test_unit(100, 100),
        "nodes": [test_node("n1", 1000, 1024)],
        "deadline_ms": 0,
    });

    let resp = router.oneshot(post_json("/filter", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);

    let result: FilterResult = read_json(resp).await;
    assert!(result.error.is_some());
    assert!(result.nodes.is_empty());
}
