//! Extender callback handlers.
//!
//! Each handler deserializes the call's arguments, invokes the
//! pipeline, and serializes the structured result. No decision logic
//! lives here — the adapter owns routing and shapes only.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::warn;

use gridext_core::UnitRef;
use gridext_engine::{BindOutcome, EngineError};

use crate::ApiState;
use crate::wire::*;

fn error_status(err: &EngineError) -> StatusCode {
    match err {
        EngineError::DeadlineExceeded => StatusCode::REQUEST_TIMEOUT,
        EngineError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &EngineError) -> impl IntoResponse {
    (
        error_status(err),
        Json(serde_json::json!({ "error": err.to_string() })),
    )
}

/// POST /filter
pub async fn filter(
    State(state): State<ApiState>,
    Json(args): Json<FilterArgs>,
) -> impl IntoResponse {
    match state
        .pipeline
        .filter(&args.unit, &args.nodes, args.preemption_aware, args.deadline_ms)
    {
        Ok(decision) => {
            let failed_nodes = decision
                .outcome
                .failures
                .iter()
                .map(|(node, reason)| (node.clone(), reason.as_str().to_string()))
                .collect();
            Json(FilterResult {
                nodes: decision.outcome.feasible,
                failed_nodes,
                preemption_victims: decision.preemption,
                error: None,
            })
            .into_response()
        }
        // Filter carries call-level errors in-band; the status still
        // reflects the failure class.
        Err(err) => {
            warn!(unit = %args.unit.qualified_name(), error = %err, "filter call failed");
            (error_status(&err), Json(FilterResult::error(err.to_string()))).into_response()
        }
    }
}

/// POST /prioritize
pub async fn prioritize(
    State(state): State<ApiState>,
    Json(args): Json<PrioritizeArgs>,
) -> impl IntoResponse {
    match state
        .pipeline
        .prioritize(&args.unit, &args.nodes, args.deadline_ms)
    {
        Ok(ranked) => {
            let list: Vec<HostPriority> = ranked
                .into_iter()
                .map(|r| HostPriority {
                    host: r.name,
                    score: r.total,
                })
                .collect();
            Json(list).into_response()
        }
        Err(err) => {
            warn!(unit = %args.unit.qualified_name(), error = %err, "prioritize call failed");
            error_response(&err).into_response()
        }
    }
}

/// POST /preemption
pub async fn preemption(
    State(state): State<ApiState>,
    Json(args): Json<PreemptionArgs>,
) -> impl IntoResponse {
    match state
        .pipeline
        .preempt(&args.unit, &args.nodes, args.deadline_ms)
    {
        Ok(victims) => Json(PreemptionResult::from_victims(victims)).into_response(),
        Err(err) => {
            warn!(unit = %args.unit.qualified_name(), error = %err, "preempt call failed");
            error_response(&err).into_response()
        }
    }
}

/// POST /bind
pub async fn bind(
    State(state): State<ApiState>,
    Json(args): Json<BindArgs>,
) -> impl IntoResponse {
    let unit = UnitRef {
        name: args.unit_name,
        namespace: args.unit_namespace,
        uid: args.unit_uid,
    };

    let outcome = state.pipeline.bind(&unit, &args.node);
    let status = match &outcome {
        BindOutcome::Bound | BindOutcome::Unsupported => StatusCode::OK,
        BindOutcome::Conflict(_) => StatusCode::CONFLICT,
    };
    (status, Json(outcome)).into_response()
}

/// GET /version
pub async fn version(State(state): State<ApiState>) -> impl IntoResponse {
    Json(VersionInfo {
        name: "gridext".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        supports_bind: state.pipeline.supports_bind(),
    })
}
