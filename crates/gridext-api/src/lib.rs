//! gridext-api — the wire adapter for the extender callbacks.
//!
//! Owns the routing table and the request/response envelopes; every
//! decision is made by `gridext_engine::DecisionPipeline`. Each call
//! arrives as one JSON request and leaves as one JSON response.
//!
//! # Routes
//!
//! | Method | Path | Call |
//! |---|---|---|
//! | POST | `/filter` | Predicate filtering (± preemption fallback) |
//! | POST | `/prioritize` | Weighted ranking |
//! | POST | `/preemption` | Victim selection |
//! | POST | `/bind` | Bind delegation |
//! | GET | `/version` | Identity + bind capability |

pub mod handlers;
pub mod wire;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use gridext_engine::DecisionPipeline;

/// Shared state for the callback handlers.
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<DecisionPipeline>,
}

/// Build the extender router.
pub fn build_router(pipeline: Arc<DecisionPipeline>) -> Router {
    let state = ApiState { pipeline };

    Router::new()
        .route("/filter", post(handlers::filter))
        .route("/prioritize", post(handlers::prioritize))
        .route("/preemption", post(handlers::preemption))
        .route("/bind", post(handlers::bind))
        .route("/version", get(handlers::version))
        .with_state(state)
}
