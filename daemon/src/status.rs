//! Minimal HTTP status endpoint: live UE-context counts per FSM state. No
//! protocol traffic crosses this surface; it exists for ops visibility
//! only.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use emm_core::store::UeContextStore;
use serde::Serialize;

pub struct StatusState {
    pub store: Arc<UeContextStore>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub total_ues: usize,
    pub by_state: HashMap<String, usize>,
}

pub async fn get_status(State(state): State<Arc<StatusState>>) -> Json<StatusResponse> {
    let counts = state.store.state_counts();
    let by_state = counts
        .into_iter()
        .map(|(state, count)| (format!("{state:?}"), count))
        .collect();
    Json(StatusResponse {
        total_ues: state.store.len(),
        by_state,
    })
}

pub fn router(state: Arc<StatusState>) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .with_state(state)
}
