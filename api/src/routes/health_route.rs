//! Service health endpoint.
//!
//! Reports reachability of the AI backends without failing the request:
//! running with AI disabled or a vector index unset is a supported mode,
//! so the endpoint itself always answers 200.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use serde::Serialize;
use serde_json::json;

use ai_llm_service::health_service::HealthStatus;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub ai: HealthStatus,
    pub embeddings: HealthStatus,
    pub index: serde_json::Value,
}

pub async fn health(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let ai = match &state.generation_cfg {
        Some(cfg) => state.health.check(cfg).await,
        None => HealthStatus::disabled(),
    };
    let embeddings = match &state.embedding_cfg {
        Some(cfg) => state.health.check(cfg).await,
        None => HealthStatus::disabled(),
    };

    let report = HealthReport {
        status: "ok",
        ai,
        embeddings,
        index: json!({ "enabled": state.index_enabled }),
    };
    Ok(ApiResponse::success(report).into_response_with_status(StatusCode::OK))
}
