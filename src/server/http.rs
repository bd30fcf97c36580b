//! HTTP API handlers

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use crate::orchestrator::prompts::PanelDefaults;
use crate::orchestrator::{run_consultation, ConsultationRequest};
use crate::server::ServerState;

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
    pub model: String,
}

/// Status handler
pub async fn status_handler(
    State(state): State<ServerState>,
) -> impl IntoResponse {
    let response = StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.config.llm.provider.to_string(),
        model: state.config.llm.model.clone(),
    };

    (StatusCode::OK, Json(response))
}

/// Default panel, scenario and round bounds for the UI form
pub async fn defaults_handler(
    State(state): State<ServerState>,
) -> impl IntoResponse {
    (StatusCode::OK, Json(PanelDefaults::new(state.config.panel.default_max_rounds)))
}

/// Run one consultation.
///
/// Always answers 200: precondition and provider failures are reported in
/// the outcome's `final_plan` with an empty transcript.
pub async fn run_consultation_handler(
    State(state): State<ServerState>,
    Json(req): Json<ConsultationRequest>,
) -> impl IntoResponse {
    tracing::debug!("Consultation request: {:?}", req);
    let outcome = run_consultation(&state.config.llm, &state.http_client, &req).await;
    (StatusCode::OK, Json(outcome))
}
