/**
 * API REST DAILY PULSE - Serveur HTTP de l'agent
 *
 * RÔLE :
 * Expose le point d'entrée de l'agent, le proxy de session ChatKit et deux health checks.
 *
 * FONCTIONNEMENT :
 * - GET  /          -> {ok: true, service: "daily-pulse-agent"}
 * - GET  /health    -> {status: "healthy"}
 * - POST /agent/run -> métriques -> résumé bilingue -> publication Bubble optionnelle
 * - POST /chatkit   -> {client_secret, expires_at}, statut upstream relayé
 * - Corps lu en JSON quel que soit le Content-Type, champs non validés, absents = défauts
 * - Erreurs upstream non rattrapées -> 500 {ok: false, error}
 *
 * SÉCURITÉ :
 * Aucune authentification entrante, aucun rate limiting.
 */

use crate::error::PulseError;
use crate::models::{AgentRunRequest, AgentRunResponse};
use crate::orchestrator::RequestOrchestrator;
use crate::upstream::SessionIssuer;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

pub const SERVICE_NAME: &str = "daily-pulse-agent";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RequestOrchestrator>,
    pub sessions: Arc<dyn SessionIssuer>,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/agent/run", post(run_agent))
        .route("/chatkit", post(create_chatkit_session))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

impl IntoResponse for PulseError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!(%status, error = %self, "request failed");
        (status, Json(json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}

// GET /
async fn root() -> Json<Value> {
    Json(json!({ "ok": true, "service": SERVICE_NAME }))
}

// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

// POST /agent/run
async fn run_agent(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<AgentRunResponse>, PulseError> {
    let request = parse_run_request(&body)?;
    let response = app.orchestrator.run(&request).await?;
    Ok(Json(response))
}

// POST /chatkit (le corps entrant est ignoré)
async fn create_chatkit_session(
    State(app): State<AppState>,
) -> Result<(StatusCode, Json<Value>), PulseError> {
    let grant = app.sessions.create_session().await?;
    Ok((grant.status, Json(grant.body())))
}

fn parse_run_request(body: &[u8]) -> Result<AgentRunRequest, PulseError> {
    // corps vide = {}
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AgentRunRequest::default());
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| PulseError::MalformedBody(e.to_string()))?;
    if !value.is_object() {
        return Err(PulseError::MalformedBody("expected a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| PulseError::MalformedBody(e.to_string()))
}
