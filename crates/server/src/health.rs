use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use recipebot_core::config::AppConfig;
use recipebot_core::session::InMemorySessionStore;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    search_configured: bool,
    intent_name: String,
    sessions: Arc<InMemorySessionStore>,
}

impl HealthState {
    pub fn new(config: &AppConfig, sessions: Arc<InMemorySessionStore>) -> Self {
        Self {
            search_configured: config.search.has_credentials(),
            intent_name: config.dialog.intent_name.clone(),
            sessions,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub search: HealthCheck,
    pub active_sessions: usize,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let search = if state.search_configured {
        HealthCheck { status: "ready", detail: "search credentials configured".to_string() }
    } else {
        HealthCheck {
            status: "degraded",
            detail: "search.app_id or search.app_key is missing".to_string(),
        }
    };
    let ready = search.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("serving intent `{}`", state.intent_name),
        },
        search,
        active_sessions: state.sessions.session_count(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
