use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

/// Liveness check. Reports which external integrations are configured.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "pitch-backend",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "supabase": !state.config.store.url.is_empty(),
            "livekit": state.token_signer.is_some(),
        }
    }))
}

/// Readiness check: the data store must answer an admin round trip.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.admin().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
