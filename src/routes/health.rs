use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Whether an upstream API key is present; `/api/ask` fails without one.
    pub upstream_configured: bool,
    pub model: String,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/health", tag = "Health", responses((status = 200, body = HealthResponse))))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let upstream = &state.config.upstream;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream_configured: upstream.api_key.as_deref().is_some_and(|k| !k.is_empty()),
        model: upstream.model.clone(),
    })
}
