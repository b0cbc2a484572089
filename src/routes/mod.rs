pub mod ask;
pub mod health;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Multipart framing overhead allowed on top of the configured file size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = state.config.upload.max_file_size_bytes() + MULTIPART_OVERHEAD;

    let api = Router::new()
        .route("/api/health", get(health::health_check))
        .route(
            "/api/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/ask", post(ask::ask));

    #[cfg(feature = "openapi")]
    let api = {
        use utoipa::OpenApi;
        use utoipa_redoc::{Redoc, Servable};
        api.merge(Redoc::with_url("/docs", crate::openapi::ApiDoc::openapi()))
    };

    api.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
