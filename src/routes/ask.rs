use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;

use crate::dto::ask::AskRequest;
use crate::errors::AppError;
use crate::services::completion::build_prompt;
use crate::state::AppState;

/// Relay one question about one document to the completion API.
///
/// On success the upstream body is forwarded chunk by chunk, byte for byte,
/// so the caller sees the provider's `data:` framing unchanged. Failures
/// before the first byte become a single JSON error body.
#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/ask", tag = "Ask", request_body = AskRequest, responses((status = 200, description = "Relayed text/event-stream from the completion API"), (status = 400, body = crate::errors::ErrorResponse), (status = 500, body = crate::errors::ErrorResponse))))]
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) =
        payload.map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?;

    if !payload.is_complete() {
        return Err(AppError::Validation("Missing inputs".to_string()));
    }

    let prompt = build_prompt(&payload.form_text, &payload.question);

    let upstream = state
        .completion
        .open_stream(&prompt)
        .await
        .map_err(AppError::Upstream)?;

    // A mid-stream failure just ends the relayed body; the consumer treats
    // closure as completion.
    let relayed = upstream.bytes_stream().take_while(|chunk| {
        if let Err(e) = chunk {
            tracing::warn!("Upstream stream ended early: {e}");
        }
        futures::future::ready(chunk.is_ok())
    });

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(relayed),
    )
        .into_response())
}
