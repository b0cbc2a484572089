use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or unusable request input. No upstream work is attempted.
    #[error("{0}")]
    Validation(String),

    /// The uploaded document could not be turned into text.
    #[error("Failed to process PDF: {0:#}")]
    Processing(anyhow::Error),

    /// The completion API could not be reached or refused the request.
    #[error("Upstream request failed: {0:#}")]
    Upstream(anyhow::Error),
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Processing(e) => {
                tracing::error!("PDF processing failed: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process PDF".to_string(),
                )
            }
            AppError::Upstream(e) => {
                tracing::error!("Upstream request failed: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "OpenRouter request failed".to_string(),
                )
            }
        };

        let body = axum::Json(ErrorResponse {
            error: message,
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let response = AppError::Validation("Missing inputs".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_and_processing_map_to_server_error() {
        let upstream = AppError::Upstream(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let processing = AppError::Processing(anyhow::anyhow!("not a pdf")).into_response();
        assert_eq!(processing.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
