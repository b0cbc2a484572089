use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::dto::upload::UploadResponse;
use crate::errors::AppError;
use crate::services::pdf;
use crate::state::AppState;

/// Form field the browser client submits the document under.
pub const FILE_FIELD: &str = "file";

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/upload", tag = "Documents", request_body(content_type = "multipart/form-data", description = "PDF file in the `file` field"), responses((status = 200, body = UploadResponse), (status = 400, body = crate::errors::ErrorResponse), (status = 500, body = crate::errors::ErrorResponse))))]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let max_size = state.config.upload.max_file_size_bytes();

    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart data: {e}")))?
    {
        let is_file = field.name() == Some(FILE_FIELD) || field.file_name().is_some();
        if !is_file {
            continue;
        }

        let filename = field.file_name().unwrap_or("unnamed.pdf").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;

        tracing::info!("Received upload '{filename}' ({} bytes)", bytes.len());
        data = Some(bytes);
        break;
    }

    let data = data.ok_or_else(|| AppError::Validation("Invalid file type".to_string()))?;

    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    if data.len() > max_size {
        return Err(AppError::Validation(format!(
            "File too large. Maximum size is {} MB",
            state.config.upload.max_file_size_mb
        )));
    }

    let text = pdf::extract_text(data.to_vec(), &state.config.upload)
        .await
        .map_err(AppError::Processing)?;

    Ok(Json(UploadResponse { text }))
}
