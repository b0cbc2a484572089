use utoipa::OpenApi;

use crate::dto::ask::AskRequest;
use crate::dto::upload::UploadResponse;
use crate::errors::ErrorResponse;
use crate::routes::health::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Healthcare QA API",
        version = "0.1.0",
        description = "Upload a healthcare PDF, then ask questions about it with answers streamed from the completion API."
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::upload::upload,
        crate::routes::ask::ask,
    ),
    components(
        schemas(
            HealthResponse,
            UploadResponse,
            AskRequest,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Documents", description = "PDF upload and text extraction"),
        (name = "Ask", description = "Streamed question answering"),
    )
)]
pub struct ApiDoc;
