use crate::AppState;
use crate::api::error::AppError;
use crate::models::UploadReport;
use crate::services::upload_service::FilePart;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::HeaderMap,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;

/// Multipart field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: String,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Classification report for the upload", body = UploadReport),
        (status = 400, description = "No file part in the request", body = crate::models::ErrorResponse),
        (status = 413, description = "Request body too large", body = crate::models::ErrorResponse),
        (status = 500, description = "Upload could not be saved", body = crate::models::ErrorResponse)
    ),
    tag = "upload"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadReport>, AppError> {
    // A body that is not multipart/form-data simply has no file part
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!("Upload without multipart body: {}", rejection);
        AppError::MissingFile
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::from_multipart)?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // Browsers send an empty filename when no file was chosen
        let Some(filename) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        let part = FilePart {
            filename,
            content_type: field.content_type().map(str::to_string),
        };

        let body_with_io_error = field.map_err(std::io::Error::other);
        let reader = StreamReader::new(body_with_io_error);

        let report = state
            .upload_service
            .receive(&headers, part, Box::new(reader))
            .await?;

        return Ok(Json(report));
    }

    Err(AppError::MissingFile)
}
