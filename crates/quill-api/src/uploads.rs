use std::path::Path;

use anyhow::Context;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field holding the file.
const UPLOAD_FIELD: &str = "image";

/// Public URL prefix the upload directory is served under.
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Lowercased extension of a client file name, if it is short and alphanumeric.
fn safe_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
}

/// POST /upload — multipart `image` field, saved as `{upload_dir}/{uuid}.{ext}`.
/// The client file name is never used as a path.
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let ext = field.file_name().and_then(safe_extension);
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(ApiError::Validation("Uploaded file is empty".into()));
        }

        let file_name = match ext {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        let dir = &state.config.upload_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating upload directory {}", dir.display()))?;
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("writing upload {}", path.display()))?;

        info!("Stored upload {} ({} bytes)", file_name, bytes.len());

        return Ok((
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "File uploaded successfully",
                "path": format!("{}/{}", UPLOADS_PREFIX, file_name),
            })),
        ));
    }

    Err(ApiError::Validation(format!(
        "Multipart field '{}' is required",
        UPLOAD_FIELD
    )))
}
