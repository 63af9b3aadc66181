//! POST /api/admin/upload-csv - sentence ingestion

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use slat_common::db::settings;

use crate::services::ingestor;
use crate::{ApiError, ApiResult, AppState};

/// Upload response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub inserted: usize,
    pub skipped_duplicates: usize,
}

/// POST /api/admin/upload-csv handler
///
/// Accepts multipart/form-data with a `file` field. The upload is buffered
/// in memory and size-capped by the `csv_max_upload_bytes` runtime setting.
pub async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let max_bytes = settings::csv_max_upload_bytes(&state.db).await? as usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if data.len() > max_bytes {
            return Err(ApiError::BadRequest(format!(
                "CSV upload exceeds the {} byte limit",
                max_bytes
            )));
        }

        let report = ingestor::ingest_csv(&state.db, &data).await?;
        return Ok(Json(UploadResponse {
            message: format!("CSV uploaded: {} sentences inserted.", report.inserted),
            inserted: report.inserted,
            skipped_duplicates: report.skipped_duplicates,
        }));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}
