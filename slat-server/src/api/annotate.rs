//! POST /api/user/annotate/:sentence_id - annotation recording

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::annotator;
use crate::{ApiError, ApiResult, AppState};

/// Annotation request body; `labels` may be empty
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateRequest {
    pub user_id: String,
    pub labels: Vec<String>,
}

/// Annotation acknowledgement
#[derive(Debug, Serialize)]
pub struct AnnotateResponse {
    pub message: String,
}

/// POST /api/user/annotate/:sentence_id handler
pub async fn annotate_sentence(
    State(state): State<AppState>,
    Path(sentence_id): Path<String>,
    Json(request): Json<AnnotateRequest>,
) -> ApiResult<Json<AnnotateResponse>> {
    if Uuid::parse_str(&sentence_id).is_err() {
        return Err(ApiError::BadRequest("Invalid sentenceId".to_string()));
    }
    if Uuid::parse_str(&request.user_id).is_err() {
        return Err(ApiError::BadRequest("Invalid userId".to_string()));
    }

    annotator::annotate(&state.db, &sentence_id, &request.user_id, &request.labels).await?;

    Ok(Json(AnnotateResponse {
        message: "Annotation saved successfully".to_string(),
    }))
}
