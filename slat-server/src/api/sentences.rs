//! GET /api/user/assigned-sentences/:user_id - annotator work list

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::services::listing::{self, AssignedSentence};
use crate::{ApiError, ApiResult, AppState};

/// GET /api/user/assigned-sentences/:user_id handler
///
/// Sentences inside the user's incomplete batch ranges, ordered by index,
/// each with its annotations.
pub async fn assigned_sentences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<AssignedSentence>>> {
    if Uuid::parse_str(&user_id).is_err() {
        return Err(ApiError::BadRequest("Invalid userId".to_string()));
    }

    let sentences = listing::assigned_sentences(&state.db, &user_id).await?;
    Ok(Json(sentences))
}
