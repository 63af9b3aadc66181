//! Progress reporting endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::services::progress::{self, Progress, UserProgress};
use crate::{ApiResult, AppState};

/// GET /api/admin/progress/:user_id handler
pub async fn user_progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Progress>> {
    let progress = progress::user_progress(&state.db, &user_id).await?;
    Ok(Json(progress))
}

/// GET /api/admin/assignments handler
///
/// Progress for every annotator, sorted by name.
pub async fn all_assignments(State(state): State<AppState>) -> ApiResult<Json<Vec<UserProgress>>> {
    let entries = progress::all_assignments(&state.db).await?;
    Ok(Json(entries))
}
