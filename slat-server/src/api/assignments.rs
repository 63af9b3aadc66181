//! GET /api/admin/assignments/:user_id - per-user assignment detail

use axum::{
    extract::{Path, State},
    Json,
};

use crate::services::listing::{self, AssignmentDetail};
use crate::{ApiResult, AppState};

/// GET /api/admin/assignments/:user_id handler
pub async fn user_assignment_detail(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<AssignmentDetail>> {
    let detail = listing::user_assignment_detail(&state.db, &user_id).await?;
    Ok(Json(detail))
}
