//! GET /api/admin/users - annotator directory

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{ApiResult, AppState};

/// One directory entry: identity only, no role or credentials
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

/// GET /api/admin/users handler
///
/// Every user with role "user", for the admin's assignment view.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserEntry>>> {
    let rows: Vec<(String, String, String)> =
        sqlx::query_as("SELECT guid, name, email FROM users WHERE role = 'user'")
            .fetch_all(&state.db)
            .await
            .map_err(slat_common::Error::from)?;

    Ok(Json(
        rows.into_iter()
            .map(|(user_id, name, email)| UserEntry { user_id, name, email })
            .collect(),
    ))
}
