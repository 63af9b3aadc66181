//! POST /api/admin/assign - batch assignment reconciliation

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use slat_common::db::settings;

use crate::services::reconciler::{self, ReconcileOutcome};
use crate::{ApiResult, AppState};

/// Assignment request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub user_id: String,
    pub start_index: i64,
    /// Defaults to the `default_batch_size` runtime setting when absent
    pub batch_size: Option<i64>,
}

/// Assignment response; counters are present or absent per outcome
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignResponse {
    pub message: String,
    pub batch_start: i64,
    pub batch_end: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newly_assigned: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates_already_owned: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts_assigned_to_others: Option<i64>,
}

impl From<ReconcileOutcome> for AssignResponse {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::NewAssignment {
                batch_start,
                batch_end,
                newly_assigned,
                duplicates_already_owned,
                conflicts_assigned_to_others,
            } => AssignResponse {
                message: "Assignment processed.".to_string(),
                batch_start,
                batch_end,
                newly_assigned: Some(newly_assigned),
                duplicates_already_owned: Some(duplicates_already_owned),
                conflicts_assigned_to_others: Some(conflicts_assigned_to_others),
            },
            ReconcileOutcome::GapFill { batch_start, batch_end, newly_assigned } => AssignResponse {
                message: format!(
                    "Gap fill complete. {} missing sentences assigned.",
                    newly_assigned
                ),
                batch_start,
                batch_end,
                newly_assigned: Some(newly_assigned),
                duplicates_already_owned: None,
                conflicts_assigned_to_others: None,
            },
            ReconcileOutcome::AlreadyAssigned { batch_start, batch_end } => AssignResponse {
                message: format!(
                    "This batch ({}-{}) is already fully assigned to this user.",
                    batch_start, batch_end
                ),
                batch_start,
                batch_end,
                newly_assigned: None,
                duplicates_already_owned: None,
                conflicts_assigned_to_others: None,
            },
        }
    }
}

/// POST /api/admin/assign handler
pub async fn assign_batch(
    State(state): State<AppState>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<Json<AssignResponse>> {
    let batch_size = match request.batch_size {
        Some(size) => size,
        None => settings::default_batch_size(&state.db).await?,
    };

    let outcome =
        reconciler::reconcile(&state.db, &request.user_id, request.start_index, batch_size).await?;

    Ok(Json(outcome.into()))
}
