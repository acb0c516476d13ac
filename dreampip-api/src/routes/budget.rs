/// Budget endpoints
///
/// All endpoints require a bearer token and act on the caller's own budget.
///
/// # Endpoints
///
/// - `GET /v1/budget` - Stored totals plus the live allocation breakdown
/// - `GET /v1/budget/remaining` - Remaining budget for display
/// - `POST /v1/budget/validate` - Would a new share fit?
/// - `POST /v1/budget/recalculate` - Re-derive and store the totals

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use dreampip_shared::auth::context::AuthContext;
use dreampip_shared::budget::{BudgetPercentage, BudgetSummary, BudgetTotals};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct RemainingBudgetResponse {
    pub remaining_budget: f64,
}

/// Validate allocation request
#[derive(Debug, Deserialize)]
pub struct ValidateAllocationRequest {
    /// Share the caller wants to assign
    pub budget_percentage: f64,

    /// List being edited, whose current share is left out of the baseline
    #[serde(default)]
    pub task_list_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateAllocationResponse {
    pub allowed: bool,
}

/// Get budget summary
///
/// ```text
/// GET /v1/budget
/// Authorization: Bearer <jwt_token>
/// ```
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<BudgetSummary>> {
    Ok(Json(state.ledger.summary(auth.user_id).await?))
}

/// Get remaining budget
///
/// Never fails on storage trouble: an unreadable value reports 100.
///
/// ```text
/// GET /v1/budget/remaining
/// ```
///
/// ```json
/// { "remaining_budget": 59.5 }
/// ```
pub async fn get_remaining(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Json<RemainingBudgetResponse> {
    Json(RemainingBudgetResponse {
        remaining_budget: state.ledger.get_remaining_budget(auth.user_id).await,
    })
}

/// Check an allocation
///
/// Out-of-range percentages are a 422. Storage trouble answers
/// `allowed: false`.
///
/// ```text
/// POST /v1/budget/validate
///
/// { "budget_percentage": 20, "task_list_id": "..." }
/// ```
///
/// ```json
/// { "allowed": true }
/// ```
pub async fn validate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ValidateAllocationRequest>,
) -> ApiResult<Json<ValidateAllocationResponse>> {
    let requested = BudgetPercentage::new(req.budget_percentage)?;

    let allowed = state
        .ledger
        .validate_allocation(auth.user_id, requested.value(), req.task_list_id)
        .await;

    Ok(Json(ValidateAllocationResponse { allowed }))
}

/// Recalculate budget totals
///
/// ```text
/// POST /v1/budget/recalculate
/// ```
///
/// ```json
/// { "used_budget": 40.5, "remaining_budget": 59.5 }
/// ```
pub async fn recalculate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<BudgetTotals>> {
    Ok(Json(state.ledger.recalculate_user_budget(auth.user_id).await?))
}
