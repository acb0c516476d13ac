/// Task-list endpoints
///
/// Every write that touches a budget share is checked against each owner's
/// headroom first and followed by a recalculation of every owner. Lists the
/// caller does not own read as 404.
///
/// A list is shared by inviting another user, who becomes a co-owner (and is
/// charged the list's share) only after accepting.
///
/// # Endpoints
///
/// - `GET /v1/task-lists` - List the caller's task lists
/// - `POST /v1/task-lists` - Create a task list
/// - `GET /v1/task-lists/invites` - Lists the caller is invited to
/// - `GET /v1/task-lists/:id` - Get one task list
/// - `PATCH /v1/task-lists/:id` - Rename and/or change the budget share
/// - `DELETE /v1/task-lists/:id` - Delete a task list
/// - `POST /v1/task-lists/:id/invites` - Invite a co-owner
/// - `POST /v1/task-lists/:id/accept` - Accept an invite
/// - `POST /v1/task-lists/:id/decline` - Decline an invite

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use dreampip_shared::auth::context::AuthContext;
use dreampip_shared::budget::NewTaskList;
use dreampip_shared::models::task_list::{TaskList, UpdateTaskList};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create task list request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskListRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    /// Share of the owner's budget, 0-100 (omit for none)
    #[serde(default)]
    pub budget_percentage: Option<f64>,
}

/// Invite request
#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub user_id: Uuid,
}

/// Update task list request
///
/// `budget_percentage` distinguishes absent (unchanged) from `null` (cleared).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskListRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub budget_percentage: Option<Option<f64>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListTaskListsResponse {
    pub task_lists: Vec<TaskList>,
}

/// List task lists
///
/// ```text
/// GET /v1/task-lists
/// Authorization: Bearer <jwt_token>
/// ```
pub async fn list_task_lists(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ListTaskListsResponse>> {
    let task_lists = state.task_lists.list_for_user(auth.user_id).await?;
    Ok(Json(ListTaskListsResponse { task_lists }))
}

/// Create task list
///
/// ```text
/// POST /v1/task-lists
///
/// { "name": "Groceries", "budget_percentage": 25 }
/// ```
///
/// Returns 201 with the new list, 409 `budget_exceeded` if the caller lacks
/// the headroom, 422 for an invalid name or percentage.
pub async fn create_task_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskListRequest>,
) -> ApiResult<(StatusCode, Json<TaskList>)> {
    req.validate()?;

    let list = state
        .task_lists
        .create(
            auth.user_id,
            NewTaskList {
                name: req.name,
                budget_percentage: req.budget_percentage,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(list)))
}

/// Get task list
pub async fn get_task_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskList>> {
    Ok(Json(state.task_lists.get(auth.user_id, id).await?))
}

/// Update task list
///
/// ```text
/// PATCH /v1/task-lists/:id
///
/// { "budget_percentage": 40 }
/// ```
pub async fn update_task_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskListRequest>,
) -> ApiResult<Json<TaskList>> {
    req.validate()?;

    let list = state
        .task_lists
        .update(
            auth.user_id,
            id,
            UpdateTaskList {
                name: req.name,
                budget_percentage: req.budget_percentage,
            },
        )
        .await?;

    Ok(Json(list))
}

/// Delete task list
///
/// Returns 204; the former owners' totals are recalculated.
pub async fn delete_task_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.task_lists.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists the caller has been invited to
pub async fn list_invites(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ListTaskListsResponse>> {
    let task_lists = state.task_lists.list_invites(auth.user_id).await?;
    Ok(Json(ListTaskListsResponse { task_lists }))
}

/// Invite a co-owner
///
/// ```text
/// POST /v1/task-lists/:id/invites
///
/// { "user_id": "6f1c..." }
/// ```
///
/// The invitee's budget is untouched until they accept.
pub async fn invite_co_owner(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<InviteRequest>,
) -> ApiResult<Json<TaskList>> {
    let list = state.task_lists.invite(auth.user_id, id, req.user_id).await?;
    Ok(Json(list))
}

/// Accept an invite
///
/// Returns 409 `budget_exceeded` if the list's share does not fit the
/// caller's remaining budget; the invite stays open.
pub async fn accept_invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskList>> {
    Ok(Json(state.task_lists.accept_invite(auth.user_id, id).await?))
}

/// Decline an invite
pub async fn decline_invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.task_lists.decline_invite(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
