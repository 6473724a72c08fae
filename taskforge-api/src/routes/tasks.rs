/// Ownership-scoped task endpoints
///
/// Every route sits behind the authorization guard, so a resolved identity
/// is always present. The ownership rules in
/// `taskforge_shared::auth::access` decide which records that identity may
/// touch; a mismatch is a `403`, never a silently shortened list (except in
/// `list`, where scoping the query is the contract).
///
/// # Endpoints
///
/// - `POST   /tasks`                          - create a task (admin)
/// - `GET    /tasks`                          - list visible tasks
/// - `GET    /tasks/:id`                      - fetch one task (owner gate)
/// - `PUT    /tasks/:id/status`               - overwrite status (owner gate)
/// - `PUT    /tasks/:task_id/assign/:user_id` - reassign owner (admin)
/// - `DELETE /tasks/:id`                      - delete (admin, silent no-op)
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskforge_shared::{
    auth::{access, guard::AuthorizedUser},
    models::{
        task::{CreateTask, Task, TaskStatus, TaskWithOwner},
        user::{Role, User},
    },
};
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Short title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Optional due date
    pub deadline: Option<NaiveDate>,

    /// Optional initial owner; must reference an existing user
    pub user_id: Option<i64>,
}

/// Status update request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New status; overwrites unconditionally
    pub status: TaskStatus,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// True if a record was deleted, false if the id did not exist
    pub deleted: bool,
}

/// Tasks visible to one identity
///
/// Admins see everything with owners joined; everyone else sees only their
/// own tasks.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TaskListResponse {
    /// All tasks with their owners (admin view)
    All(Vec<TaskWithOwner>),

    /// The caller's own tasks
    Own(Vec<Task>),
}

/// Creates a new task (admin only)
///
/// The initial status is always `Pending`. A pre-assigned owner must exist
/// at assignment time.
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin
/// - `404 Not Found`: `user_id` references no existing user
/// - `422 Unprocessable Entity`: validation failed
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthorizedUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    access::require_role(auth.user(), Role::Admin)?;

    req.validate().map_err(ApiError::from_validation)?;

    if let Some(user_id) = req.user_id {
        if User::find_by_id(&state.db, user_id).await?.is_none() {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            deadline: req.deadline,
            user_id: req.user_id,
        },
    )
    .await?;

    tracing::info!(task_id = task.id, owner = ?task.user_id, "Created task");

    Ok(Json(task))
}

/// Lists the tasks visible to the caller
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthorizedUser>,
) -> ApiResult<Json<TaskListResponse>> {
    let response = if auth.role() == Role::Admin {
        TaskListResponse::All(Task::list_all(&state.db).await?)
    } else {
        TaskListResponse::Own(Task::list_by_owner(&state.db, auth.id()).await?)
    };

    Ok(Json(response))
}

/// Fetches one task
///
/// # Errors
///
/// - `403 Forbidden`: the caller may not touch this task
/// - `404 Not Found`: no such task
pub async fn get_one(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthorizedUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskWithOwner>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    access::require_task_access(auth.user(), task.user_id, state.policy())?;

    Ok(Json(task))
}

/// Overwrites the status of a task
///
/// Same ownership gate as a read; no transition restriction afterwards.
///
/// # Errors
///
/// - `403 Forbidden`: the caller may not touch this task
/// - `404 Not Found`: no such task
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthorizedUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    access::require_task_access(auth.user(), task.user_id, state.policy())?;

    // The row can vanish between the ownership read and the write; treat
    // that as not found rather than racing.
    let updated = Task::update_status(&state.db, id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = id, status = req.status.as_str(), "Updated task status");

    Ok(Json(updated))
}

/// Reassigns a task to a user (admin only)
///
/// No check on the task's prior owner; the reference is simply overwritten.
/// A missing target user fails before anything is written, leaving the
/// owner unchanged.
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin
/// - `404 Not Found`: task or target user absent
pub async fn assign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthorizedUser>,
    Path((task_id, user_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Task>> {
    access::require_role(auth.user(), Role::Admin)?;

    if Task::find_by_id(&state.db, task_id).await?.is_none() {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let task = Task::assign(&state.db, task_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id, user_id, "Assigned task");

    Ok(Json(task))
}

/// Deletes a task (admin only)
///
/// Unconditional delete by id; deleting a nonexistent id completes without
/// error.
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthorizedUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    access::require_role(auth.user(), Role::Admin)?;

    let deleted = Task::delete(&state.db, id).await?;

    if deleted {
        tracing::info!(task_id = id, "Deleted task");
    }

    Ok(Json(DeleteResponse { deleted }))
}
