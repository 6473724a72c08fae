/// User management endpoints
///
/// All routes except `/init` sit behind the authorization guard; the
/// admin-only operations additionally declare their role requirement as the
/// first statement of the handler.
///
/// # Endpoints
///
/// - `GET    /users/init` - bootstrap the initial admin account (public)
/// - `POST   /users`      - create a user (admin)
/// - `GET    /users`      - list all users (admin)
/// - `GET    /users/:id`  - fetch one user (admin, or the user themselves;
///   `id = 0` resolves to the caller)
/// - `DELETE /users/:id`  - delete a user (admin)
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskforge_shared::{
    auth::{access, guard::AuthorizedUser, password},
    models::user::{CreateUser, PublicUser, Role, User},
};
use validator::Validate;

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password, hashed before storage
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Whether the new account gets the admin role
    #[serde(default)]
    pub is_admin: bool,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// True if a record was deleted, false if the id did not exist
    pub deleted: bool,
}

/// Bootstraps the initial admin account
///
/// Public on purpose: it is the only way to create the first account. Runs
/// at most once; a second call fails with `409 Conflict`. The email and
/// password come from configuration, never from the request.
///
/// # Errors
///
/// - `409 Conflict`: the admin account already exists
/// - `500 Internal Server Error`: `ADMIN_BOOTSTRAP_PASSWORD` is not set
pub async fn init(State(state): State<AppState>) -> ApiResult<Json<PublicUser>> {
    let admin_email = &state.config.auth.admin_email;

    if User::find_by_email(&state.db, admin_email).await?.is_some() {
        return Err(ApiError::Conflict("User already initiated".to_string()));
    }

    let admin_password = state
        .config
        .auth
        .admin_password
        .as_deref()
        .ok_or_else(|| {
            ApiError::InternalError("ADMIN_BOOTSTRAP_PASSWORD is not configured".to_string())
        })?;

    let password_hash = password::hash_password(admin_password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: admin_email.clone(),
            password_hash,
            role: Role::Admin,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "Bootstrapped initial admin account");

    Ok(Json(PublicUser::from(user)))
}

/// Creates a new user (admin only)
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin
/// - `409 Conflict`: email already exists
/// - `422 Unprocessable Entity`: validation failed
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthorizedUser>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Json<PublicUser>> {
    access::require_role(auth.user(), Role::Admin)?;

    req.validate().map_err(ApiError::from_validation)?;

    let password_hash = password::hash_password(&req.password)?;
    let role = if req.is_admin { Role::Admin } else { Role::User };

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            role,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = role.as_str(), "Created user");

    Ok(Json(PublicUser::from(user)))
}

/// Lists all users (admin only)
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthorizedUser>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    access::require_role(auth.user(), Role::Admin)?;

    let users = User::list(&state.db).await?;

    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

/// Fetches one user
///
/// `id = 0` resolves to the caller (the "my profile" path). Otherwise the
/// caller must be an admin or the user themselves.
///
/// # Errors
///
/// - `403 Forbidden`: non-admin fetching someone else's record
/// - `404 Not Found`: no such user
pub async fn get_one(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthorizedUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PublicUser>> {
    let target_id = if id == 0 {
        auth.id()
    } else {
        access::require_user_access(auth.user(), id)?;
        id
    };

    let user = User::find_by_id(&state.db, target_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(PublicUser::from(user)))
}

/// Deletes a user (admin only)
///
/// Deleting a nonexistent id completes without error.
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthorizedUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    access::require_role(auth.user(), Role::Admin)?;

    let deleted = User::delete(&state.db, id).await?;

    if deleted {
        tracing::info!(user_id = id, "Deleted user");
    }

    Ok(Json(DeleteResponse { deleted }))
}
