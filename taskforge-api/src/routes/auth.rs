/// Authentication endpoint
///
/// # Endpoints
///
/// - `POST /auth/login` - validate credentials and issue a token
///
/// Login failures never reveal whether the email or the password was wrong:
/// an unknown email and a bad password produce the identical error kind,
/// message, and status, and both branches pay the same Argon2 cost so
/// response timing does not leak which one failed.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskforge_shared::{
    auth::{jwt, password},
    models::{
        task::Task,
        user::{PublicUser, User},
    },
};
use validator::Validate;

/// The one message both login failure branches collapse to
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
///
/// The issued token plus the signed-in user's record and their task list.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token, valid for 14 days. Send it back in the `token` header.
    pub token: String,

    /// The signed-in user (without the password hash)
    pub user: PublicUser,

    /// Tasks owned by the user
    pub tasks: Vec<Task>,
}

/// Login handler
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email OR wrong password (indistinguishable)
/// - `422 Unprocessable Entity`: validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    // Both failure branches must collapse to the same error so the response
    // cannot be used to enumerate accounts.
    let Some(user) = User::find_by_email(&state.db, &req.email).await? else {
        // Burn the same Argon2 cost as a real verification so response
        // timing does not separate unknown emails from wrong passwords.
        let _ = password::hash_password(&req.password);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = jwt::issue_token(user.id, state.jwt_secret())?;
    let tasks = Task::list_by_owner(&state.db, user.id).await?;

    tracing::info!(user_id = user.id, "User signed in");

    Ok(Json(LoginResponse {
        token,
        user: PublicUser::from(user),
        tasks,
    }))
}
