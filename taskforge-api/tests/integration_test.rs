/// Integration tests for the TaskForge API
///
/// These tests verify the full system works end-to-end:
/// - Login with credential verification and uniform failure responses
/// - Guard rejection of missing, garbage, and orphaned tokens
/// - Ownership scoping on task reads, writes, and listings
/// - Admin-only gates on management operations
/// - Assignment and deletion edge cases
///
/// They need a reachable PostgreSQL (`DATABASE_URL`) and are ignored by
/// default; run them with `cargo test -- --ignored`.
mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::json;
use taskforge_shared::models::task::Task;
use taskforge_shared::models::user::Role;
use tower::Service as _;

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("token", token)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("token", token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test login returns a token that works against protected routes
#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_login_roundtrip() {
    let mut ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "email": ctx.member.email,
                "password": common::TEST_PASSWORD,
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["email"], ctx.member.email.as_str());
    assert!(body["tasks"].is_array());
    // Login must never leak the stored hash.
    assert!(body["user"].get("password_hash").is_none());

    // The issued token authenticates the self-profile route.
    let response = ctx.app.call(get("/users/0", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await.unwrap();
    assert_eq!(body["id"], ctx.member.id);

    ctx.cleanup().await.unwrap();
}

/// Test unknown email and wrong password fail identically
#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_login_failures_are_indistinguishable() {
    let mut ctx = TestContext::new().await.unwrap();

    let unknown_email = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "email": "nobody@example.com",
                "password": common::TEST_PASSWORD,
            })
            .to_string(),
        ))
        .unwrap();

    let wrong_password = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "email": ctx.member.email,
                "password": "not the password",
            })
            .to_string(),
        ))
        .unwrap();

    let response_a = ctx.app.call(unknown_email).await.unwrap();
    let response_b = ctx.app.call(wrong_password).await.unwrap();

    assert_eq!(response_a.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response_b.status(), StatusCode::UNAUTHORIZED);

    // Identical bodies, so the response cannot be used to enumerate
    // registered emails.
    let body_a = common::body_json(response_a).await.unwrap();
    let body_b = common::body_json(response_b).await.unwrap();
    assert_eq!(body_a, body_b);

    ctx.cleanup().await.unwrap();
}

/// Test requests without a token header are rejected
#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_missing_token_rejected() {
    let mut ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/tasks")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = common::body_json(response).await.unwrap();
    assert_eq!(body["error"], "invalid_token");

    ctx.cleanup().await.unwrap();
}

/// Test a garbage token is rejected as invalid_token
#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_garbage_token_rejected() {
    let mut ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .call(get("/tasks", "not.a.jwt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = common::body_json(response).await.unwrap();
    assert_eq!(body["error"], "invalid_token");

    ctx.cleanup().await.unwrap();
}

/// Test a valid token whose subject no longer exists is rejected
#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_token_for_deleted_user_rejected() {
    let mut ctx = TestContext::new().await.unwrap();

    let ghost = common::create_test_user(&ctx.db, Role::User).await.unwrap();
    let ghost_token =
        taskforge_shared::auth::jwt::issue_token(ghost.id, &ctx.config.jwt.secret).unwrap();
    taskforge_shared::models::user::User::delete(&ctx.db, ghost.id)
        .await
        .unwrap();

    let response = ctx.app.call(get("/tasks", &ghost_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = common::body_json(response).await.unwrap();
    assert_eq!(body["error"], "invalid_user");

    ctx.cleanup().await.unwrap();
}

/// Test ownership gating: owner and admin pass, another member does not
#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_task_ownership_scenarios() {
    let mut ctx = TestContext::new().await.unwrap();

    let other = common::create_test_user(&ctx.db, Role::User).await.unwrap();
    let other_token =
        taskforge_shared::auth::jwt::issue_token(other.id, &ctx.config.jwt.secret).unwrap();

    let task = common::create_test_task(&ctx, "ownership-test", Some(ctx.member.id))
        .await
        .unwrap();
    let uri = format!("/tasks/{}", task.id);

    // Owner reads their own task.
    let response = ctx.app.call(get(&uri, &ctx.member_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Another member is refused, with 403 rather than a masking 404.
    let response = ctx.app.call(get(&uri, &other_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // An admin may read any task.
    let response = ctx.app.call(get(&uri, &ctx.admin_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The gate applies to status writes the same way.
    let response = ctx
        .app
        .call(json_request(
            "PUT",
            &format!("/tasks/{}/status", task.id),
            &other_token,
            json!({ "status": "completed" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .call(json_request(
            "PUT",
            &format!("/tasks/{}/status", task.id),
            &ctx.member_token,
            json!({ "status": "in_progress" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    Task::delete(&ctx.db, task.id).await.unwrap();
    taskforge_shared::models::user::User::delete(&ctx.db, other.id)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

/// Test members only see their own tasks in listings
#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_task_listing_scoped_to_member() {
    let mut ctx = TestContext::new().await.unwrap();

    let mine = common::create_test_task(&ctx, "mine", Some(ctx.member.id))
        .await
        .unwrap();
    let theirs = common::create_test_task(&ctx, "theirs", Some(ctx.admin.id))
        .await
        .unwrap();

    let response = ctx.app.call(get("/tasks", &ctx.member_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await.unwrap();
    let listed = body.as_array().unwrap();
    assert!(listed.iter().any(|t| t["id"] == mine.id));
    assert!(listed.iter().all(|t| t["id"] != theirs.id));

    Task::delete(&ctx.db, mine.id).await.unwrap();
    Task::delete(&ctx.db, theirs.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

/// Test task creation is admin-only
#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_task_creation_requires_admin() {
    let mut ctx = TestContext::new().await.unwrap();

    let payload = json!({ "title": "forbidden" });

    let response = ctx
        .app
        .call(json_request("POST", "/tasks", &ctx.member_token, payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .call(json_request("POST", "/tasks", &ctx.admin_token, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await.unwrap();
    assert_eq!(body["status"], "pending");

    Task::delete(&ctx.db, body["id"].as_i64().unwrap())
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

/// Test assigning to a nonexistent user fails and leaves the owner alone
#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_assign_to_missing_user_leaves_owner_unchanged() {
    let mut ctx = TestContext::new().await.unwrap();

    let task = common::create_test_task(&ctx, "assign-test", Some(ctx.member.id))
        .await
        .unwrap();

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/tasks/{}/assign/{}", task.id, i64::MAX))
        .header("token", &ctx.admin_token)
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let unchanged = Task::find_by_id(&ctx.db, task.id).await.unwrap().unwrap();
    assert_eq!(unchanged.user_id, Some(ctx.member.id));

    Task::delete(&ctx.db, task.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

/// Test deleting a nonexistent task completes without error
#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_delete_nonexistent_task_is_silent() {
    let mut ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/tasks/{}", i64::MAX))
        .header("token", &ctx.admin_token)
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await.unwrap();
    assert_eq!(body["deleted"], false);

    ctx.cleanup().await.unwrap();
}

/// Test user management is admin-only but self-reads are allowed
#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_user_routes_admin_gate() {
    let mut ctx = TestContext::new().await.unwrap();

    // A member cannot list users.
    let response = ctx.app.call(get("/users", &ctx.member_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A member cannot read someone else's record.
    let uri = format!("/users/{}", ctx.admin.id);
    let response = ctx.app.call(get(&uri, &ctx.member_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // But can read their own, by id or via the self alias.
    let uri = format!("/users/{}", ctx.member.id);
    let response = ctx.app.call(get(&uri, &ctx.member_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx.app.call(get("/users/0", &ctx.member_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await.unwrap();
    assert_eq!(body["email"], ctx.member.email.as_str());

    // Admin sees the whole list.
    let response = ctx.app.call(get("/users", &ctx.admin_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await.unwrap();
}
