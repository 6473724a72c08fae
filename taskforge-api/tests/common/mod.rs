/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test user creation with known passwords
/// - Token generation
/// - API client helpers
use sqlx::PgPool;
use taskforge_api::app::{build_router, AppState};
use taskforge_api::config::Config;
use taskforge_shared::auth::{jwt, password};
use taskforge_shared::models::task::{CreateTask, Task};
use taskforge_shared::models::user::{CreateUser, Role, User};

/// Password every test account is created with
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub admin: User,
    pub admin_token: String,
    pub member: User,
    pub member_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh admin and member account
    pub async fn new() -> anyhow::Result<Self> {
        // Load test configuration
        let config = Config::from_env()?;

        // Connect to database
        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        let admin = create_test_user(&db, Role::Admin).await?;
        let member = create_test_user(&db, Role::User).await?;

        let admin_token = jwt::issue_token(admin.id, &config.jwt.secret)?;
        let member_token = jwt::issue_token(member.id, &config.jwt.secret)?;

        // Build app
        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state)?;

        Ok(TestContext {
            db,
            app,
            config,
            admin,
            admin_token,
            member,
            member_token,
        })
    }

    /// Cleans up test data
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        User::delete(&self.db, self.admin.id).await?;
        User::delete(&self.db, self.member.id).await?;
        Ok(())
    }
}

/// Creates a user with a unique email and the shared test password
pub async fn create_test_user(db: &PgPool, role: Role) -> anyhow::Result<User> {
    let unique = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();

    let user = User::create(
        db,
        CreateUser {
            email: format!("test-{}-{}@example.com", role.as_str(), unique),
            password_hash: password::hash_password(TEST_PASSWORD)?,
            role,
        },
    )
    .await?;

    Ok(user)
}

/// Helper to create a test task owned by `user_id`
pub async fn create_test_task(
    ctx: &TestContext,
    title: &str,
    user_id: Option<i64>,
) -> anyhow::Result<Task> {
    let task = Task::create(
        &ctx.db,
        CreateTask {
            title: title.to_string(),
            description: String::new(),
            deadline: None,
            user_id,
        },
    )
    .await?;

    Ok(task)
}

/// Reads a response body as JSON
pub async fn body_json(response: axum::response::Response) -> anyhow::Result<serde_json::Value> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}
