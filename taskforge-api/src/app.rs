/// Application state and router builder
///
/// Defines the shared application state and builds the axum router with all
/// routes and middleware. Role allow-lists are declared here, per route
/// group, at construction time; an empty allow-list fails router
/// construction instead of the first request.
///
/// # Example
///
/// ```no_run
/// use taskforge_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskforge_api::app::build_router(state)?;
/// # Ok(())
/// # }
/// ```
use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskforge_shared::auth::{
    access::AccessPolicy,
    guard::{self, GuardError},
};
use taskforge_shared::models::user::Role;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Access rules in effect (corrected by default, legacy behind a flag)
    policy: AccessPolicy,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let policy = AccessPolicy {
            legacy_access_rules: config.auth.legacy_access_rules,
        };

        Self {
            db,
            config: Arc::new(config),
            policy,
        }
    }

    /// JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Access rules in effect
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }
}

/// Builds the complete axum router
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                           # public
/// ├── /auth/login                       # public
/// ├── /users/init                       # public bootstrap
/// ├── /users                            # guard: {Admin, User}
/// │   ├── POST   /                      #   + admin-only in handler
/// │   ├── GET    /                      #   + admin-only in handler
/// │   ├── GET    /:id                   #   admin or self
/// │   └── DELETE /:id                   #   + admin-only in handler
/// └── /tasks                            # guard: {Admin, User}
///     ├── POST   /                      #   + admin-only in handler
///     ├── GET    /                      #   scoped to caller
///     ├── GET    /:id                   #   ownership gate
///     ├── PUT    /:id/status            #   ownership gate
///     ├── PUT    /:id/assign/:user_id   #   + admin-only in handler
///     └── DELETE /:id                   #   + admin-only in handler
/// ```
///
/// # Errors
///
/// Returns `GuardError::Misuse` if a route group declares an empty role
/// allow-list. This is a startup failure, not a request-time one.
pub fn build_router(state: AppState) -> Result<Router, GuardError> {
    use crate::routes;

    // Every protected route admits both roles at the guard; operations that
    // are admin-only declare that requirement as their first statement.
    let member_guard = guard::require_roles(
        state.db.clone(),
        state.jwt_secret().to_string(),
        vec![Role::Admin, Role::User],
        *state.policy(),
    )?;

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create).get(routes::tasks::list))
        .route(
            "/:id",
            get(routes::tasks::get_one).delete(routes::tasks::remove),
        )
        .route("/:id/status", put(routes::tasks::update_status))
        .route("/:id/assign/:user_id", put(routes::tasks::assign))
        .layer(middleware::from_fn(member_guard.clone()));

    let user_routes = Router::new()
        .route("/", post(routes::users::create).get(routes::users::list))
        .route(
            "/:id",
            get(routes::users::get_one).delete(routes::users::remove),
        )
        .layer(middleware::from_fn(member_guard))
        // Registered after the guard layer so it stays public.
        .route("/init", get(routes::users::init));

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::HeaderName::from_static("token")])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Ok(Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/login", post(routes::auth::login))
        .nest("/tasks", task_routes)
        .nest("/users", user_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state))
}
