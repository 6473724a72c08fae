/// API route handlers
///
/// Organized by resource:
///
/// - `health`: health check endpoint
/// - `auth`: login
/// - `users`: user management (bootstrap, create, list, get, delete)
/// - `tasks`: ownership-scoped task operations
pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
