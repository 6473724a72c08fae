/// Database models
///
/// - `user`: accounts, roles, and credential lookups
/// - `task`: tasks with their optional owner reference
pub mod task;
pub mod user;
