/// Task model and database operations
///
/// Tasks are the resources gated by ownership: a task optionally references
/// the single user allowed to view and mutate it. The reference is weak; the
/// task does not own the user's lifecycle, and deleting a user clears the
/// reference instead of deleting the task.
///
/// Status carries no transition rules. Any status may be overwritten with any
/// other status.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     deadline DATE,
///     status task_status NOT NULL DEFAULT 'pending',
///     user_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Task progress status
///
/// Initial status is `Pending`. There is no state machine; updates overwrite
/// the status unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet
    Pending,

    /// Being worked on
    InProgress,

    /// Done
    Completed,
}

impl TaskStatus {
    /// Status name as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID, generated by the database
    pub id: i64,

    /// Short title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Optional due date
    pub deadline: Option<NaiveDate>,

    /// Current status
    pub status: TaskStatus,

    /// Owning user, if assigned
    ///
    /// When present, it referenced an existing user at assignment time.
    pub user_id: Option<i64>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Task row joined with its owner's email
///
/// Used where the caller needs to display who a task belongs to without a
/// second lookup.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskWithOwner {
    /// Unique task ID
    pub id: i64,

    /// Short title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Optional due date
    pub deadline: Option<NaiveDate>,

    /// Current status
    pub status: TaskStatus,

    /// Owning user, if assigned
    pub user_id: Option<i64>,

    /// Email of the owning user, if assigned and still existing
    pub owner_email: Option<String>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Short title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Optional due date
    pub deadline: Option<NaiveDate>,

    /// Optional initial owner
    pub user_id: Option<i64>,
}

impl Task {
    /// Creates a new task with initial status `Pending`
    ///
    /// # Errors
    ///
    /// Returns an error if `user_id` references a user that does not exist
    /// (foreign key violation) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, deadline, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, deadline, status, user_id, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.deadline)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID with its owner joined
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<TaskWithOwner>, sqlx::Error> {
        let task = sqlx::query_as::<_, TaskWithOwner>(
            r#"
            SELECT t.id, t.title, t.description, t.deadline, t.status, t.user_id,
                   u.email AS owner_email, t.created_at, t.updated_at
            FROM tasks t
            LEFT JOIN users u ON u.id = t.user_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists all tasks with owners joined, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<TaskWithOwner>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, TaskWithOwner>(
            r#"
            SELECT t.id, t.title, t.description, t.deadline, t.status, t.user_id,
                   u.email AS owner_email, t.created_at, t.updated_at
            FROM tasks t
            LEFT JOIN users u ON u.id = t.user_id
            ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks owned by one user, newest first
    pub async fn list_by_owner(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, deadline, status, user_id, created_at, updated_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Overwrites the status of a task
    ///
    /// No transition restriction: any status may replace any other.
    ///
    /// # Returns
    ///
    /// The updated task, or `None` if the id does not exist.
    pub async fn update_status(
        pool: &PgPool,
        id: i64,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, deadline, status, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Overwrites the owner reference of a task
    ///
    /// The caller is responsible for verifying the target user exists before
    /// calling; a dangling id also fails here on the foreign key.
    ///
    /// # Returns
    ///
    /// The updated task, or `None` if the task id does not exist.
    pub async fn assign(
        pool: &PgPool,
        task_id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET user_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, deadline, status, user_id, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task by ID
    ///
    /// Deleting a nonexistent id is a silent no-op.
    ///
    /// # Returns
    ///
    /// True if a task was deleted, false if the id did not exist.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
