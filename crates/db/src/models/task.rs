use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, PgPool, Postgres};
use ts_rs::TS;
use uuid::Uuid;

use super::user::UserBrief;

/// Checklist item owned by exactly one module. The completion trio
/// (`completed`, `verified_by_id`, `completed_at`) is kept in lockstep:
/// all three set, or all three clear.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub module_id: Uuid,
    pub description: String,
    pub category: String,
    pub completed: bool,
    pub verified_by_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTask {
    pub module_id: Uuid,
    pub description: String,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateTask {
    pub description: Option<String>,
    pub category: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct TaskWithVerifier {
    #[serde(flatten)]
    #[ts(flatten)]
    pub task: Task,
    pub verified_by: Option<UserBrief>,
}

#[derive(Debug, Clone, FromRow)]
struct TaskVerifierRow {
    id: Uuid,
    module_id: Uuid,
    description: String,
    category: String,
    completed: bool,
    verified_by_id: Option<Uuid>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    verifier_name: Option<String>,
    verifier_avatar: Option<String>,
}

impl Task {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT id, module_id, description, category, completed, verified_by_id, completed_at, created_at, updated_at
               FROM tasks
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_module_id(pool: &PgPool, module_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT id, module_id, description, category, completed, verified_by_id, completed_at, created_at, updated_at
               FROM tasks
               WHERE module_id = $1
               ORDER BY created_at ASC"#,
        )
        .bind(module_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_module_ids(
        pool: &PgPool,
        module_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT id, module_id, description, category, completed, verified_by_id, completed_at, created_at, updated_at
               FROM tasks
               WHERE module_id = ANY($1)
               ORDER BY created_at ASC"#,
        )
        .bind(module_ids)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_module_id_with_verifier(
        pool: &PgPool,
        module_id: Uuid,
    ) -> Result<Vec<TaskWithVerifier>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskVerifierRow>(
            r#"SELECT t.id, t.module_id, t.description, t.category, t.completed,
                      t.verified_by_id, t.completed_at, t.created_at, t.updated_at,
                      u.name AS verifier_name, u.avatar AS verifier_avatar
               FROM tasks t
               LEFT JOIN users u ON u.id = t.verified_by_id
               WHERE t.module_id = $1
               ORDER BY t.created_at ASC"#,
        )
        .bind(module_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let verified_by = match (row.verified_by_id, row.verifier_name, row.verifier_avatar)
                {
                    (Some(id), Some(name), Some(avatar)) => Some(UserBrief { id, name, avatar }),
                    _ => None,
                };
                TaskWithVerifier {
                    task: Task {
                        id: row.id,
                        module_id: row.module_id,
                        description: row.description,
                        category: row.category,
                        completed: row.completed,
                        verified_by_id: row.verified_by_id,
                        completed_at: row.completed_at,
                        created_at: row.created_at,
                        updated_at: row.updated_at,
                    },
                    verified_by,
                }
            })
            .collect())
    }

    pub async fn create<'e, E>(
        executor: E,
        module_id: Uuid,
        description: &str,
        category: &str,
        task_id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Task>(
            r#"INSERT INTO tasks (id, module_id, description, category)
               VALUES ($1, $2, $3, $4)
               RETURNING id, module_id, description, category, completed, verified_by_id, completed_at, created_at, updated_at"#,
        )
        .bind(task_id)
        .bind(module_id)
        .bind(description)
        .bind(category)
        .fetch_one(executor)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        description: &str,
        category: &str,
        completed: bool,
        verified_by_id: Option<Uuid>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks
               SET description = $2, category = $3, completed = $4,
                   verified_by_id = $5, completed_at = $6, updated_at = NOW()
               WHERE id = $1
               RETURNING id, module_id, description, category, completed, verified_by_id, completed_at, created_at, updated_at"#,
        )
        .bind(id)
        .bind(description)
        .bind(category)
        .bind(completed)
        .bind(verified_by_id)
        .bind(completed_at)
        .fetch_one(pool)
        .await
    }

    /// Total and completed counts for one module, read in a single query so
    /// the aggregator sees a consistent snapshot.
    pub async fn completion_counts<'e, E>(
        executor: E,
        module_id: Uuid,
    ) -> Result<(i64, i64), sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, (i64, i64)>(
            r#"SELECT COUNT(*), COUNT(*) FILTER (WHERE completed)
               FROM tasks
               WHERE module_id = $1"#,
        )
        .bind(module_id)
        .fetch_one(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
