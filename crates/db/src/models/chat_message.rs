use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use ts_rs::TS;
use uuid::Uuid;

use super::user::UserBrief;

/// Append-only team chat message scoped to a project. Never mutated after
/// creation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ChatMessage {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ChatMessageWithUser {
    #[serde(flatten)]
    #[ts(flatten)]
    pub message: ChatMessage,
    pub user: UserBrief,
}

#[derive(Debug, Clone, FromRow)]
struct MessageUserRow {
    id: Uuid,
    project_id: Uuid,
    user_id: Uuid,
    message: String,
    created_at: DateTime<Utc>,
    user_name: String,
    user_avatar: String,
}

impl ChatMessage {
    /// Most recent `limit` messages for a project, oldest first.
    pub async fn find_recent_by_project(
        pool: &PgPool,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ChatMessageWithUser>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MessageUserRow>(
            r#"SELECT * FROM (
                   SELECT m.id, m.project_id, m.user_id, m.message, m.created_at,
                          u.name AS user_name, u.avatar AS user_avatar
                   FROM chat_messages m
                   JOIN users u ON u.id = m.user_id
                   WHERE m.project_id = $1
                   ORDER BY m.created_at DESC
                   LIMIT $2
               ) recent
               ORDER BY created_at ASC"#,
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ChatMessageWithUser {
                message: ChatMessage {
                    id: row.id,
                    project_id: row.project_id,
                    user_id: row.user_id,
                    message: row.message,
                    created_at: row.created_at,
                },
                user: UserBrief {
                    id: row.user_id,
                    name: row.user_name,
                    avatar: row.user_avatar,
                },
            })
            .collect())
    }

    pub async fn create(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
        message: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>(
            r#"INSERT INTO chat_messages (id, project_id, user_id, message)
               VALUES ($1, $2, $3, $4)
               RETURNING id, project_id, user_id, message, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(user_id)
        .bind(message)
        .fetch_one(pool)
        .await
    }
}
