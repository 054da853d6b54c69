use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, PgPool, Postgres, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display,
)]
#[sqlx(type_name = "chat_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the AI workspace conversation, scoped to a module + user
/// pair. Append-only.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct WorkspaceChat {
    pub id: Uuid,
    pub module_id: Uuid,
    pub user_id: Uuid,
    pub role: ChatRole,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl WorkspaceChat {
    /// Most recent `limit` turns of a user's conversation with a module,
    /// oldest first.
    pub async fn find_recent(
        pool: &PgPool,
        module_id: Uuid,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WorkspaceChat>(
            r#"SELECT * FROM (
                   SELECT id, module_id, user_id, role, message, created_at
                   FROM workspace_chats
                   WHERE module_id = $1 AND user_id = $2
                   ORDER BY created_at DESC
                   LIMIT $3
               ) recent
               ORDER BY created_at ASC"#,
        )
        .bind(module_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    async fn insert<'e, E>(
        executor: E,
        module_id: Uuid,
        user_id: Uuid,
        role: ChatRole,
        message: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, WorkspaceChat>(
            r#"INSERT INTO workspace_chats (id, module_id, user_id, role, message, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, module_id, user_id, role, message, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(module_id)
        .bind(user_id)
        .bind(role)
        .bind(message)
        .bind(created_at)
        .fetch_one(executor)
        .await
    }

    /// Persist a user turn and the assistant reply as one unit. Callers only
    /// invoke this after the completion service has answered, so history
    /// never contains a user turn with no reply (or vice versa).
    pub async fn record_exchange(
        pool: &PgPool,
        module_id: Uuid,
        user_id: Uuid,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<(Self, Self), sqlx::Error> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;
        let user_turn =
            Self::insert(&mut *tx, module_id, user_id, ChatRole::User, user_message, now).await?;
        // Stamped 1ms later so the reply always sorts after the user turn.
        let assistant_turn = Self::insert(
            &mut *tx,
            module_id,
            user_id,
            ChatRole::Assistant,
            assistant_message,
            now + Duration::milliseconds(1),
        )
        .await?;
        tx.commit().await?;
        Ok((user_turn, assistant_turn))
    }
}
