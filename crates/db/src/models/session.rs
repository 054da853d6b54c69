use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Bearer session issued at login. The token is the only secret the client
/// holds; the auth middleware resolves it to a [`super::user::User`].
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub const TTL_DAYS: i64 = 30;

    pub async fn create(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let expires_at = Utc::now() + Duration::days(Self::TTL_DAYS);
        sqlx::query_as::<_, Session>(
            r#"INSERT INTO sessions (id, user_id, token, expires_at)
               VALUES ($1, $2, $3, $4)
               RETURNING id, user_id, token, expires_at, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(Uuid::new_v4())
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    pub async fn find_valid_by_token(
        pool: &PgPool,
        token: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"SELECT id, user_id, token, expires_at, created_at
               FROM sessions
               WHERE token = $1 AND expires_at > NOW()"#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
