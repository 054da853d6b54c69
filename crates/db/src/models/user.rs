use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, PgPool, Postgres};
use ts_rs::TS;
use uuid::Uuid;

/// Full user row, including the credential hash. Not serializable; handlers
/// expose [`UserPublic`] instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub avatar: String,
    pub online: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct UserPublic {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub avatar: String,
    pub online: bool,
}

/// Minimal author reference attached to chat messages and uploads.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UserBrief {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
}

impl User {
    pub fn public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            avatar: self.avatar.clone(),
            online: self.online,
        }
    }

    pub fn brief(&self) -> UserBrief {
        UserBrief {
            id: self.id,
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, name, email, password_hash, role, avatar, online, created_at, updated_at
               FROM users
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, name, email, password_hash, role, avatar, online, created_at, updated_at
               FROM users
               WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all_public(pool: &PgPool) -> Result<Vec<UserPublic>, sqlx::Error> {
        sqlx::query_as::<_, UserPublic>(
            r#"SELECT id, name, email, role, avatar, online
               FROM users
               ORDER BY name ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        id: Uuid,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
        avatar: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, name, email, password_hash, role, avatar, online)
               VALUES ($1, $2, $3, $4, $5, $6, TRUE)
               RETURNING id, name, email, password_hash, role, avatar, online, created_at, updated_at"#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(avatar)
        .fetch_one(pool)
        .await
    }

    /// Profile edits from the team page. Omitted fields keep their value.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        name: Option<&str>,
        role: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<UserPublic, sqlx::Error> {
        sqlx::query_as::<_, UserPublic>(
            r#"UPDATE users
               SET name = COALESCE($2, name),
                   role = COALESCE($3, role),
                   avatar = COALESCE($4, avatar),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING id, name, email, role, avatar, online"#,
        )
        .bind(id)
        .bind(name)
        .bind(role)
        .bind(avatar)
        .fetch_one(pool)
        .await
    }

    pub async fn set_online<'e, E>(executor: E, id: Uuid, online: bool) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET online = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(online)
            .execute(executor)
            .await?;
        Ok(())
    }
}
