use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use ts_rs::TS;
use uuid::Uuid;

use super::user::UserPublic;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ProjectMember {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct MemberWithUser {
    #[serde(flatten)]
    #[ts(flatten)]
    pub member: ProjectMember,
    pub user: UserPublic,
}

#[derive(Debug, Clone, FromRow)]
struct MemberUserRow {
    id: Uuid,
    user_id: Uuid,
    project_id: Uuid,
    role: String,
    created_at: DateTime<Utc>,
    user_name: String,
    user_email: String,
    user_role: String,
    user_avatar: String,
    user_online: bool,
}

impl ProjectMember {
    pub async fn find_by_project_id_with_users(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MemberUserRow>(
            r#"SELECT m.id, m.user_id, m.project_id, m.role, m.created_at,
                      u.name AS user_name, u.email AS user_email, u.role AS user_role,
                      u.avatar AS user_avatar, u.online AS user_online
               FROM project_members m
               JOIN users u ON u.id = m.user_id
               WHERE m.project_id = $1
               ORDER BY u.name ASC"#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| MemberWithUser {
                member: ProjectMember {
                    id: row.id,
                    user_id: row.user_id,
                    project_id: row.project_id,
                    role: row.role,
                    created_at: row.created_at,
                },
                user: UserPublic {
                    id: row.user_id,
                    name: row.user_name,
                    email: row.user_email,
                    role: row.user_role,
                    avatar: row.user_avatar,
                    online: row.user_online,
                },
            })
            .collect())
    }

    /// Idempotent membership insert; the (user, project) pair is unique.
    pub async fn ensure(
        pool: &PgPool,
        user_id: Uuid,
        project_id: Uuid,
        role: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO project_members (id, user_id, project_id, role)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (user_id, project_id) DO NOTHING"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(project_id)
        .bind(role)
        .execute(pool)
        .await?;
        Ok(())
    }
}
