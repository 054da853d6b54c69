use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use ts_rs::TS;
use uuid::Uuid;

use super::user::UserBrief;

/// File metadata plus inline base64 content. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Upload {
    pub id: Uuid,
    pub project_id: Uuid,
    pub uploaded_by_id: Uuid,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Listing view: everything except the (potentially large) content blob.
#[derive(Debug, Clone, Serialize, TS)]
pub struct UploadMeta {
    pub id: Uuid,
    pub project_id: Uuid,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: UserBrief,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct UploadMetaRow {
    id: Uuid,
    project_id: Uuid,
    uploaded_by_id: Uuid,
    filename: String,
    file_type: String,
    file_size: i64,
    created_at: DateTime<Utc>,
    uploader_name: String,
    uploader_avatar: String,
}

impl Upload {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Upload>(
            r#"SELECT id, project_id, uploaded_by_id, filename, file_type, file_size, content, created_at
               FROM uploads
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_meta_by_project_id(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<UploadMeta>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UploadMetaRow>(
            r#"SELECT up.id, up.project_id, up.uploaded_by_id, up.filename, up.file_type,
                      up.file_size, up.created_at,
                      u.name AS uploader_name, u.avatar AS uploader_avatar
               FROM uploads up
               JOIN users u ON u.id = up.uploaded_by_id
               WHERE up.project_id = $1
               ORDER BY up.created_at DESC"#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UploadMeta {
                id: row.id,
                project_id: row.project_id,
                filename: row.filename,
                file_type: row.file_type,
                file_size: row.file_size,
                uploaded_by: UserBrief {
                    id: row.uploaded_by_id,
                    name: row.uploader_name,
                    avatar: row.uploader_avatar,
                },
                created_at: row.created_at,
            })
            .collect())
    }

    pub async fn create(
        pool: &PgPool,
        project_id: Uuid,
        uploaded_by_id: Uuid,
        filename: &str,
        file_type: &str,
        file_size: i64,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        tracing::debug!(
            "Storing upload '{}' ({} bytes) for project {}",
            filename,
            file_size,
            project_id
        );

        sqlx::query_as::<_, Upload>(
            r#"INSERT INTO uploads (id, project_id, uploaded_by_id, filename, file_type, file_size, content)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, project_id, uploaded_by_id, filename, file_type, file_size, content, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(uploaded_by_id)
        .bind(filename)
        .bind(file_type)
        .bind(file_size)
        .bind(content)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM uploads WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub fn meta(&self, uploaded_by: UserBrief) -> UploadMeta {
        UploadMeta {
            id: self.id,
            project_id: self.project_id,
            filename: self.filename.clone(),
            file_type: self.file_type.clone(),
            file_size: self.file_size,
            uploaded_by,
            created_at: self.created_at,
        }
    }
}
