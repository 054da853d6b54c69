use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, PgPool, Postgres, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::{task::Task, user::UserPublic};

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "module_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ModuleStatus {
    #[default]
    Pending,
    InProgress,
    /// Manual-only state; automatic recomputation never produces it.
    Review,
    Complete,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Module {
    pub id: Uuid,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub status: ModuleStatus,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateModule {
    pub name: String,
    pub description: Option<String>,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub tasks: Vec<CreateModuleTask>,
}

/// Initial checklist entry supplied inline with a new module.
#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateModuleTask {
    pub description: String,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateModule {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_optional_nullable")]
    pub description: Option<Option<String>>,
    /// Administrative override path; this is the only way `review` is set.
    pub status: Option<ModuleStatus>,
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_optional_nullable")]
    pub assignee_id: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ModuleWithDetails {
    #[serde(flatten)]
    #[ts(flatten)]
    pub module: Module,
    pub assignee: Option<UserPublic>,
    pub tasks: Vec<Task>,
}

impl Module {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Module>(
            r#"SELECT id, project_id, assignee_id, name, description, status, progress, created_at, updated_at
               FROM modules
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Row-locked variant used by the progress aggregator so concurrent
    /// recomputations for the same module serialize.
    pub async fn find_by_id_for_update<'e, E>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Module>(
            r#"SELECT id, project_id, assignee_id, name, description, status, progress, created_at, updated_at
               FROM modules
               WHERE id = $1
               FOR UPDATE"#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_filtered(
        pool: &PgPool,
        project_id: Option<Uuid>,
        assignee_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Module>(
            r#"SELECT id, project_id, assignee_id, name, description, status, progress, created_at, updated_at
               FROM modules
               WHERE ($1::uuid IS NULL OR project_id = $1)
                 AND ($2::uuid IS NULL OR assignee_id = $2)
               ORDER BY created_at ASC"#,
        )
        .bind(project_id)
        .bind(assignee_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        data: &CreateModule,
        module_id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Module>(
            r#"INSERT INTO modules (id, project_id, assignee_id, name, description)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, project_id, assignee_id, name, description, status, progress, created_at, updated_at"#,
        )
        .bind(module_id)
        .bind(data.project_id)
        .bind(data.assignee_id)
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(executor)
        .await
    }

    /// Administrative edit. Double-option fields distinguish "omitted" from
    /// "explicitly cleared". Does not touch `progress`.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        payload: &UpdateModule,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let name = payload.name.clone().unwrap_or(existing.name);
        let description = match &payload.description {
            Some(value) => value.clone(),
            None => existing.description,
        };
        let status = payload.status.unwrap_or(existing.status);
        let assignee_id = match payload.assignee_id {
            Some(value) => value,
            None => existing.assignee_id,
        };

        sqlx::query_as::<_, Module>(
            r#"UPDATE modules
               SET name = $2, description = $3, status = $4, assignee_id = $5, updated_at = NOW()
               WHERE id = $1
               RETURNING id, project_id, assignee_id, name, description, status, progress, created_at, updated_at"#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(status)
        .bind(assignee_id)
        .fetch_one(pool)
        .await
    }

    /// Write back derived progress. Only the progress aggregator calls this.
    pub async fn set_progress<'e, E>(
        executor: E,
        id: Uuid,
        progress: i32,
        status: ModuleStatus,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Module>(
            r#"UPDATE modules
               SET progress = $2, status = $3, updated_at = NOW()
               WHERE id = $1
               RETURNING id, project_id, assignee_id, name, description, status, progress, created_at, updated_at"#,
        )
        .bind(id)
        .bind(progress)
        .bind(status)
        .fetch_one(executor)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM modules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl ModuleWithDetails {
    /// Attach assignees and task lists to a batch of modules with two
    /// follow-up queries instead of one per module.
    pub async fn load(pool: &PgPool, modules: Vec<Module>) -> Result<Vec<Self>, sqlx::Error> {
        if modules.is_empty() {
            return Ok(Vec::new());
        }

        let module_ids: Vec<Uuid> = modules.iter().map(|m| m.id).collect();
        let assignee_ids: Vec<Uuid> = modules.iter().filter_map(|m| m.assignee_id).collect();

        let mut tasks_by_module: HashMap<Uuid, Vec<Task>> = HashMap::new();
        for task in Task::find_by_module_ids(pool, &module_ids).await? {
            tasks_by_module.entry(task.module_id).or_default().push(task);
        }

        let assignees: HashMap<Uuid, UserPublic> = if assignee_ids.is_empty() {
            HashMap::new()
        } else {
            sqlx::query_as::<_, UserPublic>(
                r#"SELECT id, name, email, role, avatar, online
                   FROM users
                   WHERE id = ANY($1)"#,
            )
            .bind(&assignee_ids)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
        };

        Ok(modules
            .into_iter()
            .map(|module| {
                let assignee = module.assignee_id.and_then(|id| assignees.get(&id).cloned());
                let tasks = tasks_by_module.remove(&module.id).unwrap_or_default();
                ModuleWithDetails {
                    module,
                    assignee,
                    tasks,
                }
            })
            .collect())
    }
}
