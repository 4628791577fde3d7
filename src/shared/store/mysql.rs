use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use super::{CustomModelRepository, TaskRepository};
use crate::shared::models::custom_model::normalize_provider;
use crate::shared::models::{
    AgentModel, CustomModel, DatabaseError, Task, TaskFilter, TaskMessage,
    UpdateCustomModelRequest,
};

const CUSTOM_MODEL_COLUMNS: &str =
    "id, provider, name, title, context_window, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, description, status, priority, control, model, created_at, updated_at";

#[derive(Clone)]
pub struct MySqlCustomModels {
    db: Arc<MySqlPool>,
}

impl MySqlCustomModels {
    pub fn new(db: Arc<MySqlPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CustomModelRepository for MySqlCustomModels {
    async fn list(&self) -> Result<Vec<CustomModel>, DatabaseError> {
        let models = sqlx::query_as::<_, CustomModel>(&format!(
            "SELECT {CUSTOM_MODEL_COLUMNS} FROM custom_models ORDER BY created_at ASC, seq ASC"
        ))
        .fetch_all(&*self.db)
        .await?;
        Ok(models)
    }

    async fn find(&self, id: &str) -> Result<Option<CustomModel>, DatabaseError> {
        let model = sqlx::query_as::<_, CustomModel>(&format!(
            "SELECT {CUSTOM_MODEL_COLUMNS} FROM custom_models WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(model)
    }

    async fn insert(&self, model: &CustomModel) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO custom_models (id, provider, name, title, context_window, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&model.id)
        .bind(&model.provider)
        .bind(&model.name)
        .bind(&model.title)
        .bind(model.context_window)
        .bind(model.created_at)
        .bind(model.updated_at)
        .execute(&*self.db)
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        id: &str,
        changes: &UpdateCustomModelRequest,
    ) -> Result<bool, DatabaseError> {
        let mut builder = QueryBuilder::<MySql>::new("UPDATE custom_models SET ");
        {
            let mut fields = builder.separated(", ");
            if let Some(provider) = &changes.provider {
                fields.push("provider = ");
                fields.push_bind_unseparated(normalize_provider(provider.as_deref()));
            }
            if let Some(name) = &changes.name {
                fields.push("name = ");
                fields.push_bind_unseparated(name.as_str());
            }
            if let Some(title) = &changes.title {
                fields.push("title = ");
                fields.push_bind_unseparated(title.as_str());
            }
            if let Some(context_window) = changes.context_window {
                fields.push("context_window = ");
                fields.push_bind_unseparated(context_window);
            }
            // Always changes, so a matched row is always reported as affected
            fields.push("updated_at = ");
            fields.push_bind_unseparated(Utc::now());
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&*self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM custom_models WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(FromRow)]
struct TaskRow {
    id: String,
    description: String,
    status: String,
    priority: String,
    control: String,
    model: Json<AgentModel>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = DatabaseError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            description: row.description,
            status: row.status.parse().map_err(DatabaseError::Decode)?,
            priority: row.priority.parse().map_err(DatabaseError::Decode)?,
            control: row.control.parse().map_err(DatabaseError::Decode)?,
            model: row.model.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: String,
    task_id: String,
    role: String,
    content: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for TaskMessage {
    type Error = DatabaseError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(TaskMessage {
            id: row.id,
            task_id: row.task_id,
            role: row.role.parse().map_err(DatabaseError::Decode)?,
            content: row.content.0,
            created_at: row.created_at,
        })
    }
}

#[derive(Clone)]
pub struct MySqlTasks {
    db: Arc<MySqlPool>,
}

impl MySqlTasks {
    pub fn new(db: Arc<MySqlPool>) -> Self {
        Self { db }
    }
}

fn push_status_filter(builder: &mut QueryBuilder<'_, MySql>, filter: &TaskFilter) {
    if filter.statuses.is_empty() {
        return;
    }
    builder.push(" WHERE status IN (");
    let mut separated = builder.separated(", ");
    for status in &filter.statuses {
        separated.push_bind(status.as_str());
    }
    separated.push_unseparated(")");
}

#[async_trait]
impl TaskRepository for MySqlTasks {
    async fn list(&self, filter: &TaskFilter) -> Result<(Vec<Task>, i64), DatabaseError> {
        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM tasks");
        push_status_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&*self.db)
            .await?;

        let mut select = QueryBuilder::<MySql>::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
        push_status_filter(&mut select, filter);
        select.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        select.push_bind(filter.limit);
        select.push(" OFFSET ");
        select.push_bind(filter.offset());

        let rows = select
            .build_query_as::<TaskRow>()
            .fetch_all(&*self.db)
            .await?;
        let tasks = rows
            .into_iter()
            .map(Task::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((tasks, total))
    }

    async fn find(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        row.map(Task::try_from).transpose()
    }

    async fn insert(&self, task: &Task) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, description, status, priority, control, model, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.control.as_str())
        .bind(Json(&task.model))
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&*self.db)
        .await?;
        Ok(())
    }

    async fn update(&self, task: &Task) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET description = ?, status = ?, priority = ?, control = ?, model = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.control.as_str())
        .bind(Json(&task.model))
        .bind(task.updated_at)
        .bind(&task.id)
        .execute(&*self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        // task_messages rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_message(&self, message: &TaskMessage) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO task_messages (id, task_id, role, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.task_id)
        .bind(message.role.as_str())
        .bind(Json(&message.content))
        .bind(message.created_at)
        .execute(&*self.db)
        .await?;
        Ok(())
    }

    async fn list_messages(
        &self,
        task_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskMessage>, DatabaseError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, task_id, role, content, created_at
            FROM task_messages
            WHERE task_id = ?
            ORDER BY created_at ASC, id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(task_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&*self.db)
        .await?;
        rows.into_iter().map(TaskMessage::try_from).collect()
    }
}
