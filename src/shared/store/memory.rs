use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CustomModelRepository, TaskRepository};
use crate::shared::models::{
    CustomModel, DatabaseError, Task, TaskFilter, TaskMessage, UpdateCustomModelRequest,
};

/// Process-local store; rows live as long as the server does.
#[derive(Debug, Default)]
pub struct MemoryCustomModels {
    rows: RwLock<Vec<CustomModel>>,
}

impl MemoryCustomModels {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomModelRepository for MemoryCustomModels {
    async fn list(&self) -> Result<Vec<CustomModel>, DatabaseError> {
        let rows = self.rows.read().await;
        let mut models = rows.clone();
        // Stable sort keeps insertion order for equal timestamps.
        models.sort_by_key(|m| m.created_at);
        Ok(models)
    }

    async fn find(&self, id: &str) -> Result<Option<CustomModel>, DatabaseError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|m| m.id == id).cloned())
    }

    async fn insert(&self, model: &CustomModel) -> Result<(), DatabaseError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|m| m.id == model.id) {
            return Err(DatabaseError::Unique(format!(
                "custom model {} already exists",
                model.id
            )));
        }
        rows.push(model.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: &str,
        changes: &UpdateCustomModelRequest,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|m| m.id == id) {
            Some(model) => {
                model.apply(changes);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|m| m.id != id);
        Ok(rows.len() != before)
    }
}

#[derive(Debug, Default)]
pub struct MemoryTasks {
    tasks: RwLock<Vec<Task>>,
    messages: RwLock<Vec<TaskMessage>>,
}

impl MemoryTasks {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTasks {
    async fn list(&self, filter: &TaskFilter) -> Result<(Vec<Task>, i64), DatabaseError> {
        let tasks = self.tasks.read().await;
        let mut matching: Vec<Task> = tasks
            .iter()
            .rev()
            .filter(|t| filter.statuses.is_empty() || filter.statuses.contains(&t.status))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset().max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn find(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn insert(&self, task: &Task) -> Result<(), DatabaseError> {
        let mut tasks = self.tasks.write().await;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(DatabaseError::Unique(format!("task {} already exists", task.id)));
        }
        tasks.push(task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> Result<bool, DatabaseError> {
        let mut tasks = self.tasks.write().await;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        // Lock order is tasks, then messages.
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        let removed = tasks.len() != before;
        if removed {
            self.messages.write().await.retain(|m| m.task_id != id);
        }
        Ok(removed)
    }

    async fn insert_message(&self, message: &TaskMessage) -> Result<(), DatabaseError> {
        let tasks = self.tasks.read().await;
        if !tasks.iter().any(|t| t.id == message.task_id) {
            return Err(DatabaseError::Internal(format!(
                "task {} does not exist",
                message.task_id
            )));
        }
        self.messages.write().await.push(message.clone());
        drop(tasks);
        Ok(())
    }

    async fn list_messages(
        &self,
        task_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskMessage>, DatabaseError> {
        let messages = self.messages.read().await;
        let mut matching: Vec<TaskMessage> = messages
            .iter()
            .filter(|m| m.task_id == task_id)
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.created_at);
        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}
