use async_trait::async_trait;

use crate::shared::models::{
    CustomModel, DatabaseError, Task, TaskFilter, TaskMessage, UpdateCustomModelRequest,
};

pub mod memory;
pub mod mysql;

pub use memory::{MemoryCustomModels, MemoryTasks};
pub use mysql::{MySqlCustomModels, MySqlTasks};

#[async_trait]
pub trait CustomModelRepository: Send + Sync {
    /// Oldest first.
    async fn list(&self) -> Result<Vec<CustomModel>, DatabaseError>;

    async fn find(&self, id: &str) -> Result<Option<CustomModel>, DatabaseError>;

    async fn insert(&self, model: &CustomModel) -> Result<(), DatabaseError>;

    /// Write only the fields present in `changes` and bump `updated_at`;
    /// `false` when no row has that id.
    async fn update(
        &self,
        id: &str,
        changes: &UpdateCustomModelRequest,
    ) -> Result<bool, DatabaseError>;

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Newest first, plus the total number of rows matching the filter.
    async fn list(&self, filter: &TaskFilter) -> Result<(Vec<Task>, i64), DatabaseError>;

    async fn find(&self, id: &str) -> Result<Option<Task>, DatabaseError>;

    async fn insert(&self, task: &Task) -> Result<(), DatabaseError>;

    async fn update(&self, task: &Task) -> Result<bool, DatabaseError>;

    /// Removes the task and its messages.
    async fn delete(&self, id: &str) -> Result<bool, DatabaseError>;

    async fn insert_message(&self, message: &TaskMessage) -> Result<(), DatabaseError>;

    /// Oldest first.
    async fn list_messages(
        &self,
        task_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskMessage>, DatabaseError>;
}
