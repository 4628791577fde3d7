use std::sync::Arc;

use thiserror::Error;

use crate::shared::i18n::Catalog;
use crate::shared::services::{CustomModelsService, TasksService};

pub mod agent_model;
pub mod custom_model;
pub mod task;

pub use agent_model::{AgentModel, ModelCatalog};
pub use custom_model::{CreateCustomModelRequest, CustomModel, UpdateCustomModelRequest};
pub use task::{
    AddTaskMessageRequest, CreateTaskRequest, MessageRole, Task, TaskControl, TaskFilter,
    TaskMessage, TaskPage, TaskPriority, TaskStatus,
};

// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(sqlx::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unique constraint violation: {0}")]
    Unique(String),
    #[error("Invalid stored value: {0}")]
    Decode(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        // MySQL duplicate key (SQLSTATE 23000 / error 1062)
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                if code == "23000" || code == "1062" {
                    return DatabaseError::Unique(db_err.message().to_string());
                }
            }
        }
        DatabaseError::Connection(err)
    }
}

// Application state
#[derive(Clone)]
pub struct AppState {
    pub custom_models: CustomModelsService,
    pub tasks: TasksService,
    pub model_catalog: Arc<ModelCatalog>,
    pub catalog: Arc<Catalog>,
}
