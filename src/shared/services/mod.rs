use thiserror::Error;

use crate::shared::models::DatabaseError;

pub mod custom_models;
pub mod tasks;

pub use custom_models::CustomModelsService;
pub use tasks::TasksService;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
