use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::rest::error::{parse_id, ApiError, ApiResult};
use crate::shared::models::{
    AddTaskMessageRequest, AgentModel, AppState, CreateTaskRequest, Task, TaskFilter,
    TaskMessage, TaskPage, TaskStatus,
};

const DEFAULT_TASK_PAGE_SIZE: i64 = 10;
const MAX_TASK_PAGE_SIZE: i64 = 100;
const DEFAULT_MESSAGE_PAGE_SIZE: i64 = 100;
const MAX_MESSAGE_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Default, serde::Deserialize)]
pub struct ListTasksQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    /// Comma separated; takes precedence over `status`.
    pub statuses: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ListMessagesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

fn page_window(page: Option<i64>, limit: Option<i64>, default: i64, max: i64) -> ApiResult<(i64, i64)> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(default);
    if page < 1 {
        return Err(ApiError::BadRequest("page must be at least 1".to_string()));
    }
    if !(1..=max).contains(&limit) {
        return Err(ApiError::BadRequest(format!("limit must be between 1 and {max}")));
    }
    if (page - 1).checked_mul(limit).is_none() {
        return Err(ApiError::BadRequest("page is out of range".to_string()));
    }
    Ok((page, limit))
}

impl ListTasksQuery {
    fn into_filter(self) -> ApiResult<TaskFilter> {
        let (page, limit) = page_window(
            self.page,
            self.limit,
            DEFAULT_TASK_PAGE_SIZE,
            MAX_TASK_PAGE_SIZE,
        )?;

        let raw = self.statuses.or(self.status).unwrap_or_default();
        let statuses = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<TaskStatus>().map_err(ApiError::BadRequest))
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(TaskFilter {
            statuses,
            page,
            limit,
        })
    }
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(req) = payload?;
    let task = state.tasks.create(req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> ApiResult<Json<TaskPage>> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    Ok(Json(state.tasks.list(&filter).await?))
}

/// Built-in default first, then stored custom models, then configured ones
/// whose names are not already taken.
pub async fn list_models(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<AgentModel>>> {
    let models = state
        .custom_models
        .available_models(&state.model_catalog)
        .await?;
    Ok(Json(models))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_id(&id)?;
    Ok(Json(state.tasks.find(&id).await?))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state.tasks.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_task_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    query: Result<Query<ListMessagesQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TaskMessage>>> {
    let id = parse_id(&id)?;
    let Query(query) = query?;
    let (page, limit) = page_window(
        query.page,
        query.limit,
        DEFAULT_MESSAGE_PAGE_SIZE,
        MAX_MESSAGE_PAGE_SIZE,
    )?;
    Ok(Json(state.tasks.messages(&id, page, limit).await?))
}

pub async fn add_task_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<AddTaskMessageRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let task = state.tasks.add_message(&id, req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn take_over_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_id(&id)?;
    Ok(Json(state.tasks.take_over(&id).await?))
}

pub async fn resume_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_id(&id)?;
    Ok(Json(state.tasks.resume(&id).await?))
}

pub async fn cancel_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_id(&id)?;
    Ok(Json(state.tasks.cancel(&id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults() {
        let filter = ListTasksQuery::default().into_filter().unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 10);
        assert!(filter.statuses.is_empty());
    }

    #[test]
    fn test_statuses_take_precedence() {
        let filter = ListTasksQuery {
            status: Some("FAILED".into()),
            statuses: Some("RUNNING, needs_help".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.statuses, vec![TaskStatus::Running, TaskStatus::NeedsHelp]);
    }

    #[test]
    fn test_rejects_bad_query_values() {
        let bad_status = ListTasksQuery {
            status: Some("DONE".into()),
            ..Default::default()
        };
        assert!(bad_status.into_filter().is_err());

        let bad_page = ListTasksQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(bad_page.into_filter().is_err());

        let bad_limit = ListTasksQuery {
            limit: Some(101),
            ..Default::default()
        };
        assert!(bad_limit.into_filter().is_err());
    }

    #[test]
    fn test_page_window_rejects_overflowing_offset() {
        assert!(matches!(
            page_window(Some(i64::MAX), Some(100), 10, 100),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            page_window(Some(i64::MAX / 1000 + 2), Some(1000), 100, 1000),
            Err(ApiError::BadRequest(_))
        ));
        assert_eq!(page_window(Some(i64::MAX), Some(1), 10, 100).unwrap(), (i64::MAX, 1));
    }
}
