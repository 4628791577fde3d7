use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::rest::error::{parse_id, ApiResult};
use crate::shared::models::{
    AppState, CreateCustomModelRequest, CustomModel, UpdateCustomModelRequest,
};

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

pub async fn list_custom_models(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CustomModel>>> {
    Ok(Json(state.custom_models.list().await?))
}

pub async fn create_custom_model(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateCustomModelRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CustomModel>)> {
    let Json(req) = payload?;
    let model = state.custom_models.create(req).await?;
    Ok((StatusCode::CREATED, Json(model)))
}

pub async fn update_custom_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCustomModelRequest>, JsonRejection>,
) -> ApiResult<Json<CustomModel>> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    Ok(Json(state.custom_models.update(&id, req).await?))
}

pub async fn delete_custom_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_id(&id)?;
    state.custom_models.remove(&id).await?;
    Ok(Json(DeleteResponse { success: true }))
}
