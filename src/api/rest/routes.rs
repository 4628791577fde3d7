use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::rest::{handlers, logging_middleware::request_logging_middleware};
use crate::shared::models::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let model_routes = Router::new()
        .route(
            "/custom-models",
            get(handlers::custom_models::list_custom_models)
                .post(handlers::custom_models::create_custom_model),
        )
        .route(
            "/custom-models/{id}",
            patch(handlers::custom_models::update_custom_model)
                .delete(handlers::custom_models::delete_custom_model),
        );

    let task_routes = Router::new()
        .route(
            "/tasks",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        // Static segment wins over `{id}`
        .route("/tasks/models", get(handlers::tasks::list_models))
        .route(
            "/tasks/{id}",
            get(handlers::tasks::get_task).delete(handlers::tasks::delete_task),
        )
        .route(
            "/tasks/{id}/messages",
            get(handlers::tasks::list_task_messages).post(handlers::tasks::add_task_message),
        )
        .route("/tasks/{id}/takeover", post(handlers::tasks::take_over_task))
        .route("/tasks/{id}/resume", post(handlers::tasks::resume_task))
        .route("/tasks/{id}/cancel", post(handlers::tasks::cancel_task));

    let i18n_routes = Router::new()
        .route("/i18n/languages", get(handlers::i18n::list_languages))
        .route("/i18n/catalogs/{code}", get(handlers::i18n::get_catalog))
        .route("/i18n/negotiate", get(handlers::i18n::negotiate_language));

    Router::new()
        .route("/version", get(version))
        .merge(model_routes)
        .merge(task_routes)
        .merge(i18n_routes)
        .with_state(state)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn version() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "api": "v0"
    }))
}
