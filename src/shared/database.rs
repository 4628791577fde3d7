use std::sync::Arc;

use anyhow::{anyhow, Result};
use sqlx::MySqlPool;
use tracing::{error, info, warn};

use crate::shared::config::{ApiConfig, StoreKind};
use crate::shared::i18n::Catalog;
use crate::shared::models::{AppState, ModelCatalog};
use crate::shared::services::{CustomModelsService, TasksService};
use crate::shared::store::{MemoryCustomModels, MemoryTasks, MySqlCustomModels, MySqlTasks};

/// Connect to MySQL and bring the schema up to date.
pub async fn init_database(database_url: &str, skip_migrations: bool) -> Result<Arc<MySqlPool>> {
    info!("Initializing database connection");

    let db = Arc::new(MySqlPool::connect(database_url).await.map_err(|e| {
        error!("Failed to connect to database: {}", e);
        e
    })?);

    if skip_migrations {
        info!("Skipping migrations (SKIP_MIGRATIONS set)");
        return Ok(db);
    }

    info!("Database connected, running migrations");
    match sqlx::migrate!("./db/migrations").run(&*db).await {
        Ok(_) => info!("Database migrations completed"),
        Err(e) if e.to_string().contains("applied before") || e.to_string().contains("Dirty") => {
            warn!("Migration state is inconsistent, continuing: {}", e);
            let tables = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM information_schema.tables
                 WHERE table_schema = DATABASE() AND table_name IN ('custom_models', 'tasks')",
            )
            .fetch_one(&*db)
            .await?;
            if tables < 2 {
                return Err(anyhow!("Database tables do not exist and migrations failed: {e}"));
            }
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(db)
}

/// Wire stores, services and static catalogs for the configured backend.
pub async fn init_app_state(config: &ApiConfig) -> Result<AppState> {
    let (custom_models, tasks) = match config.store {
        StoreKind::Mysql => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow!("DATABASE_URL is required for the mysql store"))?;
            let db = init_database(url, config.skip_migrations).await?;
            (
                CustomModelsService::new(Arc::new(MySqlCustomModels::new(db.clone()))),
                TasksService::new(Arc::new(MySqlTasks::new(db))),
            )
        }
        StoreKind::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            (
                CustomModelsService::new(Arc::new(MemoryCustomModels::new())),
                TasksService::new(Arc::new(MemoryTasks::new())),
            )
        }
    };

    let model_catalog = ModelCatalog::from_env_value(config.custom_models.as_deref());
    info!(
        count = model_catalog.env_models().len(),
        "Loaded custom models from configuration"
    );

    let catalog = Catalog::builtin()?;
    let report = catalog.validate();
    for (language, missing) in &report.missing {
        if !missing.is_empty() {
            warn!(language = %language, missing = missing.len(), "Translation keys missing; lookups fall back");
        }
    }

    Ok(AppState {
        custom_models,
        tasks,
        model_catalog: Arc::new(model_catalog),
        catalog: Arc::new(catalog),
    })
}
