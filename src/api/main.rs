use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[path = "../api/mod.rs"]
mod api;
#[path = "../shared/mod.rs"]
mod shared;

use shared::config::{ApiConfig, StoreKind, DEFAULT_HOST, DEFAULT_LOG_DIR, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(name = "deskmate-api", version, about = "Deskmate task and model registry API")]
struct Args {
    #[arg(long, env = "DESKMATE_HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[arg(long, env = "DESKMATE_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Defaults to mysql when a database URL is set, memory otherwise
    #[arg(long, env = "DESKMATE_STORE", value_enum)]
    store: Option<StoreKind>,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "SKIP_MIGRATIONS")]
    skip_migrations: bool,

    /// JSON array of additional models offered by GET /tasks/models
    #[arg(long, env = "DESKMATE_CUSTOM_MODELS")]
    custom_models: Option<String>,

    #[arg(long, env = "DESKMATE_LOG_DIR", default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,
}

impl Args {
    fn into_config(self) -> ApiConfig {
        let store = ApiConfig::resolve_store(self.store, self.database_url.as_deref());
        ApiConfig {
            host: self.host,
            port: self.port,
            store,
            database_url: self.database_url,
            skip_migrations: self.skip_migrations,
            custom_models: self.custom_models,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guards = shared::logging::init_service_logging(&args.log_dir, "deskmate_api")?;

    api::rest::api::run_rest_server(args.into_config()).await
}
