use std::path::PathBuf;

use clap::ValueEnum;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9991;
pub const DEFAULT_LOG_DIR: &str = "/app/logs";

/// Backing store for custom models and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Mysql,
    Memory,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub skip_migrations: bool,
    /// Raw JSON array of extra models, as given in `DESKMATE_CUSTOM_MODELS`.
    pub custom_models: Option<String>,
}

impl ApiConfig {
    /// Without an explicit store, a database URL selects MySQL.
    pub fn resolve_store(explicit: Option<StoreKind>, database_url: Option<&str>) -> StoreKind {
        match (explicit, database_url) {
            (Some(kind), _) => kind,
            (None, Some(url)) if !url.trim().is_empty() => StoreKind::Mysql,
            (None, _) => StoreKind::Memory,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            store: StoreKind::Memory,
            database_url: None,
            skip_migrations: false,
            custom_models: None,
        }
    }
}

/// Preference file for the CLI: `DESKMATE_PREFS`/`--prefs`, else
/// `~/.deskmate/preferences.json`.
pub fn resolve_preferences_path(explicit: Option<String>) -> PathBuf {
    match explicit {
        Some(path) if !path.trim().is_empty() => expand_path(path),
        _ => home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".deskmate")
            .join("preferences.json"),
    }
}

fn expand_path(input: String) -> PathBuf {
    if let Some(stripped) = input
        .strip_prefix("~/")
        .or_else(|| input.strip_prefix("~\\"))
    {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(input)
}

fn home_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        std::env::var_os("USERPROFILE").map(PathBuf::from)
    } else {
        std::env::var_os("HOME").map(PathBuf::from)
    }
}
