pub mod config;
pub mod database;
pub mod i18n;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;

pub use database::init_app_state;
pub use models::AppState;
