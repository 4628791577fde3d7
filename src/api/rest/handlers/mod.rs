pub mod custom_models;
pub mod i18n;
pub mod tasks;
