//! Interface string catalog: dictionaries per language, fallback lookup,
//! `{{param}}` interpolation and locale detection.

pub mod catalog;
pub mod context;
pub mod language;
pub mod preferences;

use thiserror::Error;

pub use catalog::{Catalog, CatalogReport, Entry, TranslationParams};
pub use context::LocaleContext;
pub use language::{
    detect_language, parse_accept_language, Language, LanguageDefinition, FALLBACK_LANGUAGE,
    LANGUAGES,
};
pub use preferences::{FilePreferences, MemoryPreferences, PreferenceStore};

#[derive(Error, Debug)]
pub enum I18nError {
    #[error("Unknown language code: {0}")]
    UnknownLanguage(String),
    #[error("Invalid dictionary for {language}: {source}")]
    Catalog {
        language: Language,
        source: serde_json::Error,
    },
    #[error("Preference IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Preference encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Preference error: {0}")]
    Preferences(String),
}
