use axum::{
    extract::{Path, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::rest::error::{ApiError, ApiResult};
use crate::shared::i18n::{
    catalog::Dictionary, detect_language, parse_accept_language, Language, LanguageDefinition,
    LANGUAGES,
};
use crate::shared::models::AppState;

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub fallback: Language,
    pub languages: &'static [LanguageDefinition],
}

#[derive(Debug, Serialize)]
pub struct NegotiateResponse {
    pub language: Language,
}

pub async fn list_languages(State(state): State<Arc<AppState>>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        fallback: state.catalog.fallback(),
        languages: &LANGUAGES,
    })
}

pub async fn get_catalog(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<Json<Dictionary>> {
    let language = Language::from_code(&code)
        .ok_or_else(|| ApiError::NotFound(format!("Language {code} is not supported")))?;
    let dictionary = state
        .catalog
        .dictionary(language)
        .ok_or_else(|| ApiError::NotFound(format!("No dictionary for {code}")))?;
    Ok(Json(dictionary.clone()))
}

pub async fn negotiate_language(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<NegotiateResponse> {
    let tags = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(parse_accept_language)
        .unwrap_or_default();
    let language = detect_language(&tags).unwrap_or_else(|| state.catalog.fallback());
    Json(NegotiateResponse { language })
}
