use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::custom_model::DEFAULT_PROVIDER;

/// Model entry as offered to the model picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentModel {
    pub provider: String,
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<i32>,
}

impl AgentModel {
    pub fn builtin_default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            name: "claude-code".to_string(),
            title: "Claude Code".to_string(),
            context_window: Some(200_000),
        }
    }
}

/// Models declared through configuration, parsed once at startup, plus the
/// built-in default that always heads the list.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    env_models: Vec<AgentModel>,
}

impl ModelCatalog {
    pub fn new(env_models: Vec<AgentModel>) -> Self {
        Self { env_models }
    }

    /// Parse the raw `DESKMATE_CUSTOM_MODELS` value. Never fails: anything
    /// unusable is logged and yields an empty list.
    pub fn from_env_value(raw: Option<&str>) -> Self {
        Self::new(parse_env_models(raw))
    }

    pub fn env_models(&self) -> &[AgentModel] {
        &self.env_models
    }

    /// Built-in default, then persisted models, then configured ones whose
    /// name was not already taken.
    pub fn combine(&self, persisted: Vec<AgentModel>) -> Vec<AgentModel> {
        let mut models = vec![AgentModel::builtin_default()];
        models.extend(dedupe_by_name(
            persisted.into_iter().chain(self.env_models.iter().cloned()),
        ));
        models
    }
}

/// Keep the first model for each non-empty name.
pub fn dedupe_by_name<I>(models: I) -> Vec<AgentModel>
where
    I: IntoIterator<Item = AgentModel>,
{
    let mut seen = HashSet::new();
    models
        .into_iter()
        .filter(|model| !model.name.is_empty() && seen.insert(model.name.clone()))
        .collect()
}

pub fn parse_env_models(raw: Option<&str>) -> Vec<AgentModel> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Vec::new(),
    };

    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse DESKMATE_CUSTOM_MODELS: {}", e);
            return Vec::new();
        }
    };

    let Value::Array(entries) = parsed else {
        warn!("DESKMATE_CUSTOM_MODELS must be a JSON array.");
        return Vec::new();
    };

    entries.iter().filter_map(env_entry_to_model).collect()
}

fn env_entry_to_model(entry: &Value) -> Option<AgentModel> {
    let object = entry.as_object()?;

    let name = object
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())?
        .to_string();

    let title = match object.get("title") {
        None | Some(Value::Null) => name.clone(),
        Some(Value::String(title)) => title.clone(),
        Some(_) => return None,
    };

    let provider = object
        .get("provider")
        .and_then(Value::as_str)
        .filter(|provider| !provider.is_empty())
        .unwrap_or(DEFAULT_PROVIDER)
        .to_string();

    let context_window = object
        .get("contextWindow")
        .and_then(Value::as_i64)
        .filter(|value| *value >= 1)
        .and_then(|value| i32::try_from(value).ok());

    Some(AgentModel {
        provider,
        name,
        title,
        context_window,
    })
}
