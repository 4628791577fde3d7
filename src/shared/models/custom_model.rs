use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::agent_model::AgentModel;

pub const DEFAULT_PROVIDER: &str = "custom";
pub const MAX_PROVIDER_LEN: usize = 64;
pub const MAX_LABEL_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomModel {
    pub id: String,
    pub provider: String,
    pub name: String,
    pub title: String,
    pub context_window: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomModelRequest {
    #[serde(default, deserialize_with = "deserialize_optional_provider")]
    pub provider: Option<String>,
    #[serde(deserialize_with = "deserialize_required_label")]
    pub name: String,
    #[serde(deserialize_with = "deserialize_required_label")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_strict_option_context_window")]
    pub context_window: Option<i32>,
}

/// Partial update. Outer `None` means the field was not sent; for nullable
/// fields `Some(None)` means it was sent as `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomModelRequest {
    #[serde(default, deserialize_with = "deserialize_patch_provider")]
    pub provider: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_patch_label")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_patch_label")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_patch_context_window")]
    pub context_window: Option<Option<i32>>,
}

impl UpdateCustomModelRequest {
    pub fn is_empty(&self) -> bool {
        self.provider.is_none()
            && self.name.is_none()
            && self.title.is_none()
            && self.context_window.is_none()
    }
}

/// Lowercase the provider; absent or empty means `custom`.
pub fn normalize_provider(provider: Option<&str>) -> String {
    match provider {
        Some(p) if !p.is_empty() => p.to_lowercase(),
        _ => DEFAULT_PROVIDER.to_string(),
    }
}

impl CustomModel {
    pub fn new(req: CreateCustomModelRequest) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider: normalize_provider(req.provider.as_deref()),
            name: req.name,
            title: req.title,
            context_window: req.context_window,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the fields present in `req`; returns whether anything changed.
    pub fn apply(&mut self, req: &UpdateCustomModelRequest) -> bool {
        if req.is_empty() {
            return false;
        }
        if let Some(provider) = &req.provider {
            self.provider = normalize_provider(provider.as_deref());
        }
        if let Some(name) = &req.name {
            self.name = name.clone();
        }
        if let Some(title) = &req.title {
            self.title = title.clone();
        }
        if let Some(context_window) = req.context_window {
            self.context_window = context_window;
        }
        self.updated_at = Utc::now();
        true
    }

    pub fn to_agent_model(&self) -> AgentModel {
        AgentModel {
            provider: normalize_provider(Some(&self.provider)),
            name: self.name.clone(),
            title: self.title.clone(),
            context_window: self.context_window,
        }
    }
}

fn check_label<E: serde::de::Error>(value: String) -> Result<String, E> {
    if value.is_empty() {
        return Err(E::custom("value is required and cannot be empty"));
    }
    if value.chars().count() > MAX_LABEL_LEN {
        return Err(E::custom(format!(
            "value too long (max {MAX_LABEL_LEN} characters)"
        )));
    }
    Ok(value)
}

// Measured after lowercasing, since that is what gets stored.
fn check_provider<E: serde::de::Error>(value: String) -> Result<String, E> {
    if normalize_provider(Some(&value)).chars().count() > MAX_PROVIDER_LEN {
        return Err(E::custom(format!(
            "provider too long (max {MAX_PROVIDER_LEN} characters)"
        )));
    }
    Ok(value)
}

fn deserialize_required_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    check_label(String::deserialize(deserializer)?)
}

fn deserialize_patch_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_required_label(deserializer).map(Some)
}

fn deserialize_optional_provider<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(check_provider)
        .transpose()
}

fn deserialize_patch_provider<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_optional_provider(deserializer).map(Some)
}

// Integer >= 1 or null. Whole-number floats (`8192.0`) are accepted; strings,
// booleans and fractions are rejected.
fn deserialize_strict_option_context_window<'de, D>(
    deserializer: D,
) -> Result<Option<i32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Visitor};

    struct StrictContextWindowVisitor;

    impl StrictContextWindowVisitor {
        fn positive<E: Error>(value: i64) -> Result<Option<i32>, E> {
            if value < 1 {
                return Err(E::custom("contextWindow must be at least 1"));
            }
            i32::try_from(value)
                .map(Some)
                .map_err(|_| E::custom("contextWindow out of range"))
        }
    }

    impl<'de> Visitor<'de> for StrictContextWindowVisitor {
        type Value = Option<i32>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a positive integer or null")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Self::positive(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            let value = i64::try_from(value).map_err(|_| E::custom("contextWindow out of range"))?;
            Self::positive(value)
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            if value.fract() != 0.0 || !value.is_finite() {
                return Err(E::custom("contextWindow must be an integer"));
            }
            if value < 1.0 || value > f64::from(i32::MAX) {
                return Err(E::custom("contextWindow must be at least 1"));
            }
            Ok(Some(value as i32))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }

        fn visit_str<E>(self, _: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Err(E::custom("expected integer or null, found string"))
        }

        fn visit_bool<E>(self, _: bool) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Err(E::custom("expected integer or null, found boolean"))
        }
    }

    deserializer.deserialize_option(StrictContextWindowVisitor)
}

fn deserialize_patch_context_window<'de, D>(
    deserializer: D,
) -> Result<Option<Option<i32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_strict_option_context_window(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(value: serde_json::Value) -> Result<CreateCustomModelRequest, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_normalize_provider() {
        assert_eq!(normalize_provider(None), "custom");
        assert_eq!(normalize_provider(Some("")), "custom");
        assert_eq!(normalize_provider(Some("OpenAI")), "openai");
    }

    #[test]
    fn test_create_request_accepts_valid_payload() {
        let req = create(json!({
            "provider": "OpenRouter",
            "name": "gpt-4o",
            "title": "GPT-4o",
            "contextWindow": 128000,
            "unknownField": true
        }))
        .unwrap();
        assert_eq!(req.context_window, Some(128000));

        let model = CustomModel::new(req);
        assert_eq!(model.provider, "openrouter");
        assert_eq!(model.created_at, model.updated_at);
        assert!(uuid::Uuid::parse_str(&model.id).is_ok());
    }

    #[test]
    fn test_create_request_rejects_bad_shapes() {
        assert!(create(json!({ "title": "No name" })).is_err());
        assert!(create(json!({ "name": "", "title": "Empty" })).is_err());
        assert!(create(json!({ "name": "x".repeat(129), "title": "Long" })).is_err());
        assert!(create(json!({ "name": "a", "title": "b", "contextWindow": 0 })).is_err());
        assert!(create(json!({ "name": "a", "title": "b", "contextWindow": 1.5 })).is_err());
        assert!(create(json!({ "name": "a", "title": "b", "contextWindow": "4096" })).is_err());
        assert!(create(json!({ "name": "a", "title": "b", "provider": "p".repeat(65) })).is_err());
    }

    #[test]
    fn test_provider_length_counts_lowercased_form() {
        // 'İ' lowercases to two chars
        let provider = format!("{}İ", "p".repeat(MAX_PROVIDER_LEN - 1));
        assert_eq!(provider.chars().count(), MAX_PROVIDER_LEN);
        assert!(create(json!({ "name": "a", "title": "b", "provider": provider })).is_err());

        let provider = "P".repeat(MAX_PROVIDER_LEN);
        let req = create(json!({ "name": "a", "title": "b", "provider": provider })).unwrap();
        assert_eq!(CustomModel::new(req).provider, "p".repeat(MAX_PROVIDER_LEN));
    }

    #[test]
    fn test_create_request_edge_values() {
        let req = create(json!({ "name": "a", "title": "b", "contextWindow": 8192.0 })).unwrap();
        assert_eq!(req.context_window, Some(8192));
        let req = create(json!({ "name": "x".repeat(128), "title": "b", "contextWindow": null }))
            .unwrap();
        assert_eq!(req.context_window, None);
    }

    #[test]
    fn test_update_request_tracks_presence() {
        let req: UpdateCustomModelRequest = serde_json::from_value(json!({ "title": "New" })).unwrap();
        assert!(req.provider.is_none());
        assert!(req.name.is_none());
        assert!(req.context_window.is_none());

        let req: UpdateCustomModelRequest =
            serde_json::from_value(json!({ "contextWindow": null, "provider": null })).unwrap();
        assert_eq!(req.context_window, Some(None));
        assert_eq!(req.provider, Some(None));

        assert!(serde_json::from_value::<UpdateCustomModelRequest>(json!({ "name": null })).is_err());
    }

    #[test]
    fn test_apply_only_touches_provided_fields() {
        let mut model = CustomModel::new(
            create(json!({ "provider": "Acme", "name": "m", "title": "M", "contextWindow": 10 }))
                .unwrap(),
        );
        let changed = model.apply(&UpdateCustomModelRequest {
            title: Some("Renamed".to_string()),
            ..Default::default()
        });
        assert!(changed);
        assert_eq!(model.title, "Renamed");
        assert_eq!(model.provider, "acme");
        assert_eq!(model.name, "m");
        assert_eq!(model.context_window, Some(10));

        assert!(!model.apply(&UpdateCustomModelRequest::default()));

        model.apply(&UpdateCustomModelRequest {
            provider: Some(None),
            context_window: Some(None),
            ..Default::default()
        });
        assert_eq!(model.provider, "custom");
        assert_eq!(model.context_window, None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let model = CustomModel::new(create(json!({ "name": "a", "title": "b" })).unwrap());
        let value = serde_json::to_value(&model).unwrap();
        assert!(value.get("contextWindow").is_some());
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["provider"], "custom");
    }
}
