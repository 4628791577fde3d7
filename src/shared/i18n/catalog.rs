use std::collections::{BTreeMap, HashMap};
use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::language::{Language, FALLBACK_LANGUAGE};
use super::I18nError;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("placeholder pattern"));

const EMBEDDED: [(Language, &str); 3] = [
    (Language::En, include_str!("../../../locales/en.json")),
    (Language::ZhCn, include_str!("../../../locales/zh-CN.json")),
    (Language::ZhTw, include_str!("../../../locales/zh-TW.json")),
];

/// One node of a dictionary: a translated string or a group of child keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Text(String),
    Group(BTreeMap<String, Entry>),
}

pub type Dictionary = BTreeMap<String, Entry>;

/// Values substituted into `{{name}}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationParams(BTreeMap<String, String>);

impl TranslationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl fmt::Display) {
        self.0.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Keys present in the fallback dictionary but absent from another language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogReport {
    pub missing: BTreeMap<Language, Vec<String>>,
}

impl CatalogReport {
    pub fn is_complete(&self) -> bool {
        self.missing.values().all(Vec::is_empty)
    }
}

/// Compiled-in translation dictionaries keyed by language.
#[derive(Debug, Clone)]
pub struct Catalog {
    fallback: Language,
    dictionaries: HashMap<Language, Dictionary>,
}

impl Catalog {
    /// Dictionaries embedded from `locales/*.json`.
    pub fn builtin() -> Result<Self, I18nError> {
        let mut dictionaries = HashMap::new();
        for (language, raw) in EMBEDDED {
            let dictionary: Dictionary =
                serde_json::from_str(raw).map_err(|source| I18nError::Catalog { language, source })?;
            dictionaries.insert(language, dictionary);
        }
        Ok(Self::new(FALLBACK_LANGUAGE, dictionaries))
    }

    /// Languages without a dictionary resolve entirely through the fallback.
    pub fn new(fallback: Language, dictionaries: HashMap<Language, Dictionary>) -> Self {
        Self {
            fallback,
            dictionaries,
        }
    }

    pub fn fallback(&self) -> Language {
        self.fallback
    }

    pub fn dictionary(&self, language: Language) -> Option<&Dictionary> {
        self.dictionaries.get(&language)
    }

    /// Walk `key` through one language only. Groups are not results.
    pub fn lookup(&self, language: Language, key: &str) -> Option<&str> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut node = self.dictionaries.get(&language)?.get(first)?;
        for segment in segments {
            match node {
                Entry::Group(children) => node = children.get(segment)?,
                Entry::Text(_) => return None,
            }
        }
        match node {
            Entry::Text(text) => Some(text.as_str()),
            Entry::Group(_) => None,
        }
    }

    /// Lookup in `language`, then in the fallback language.
    pub fn resolve(&self, language: Language, key: &str) -> Option<&str> {
        self.lookup(language, key)
            .or_else(|| self.lookup(self.fallback, key))
    }

    /// Resolve and interpolate. Unknown keys and empty translations come
    /// back as the key itself.
    pub fn translate(
        &self,
        language: Language,
        key: &str,
        params: Option<&TranslationParams>,
    ) -> String {
        match self.resolve(language, key) {
            Some(template) if !template.is_empty() => interpolate(template, params),
            _ => key.to_string(),
        }
    }

    /// Dotted paths of every string leaf in `language`, sorted.
    pub fn key_paths(&self, language: Language) -> Vec<String> {
        let mut paths = Vec::new();
        if let Some(dictionary) = self.dictionaries.get(&language) {
            collect_paths(dictionary, "", &mut paths);
        }
        paths
    }

    pub fn missing_keys(&self, language: Language) -> Vec<String> {
        self.key_paths(self.fallback)
            .into_iter()
            .filter(|path| self.lookup(language, path).is_none())
            .collect()
    }

    /// Compare every language against the fallback key schema.
    pub fn validate(&self) -> CatalogReport {
        let missing = Language::ALL
            .into_iter()
            .filter(|language| *language != self.fallback)
            .map(|language| (language, self.missing_keys(language)))
            .collect();
        CatalogReport { missing }
    }
}

fn collect_paths(dictionary: &Dictionary, prefix: &str, out: &mut Vec<String>) {
    for (key, entry) in dictionary {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match entry {
            Entry::Text(_) => out.push(path),
            Entry::Group(children) => collect_paths(children, &path, out),
        }
    }
}

/// Replace `{{ name }}` placeholders. Without a parameter set the template is
/// returned as is; with one, unknown names become empty strings.
pub fn interpolate(template: &str, params: Option<&TranslationParams>) -> String {
    let Some(params) = params else {
        return template.to_string();
    };
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            params.get(&caps[1]).unwrap_or_default().to_string()
        })
        .into_owned()
}
