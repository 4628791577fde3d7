use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::I18nError;

/// Closed set of interface languages shipped with the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    En,
    ZhCn,
    ZhTw,
}

/// Static metadata for one interface language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDefinition {
    pub code: Language,
    pub label: &'static str,
    pub native_label: &'static str,
    pub short_label: &'static str,
}

pub const LANGUAGES: [LanguageDefinition; 3] = [
    LanguageDefinition {
        code: Language::En,
        label: "English",
        native_label: "English",
        short_label: "EN",
    },
    LanguageDefinition {
        code: Language::ZhCn,
        label: "Simplified Chinese",
        native_label: "简体中文",
        short_label: "简",
    },
    LanguageDefinition {
        code: Language::ZhTw,
        label: "Traditional Chinese",
        native_label: "繁體中文",
        short_label: "繁",
    },
];

pub const FALLBACK_LANGUAGE: Language = Language::En;

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::ZhCn, Language::ZhTw];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::ZhCn => "zh-CN",
            Language::ZhTw => "zh-TW",
        }
    }

    pub fn definition(self) -> &'static LanguageDefinition {
        match self {
            Language::En => &LANGUAGES[0],
            Language::ZhCn => &LANGUAGES[1],
            Language::ZhTw => &LANGUAGES[2],
        }
    }

    /// Exact match against a supported code. Stored preferences go through
    /// this, so `zh-cn` is not accepted here.
    pub fn from_code(code: &str) -> Option<Language> {
        Language::ALL.into_iter().find(|lang| lang.code() == code)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = I18nError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| I18nError::UnknownLanguage(s.to_string()))
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-").to_lowercase()
}

/// Map a single locale tag (as reported by a browser or the OS) onto a
/// supported language: exact match, then prefix match, then the Chinese
/// script/region rule.
pub fn language_for_locale(locale: &str) -> Option<Language> {
    let normalized = normalize_locale(locale);
    if normalized.is_empty() {
        return None;
    }

    if let Some(lang) = Language::ALL
        .into_iter()
        .find(|lang| lang.code().to_lowercase() == normalized)
    {
        return Some(lang);
    }

    if let Some(lang) = Language::ALL
        .into_iter()
        .find(|lang| normalized.starts_with(&lang.code().to_lowercase()))
    {
        return Some(lang);
    }

    if normalized.starts_with("zh") {
        let traditional = ["hant", "hk", "mo", "tw"]
            .iter()
            .any(|marker| normalized.contains(marker));
        return Some(if traditional {
            Language::ZhTw
        } else {
            Language::ZhCn
        });
    }

    None
}

/// First supported language among `locales`, in order.
pub fn detect_language<I, S>(locales: I) -> Option<Language>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    locales
        .into_iter()
        .find_map(|locale| language_for_locale(locale.as_ref()))
}

/// Split an `Accept-Language` header into tags, highest q-value first.
/// Tags with equal weight keep header order; `*` and `q=0` are dropped.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(f32, String)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = pieces
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            if quality <= 0.0 {
                return None;
            }
            Some((quality, tag.to_string()))
        })
        .collect();

    weighted.sort_by(|a, b| b.0.total_cmp(&a.0));
    weighted.into_iter().map(|(_, tag)| tag).collect()
}
