use std::sync::Arc;

use tracing::debug;

use super::catalog::{Catalog, TranslationParams};
use super::language::{detect_language, Language, LanguageDefinition, LANGUAGES};
use super::preferences::PreferenceStore;
use super::I18nError;

/// Active interface language plus the catalog and preference store it
/// resolves against.
pub struct LocaleContext<P: PreferenceStore> {
    catalog: Arc<Catalog>,
    preferences: P,
    language: Language,
}

impl<P: PreferenceStore> LocaleContext<P> {
    /// Pick the starting language: stored preference, then the first
    /// supported entry of `locales`, then the catalog fallback.
    pub fn initialize<I, S>(catalog: Arc<Catalog>, preferences: P, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stored = preferences
            .load()
            .and_then(|code| Language::from_code(&code));

        let language = match stored {
            Some(language) => {
                debug!(language = %language, "Using stored language preference");
                language
            }
            None => match detect_language(locales) {
                Some(language) => {
                    debug!(language = %language, "Detected language from locale");
                    language
                }
                None => catalog.fallback(),
            },
        };

        Self {
            catalog,
            preferences,
            language,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn languages(&self) -> &'static [LanguageDefinition] {
        &LANGUAGES
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Switch language and persist the choice. The in-memory switch sticks
    /// even if persisting fails.
    pub fn set_language(&mut self, language: Language) -> Result<(), I18nError> {
        self.language = language;
        self.preferences.save(language.code())
    }

    pub fn t(&self, key: &str) -> String {
        self.catalog.translate(self.language, key, None)
    }

    pub fn t_with(&self, key: &str, params: &TranslationParams) -> String {
        self.catalog.translate(self.language, key, Some(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::preferences::MemoryPreferences;

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::builtin().unwrap())
    }

    #[test]
    fn test_stored_preference_wins() {
        let ctx = LocaleContext::initialize(
            catalog(),
            MemoryPreferences::with_value("zh-TW"),
            ["zh-CN"],
        );
        assert_eq!(ctx.language(), Language::ZhTw);
    }

    #[test]
    fn test_invalid_stored_preference_is_ignored() {
        let ctx = LocaleContext::initialize(
            catalog(),
            MemoryPreferences::with_value("klingon"),
            ["zh-SG"],
        );
        assert_eq!(ctx.language(), Language::ZhCn);
    }

    #[test]
    fn test_locale_detection_then_fallback() {
        let ctx = LocaleContext::initialize(catalog(), MemoryPreferences::new(), ["zh-Hant-TW"]);
        assert_eq!(ctx.language(), Language::ZhTw);

        let ctx = LocaleContext::initialize(catalog(), MemoryPreferences::new(), ["fr-FR"]);
        assert_eq!(ctx.language(), Language::En);

        let ctx =
            LocaleContext::initialize(catalog(), MemoryPreferences::new(), Vec::<String>::new());
        assert_eq!(ctx.language(), Language::En);
    }

    #[test]
    fn test_set_language_persists() {
        let mut ctx = LocaleContext::initialize(catalog(), MemoryPreferences::new(), ["en-US"]);
        assert_eq!(ctx.t("common.cancel"), "Cancel");

        ctx.set_language(Language::ZhCn).unwrap();
        assert_eq!(ctx.language(), Language::ZhCn);
        assert_eq!(ctx.preferences.load().as_deref(), Some("zh-CN"));
        assert_eq!(ctx.t("common.cancel"), "取消");
    }

    #[test]
    fn test_translate_with_params() {
        let ctx = LocaleContext::initialize(
            catalog(),
            MemoryPreferences::with_value("zh-CN"),
            Vec::<String>::new(),
        );
        let params = TranslationParams::new().with("count", 5);
        assert_eq!(ctx.t_with("chatInput.maxFiles", &params), "最多可上传 5 个文件");
        assert_eq!(ctx.t("nope.nothing"), "nope.nothing");
        assert_eq!(ctx.languages().len(), 3);
    }
}
