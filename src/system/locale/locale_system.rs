use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn parse(locale_str: &str) -> Result<Self, LocaleError> {
        match locale_str.trim().to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::En),
            "es" | "es-es" | "es-mx" | "spanish" | "español" | "espanol" => Ok(Locale::Es),
            _ => Err(LocaleError::UnsupportedLocale(locale_str.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    pub fn to_full_name(&self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Es => "Español",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleSource {
    Query,
    Header,
    Default,
}

#[derive(Debug, Clone)]
pub struct LocaleInfo {
    pub locale: Locale,
    pub source: LocaleSource,
    pub fallback: Option<Locale>,
}

impl Default for LocaleInfo {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            source: LocaleSource::Default,
            fallback: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LocaleError {
    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),
    #[error("Message not found: {0}")]
    MessageNotFound(String),
    #[error("Locale file error: {0}")]
    FileError(String),
}

#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    supported_locales: Vec<Locale>,
    default_locale: Locale,
    fallback_chain: HashMap<Locale, Vec<Locale>>,
}

impl LocaleRegistry {
    pub fn new() -> Self {
        let mut fallback_chain = HashMap::new();
        // English is the base and has no fallback
        fallback_chain.insert(Locale::Es, vec![Locale::En]);

        Self {
            supported_locales: vec![Locale::En, Locale::Es],
            default_locale: Locale::En,
            fallback_chain,
        }
    }

    pub fn is_supported(&self, locale: &Locale) -> bool {
        self.supported_locales.contains(locale)
    }

    pub fn get_supported_locales(&self) -> &[Locale] {
        &self.supported_locales
    }

    pub fn get_default_locale(&self) -> Locale {
        self.default_locale
    }

    pub fn get_fallback_chain(&self, locale: &Locale) -> Vec<Locale> {
        match self.fallback_chain.get(locale) {
            Some(chain) => chain.clone(),
            None if *locale == self.default_locale => vec![],
            None => vec![self.default_locale],
        }
    }

    pub fn resolve_locale(&self, requested: &Locale, source: LocaleSource) -> LocaleInfo {
        if self.is_supported(requested) {
            LocaleInfo {
                locale: *requested,
                source,
                fallback: self.get_fallback_chain(requested).first().copied(),
            }
        } else {
            LocaleInfo::default()
        }
    }
}

impl Default for LocaleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
