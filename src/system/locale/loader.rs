use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use super::{Locale, LocaleError, LocaleRegistry};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Messages {
    pub messages: HashMap<String, String>,
    pub metadata: Option<MessageMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub locale: String,
    pub version: String,
    pub last_updated: String,
}

impl Messages {
    pub fn get(&self, key: &str) -> Option<&String> {
        self.messages.get(key)
    }
}

/// Reads `{base_path}/{locale}.json` once per locale and caches the result.
#[derive(Debug)]
pub struct MessageLoader {
    base_path: PathBuf,
    cache: Arc<RwLock<HashMap<Locale, Messages>>>,
    registry: LocaleRegistry,
}

impl MessageLoader {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            cache: Arc::new(RwLock::new(HashMap::new())),
            registry: LocaleRegistry::new(),
        }
    }

    pub async fn load_locale(&self, locale: &Locale) -> Result<Messages, LocaleError> {
        {
            let cache = self.cache.read().await;
            if let Some(messages) = cache.get(locale) {
                return Ok(messages.clone());
            }
        }

        let messages = self.load_from_file(locale).await?;

        let mut cache = self.cache.write().await;
        cache.insert(*locale, messages.clone());

        Ok(messages)
    }

    async fn load_from_file(&self, locale: &Locale) -> Result<Messages, LocaleError> {
        let file_path = self.base_path.join(format!("{}.json", locale.code()));

        let content = tokio::fs::read_to_string(&file_path).await.map_err(|e| {
            LocaleError::FileError(format!("Failed to read locale file {:?}: {}", file_path, e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            LocaleError::FileError(format!("Failed to parse locale file {:?}: {}", file_path, e))
        })
    }

    pub async fn get_message(&self, key: &str, locale: &Locale) -> Result<String, LocaleError> {
        let mut chain = vec![*locale];
        chain.extend(self.registry.get_fallback_chain(locale));

        for candidate in &chain {
            match self.load_locale(candidate).await {
                Ok(messages) => {
                    if let Some(message) = messages.get(key) {
                        return Ok(message.clone());
                    }
                }
                Err(e) => warn!(locale = %candidate, error = %e, "locale unavailable"),
            }
        }

        Err(LocaleError::MessageNotFound(format!(
            "Message '{}' not found for locale '{}' or its fallbacks",
            key, locale
        )))
    }

    pub async fn get_message_with_params(
        &self,
        key: &str,
        locale: &Locale,
        params: &HashMap<String, String>,
    ) -> Result<String, LocaleError> {
        let template = self.get_message(key, locale).await?;
        Ok(interpolate_message(&template, params))
    }

    /// Warms the cache; a missing locale file is logged, not fatal.
    pub async fn preload_all(&self) {
        for locale in self.registry.get_supported_locales() {
            if let Err(e) = self.load_locale(locale).await {
                warn!(locale = %locale, error = %e, "failed to preload locale");
            }
        }
    }
}

fn interpolate_message(template: &str, params: &HashMap<String, String>) -> String {
    params.iter().fold(template.to_string(), |message, (key, value)| {
        message.replace(&format!("{{{}}}", key), value)
    })
}

/// Looks up `key`, showing the key in brackets when no translation exists.
pub async fn t(loader: &MessageLoader, key: &str, locale: &Locale) -> String {
    loader
        .get_message(key, locale)
        .await
        .unwrap_or_else(|_| format!("[{}]", key))
}
