use axum::{
    extract::{FromRequestParts, Query},
    http::{request::Parts, HeaderMap},
};
use serde::Deserialize;
use std::convert::Infallible;
use tracing::trace;

use super::{Locale, LocaleInfo, LocaleRegistry, LocaleSource};

#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub lang: Option<String>,
    pub locale: Option<String>,
}

/// Candidate locale tags from the headers, most preferred first.
/// `Accept-Locale` wins over `Accept-Language`.
pub fn extract_locales_from_headers(headers: &HeaderMap) -> Vec<String> {
    if let Some(locale_str) = headers.get("accept-locale").and_then(|h| h.to_str().ok()) {
        return vec![normalize_locale(locale_str)];
    }

    headers
        .get("accept-language")
        .and_then(|h| h.to_str().ok())
        .map(parse_accept_language)
        .unwrap_or_default()
}

/// Parses `es-MX,es;q=0.9,en;q=0.8` into language tags ordered by quality.
pub fn parse_accept_language(accept_language: &str) -> Vec<String> {
    let mut locales: Vec<(String, f32)> = accept_language
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_locale_with_quality)
        .collect();

    // Stable sort keeps header order between equal qualities
    locales.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    locales.into_iter().map(|(locale, _)| locale).collect()
}

fn parse_locale_with_quality(part: &str) -> (String, f32) {
    match part.split_once(";q=") {
        Some((locale, quality)) => (
            normalize_locale(locale),
            quality.trim().parse::<f32>().unwrap_or(1.0),
        ),
        None => (normalize_locale(part), 1.0),
    }
}

fn normalize_locale(locale: &str) -> String {
    let locale = locale.trim();
    match locale.split_once('-') {
        Some((lang, _)) => lang.to_lowercase(),
        None => locale.to_lowercase(),
    }
}

pub fn extract_locale_from_query(query: &LocaleQuery) -> Option<String> {
    query.locale.clone().or_else(|| query.lang.clone())
}

/// Resolution order: query parameter, then headers, then the default.
pub fn extract_locale_info(headers: &HeaderMap, query: Option<&LocaleQuery>) -> LocaleInfo {
    let registry = LocaleRegistry::new();

    if let Some(locale) = query
        .and_then(extract_locale_from_query)
        .and_then(|locale_str| Locale::parse(&locale_str).ok())
    {
        return registry.resolve_locale(&locale, LocaleSource::Query);
    }

    let from_headers = extract_locales_from_headers(headers)
        .iter()
        .filter_map(|locale_str| Locale::parse(locale_str).ok())
        .find(|locale| registry.is_supported(locale));

    if let Some(locale) = from_headers {
        return registry.resolve_locale(&locale, LocaleSource::Header);
    }

    registry.resolve_locale(&registry.get_default_locale(), LocaleSource::Default)
}

pub fn locale_from_parts(parts: &Parts) -> Locale {
    let query = Query::<LocaleQuery>::try_from_uri(&parts.uri)
        .map(|Query(query)| query)
        .ok();
    let info = extract_locale_info(&parts.headers, query.as_ref());
    trace!(
        locale = %info.locale,
        source = ?info.source,
        fallback = ?info.fallback,
        "request locale resolved"
    );
    info.locale
}

/// Request locale for handlers. Never rejects; falls back to English.
#[derive(Debug, Clone, Copy)]
pub struct LocaleExtractor(pub Locale);

impl<S> FromRequestParts<S> for LocaleExtractor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(LocaleExtractor(locale_from_parts(parts)))
    }
}

impl std::ops::Deref for LocaleExtractor {
    type Target = Locale;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
