use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use tracing::{error, warn};

use crate::system::locale::{Locale, MessageLoader};

/// Error body shared by every endpoint.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(error: &str, message: &str, details: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            details: Some(details.to_string()),
        }
    }
}

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

/// An error that can be rendered to a client in its own language.
pub trait LocalizedError: std::error::Error {
    fn status_code(&self) -> StatusCode;

    /// Stable machine-readable code, e.g. `email_taken`
    fn error_code(&self) -> &'static str;

    /// Key into `locales/*.json`
    fn message_key(&self) -> &'static str;

    fn message_params(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn details(&self) -> Option<String> {
        None
    }
}

/// Builds the HTTP error for `err`, translating the message when the
/// locale files have it and falling back to the error's `Display`.
pub async fn error_response<E: LocalizedError>(
    loader: &MessageLoader,
    locale: &Locale,
    err: &E,
) -> HandlerError {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, code = err.error_code(), "request failed");
    } else {
        warn!(error = %err, code = err.error_code(), "request rejected");
    }

    let message = loader
        .get_message_with_params(err.message_key(), locale, &err.message_params())
        .await
        .unwrap_or_else(|_| err.to_string());

    let body = match err.details() {
        Some(details) => ErrorResponse::with_details(err.error_code(), &message, &details),
        None => ErrorResponse::new(err.error_code(), &message),
    };

    (status, Json(body))
}
