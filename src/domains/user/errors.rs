use axum::http::StatusCode;
use std::collections::HashMap;

use crate::domains::user::services::{JwtError, PasswordError};
use crate::shared::errors::LocalizedError;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Email already registered: {0}")]
    EmailTaken(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Account is disabled")]
    AccountDisabled,
    #[error("Session has been revoked")]
    SessionRevoked,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] JwtError),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        UserError::Storage(format!("{:#}", err))
    }
}

impl LocalizedError for UserError {
    fn status_code(&self) -> StatusCode {
        match self {
            UserError::Validation(_) => StatusCode::BAD_REQUEST,
            UserError::EmailTaken(_) => StatusCode::CONFLICT,
            UserError::InvalidCredentials | UserError::SessionRevoked => StatusCode::UNAUTHORIZED,
            UserError::NotFound(_) => StatusCode::NOT_FOUND,
            UserError::AccessDenied(_) | UserError::AccountDisabled => StatusCode::FORBIDDEN,
            UserError::Password(PasswordError::WeakPassword { .. }) => StatusCode::BAD_REQUEST,
            UserError::Token(JwtError::TokenCreation(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            UserError::Token(_) => StatusCode::UNAUTHORIZED,
            UserError::Password(_) | UserError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            UserError::Validation(_) => "validation_error",
            UserError::EmailTaken(_) => "email_taken",
            UserError::InvalidCredentials => "invalid_credentials",
            UserError::NotFound(_) => "user_not_found",
            UserError::AccessDenied(_) => "access_denied",
            UserError::AccountDisabled => "account_disabled",
            UserError::SessionRevoked => "session_revoked",
            UserError::Password(PasswordError::WeakPassword { .. }) => "weak_password",
            UserError::Token(JwtError::MissingToken) => "missing_token",
            UserError::Token(JwtError::TokenExpired) => "token_expired",
            UserError::Token(JwtError::TokenValidation(_)) => "invalid_token",
            UserError::Token(JwtError::TokenCreation(_)) => "token_error",
            UserError::Password(_) => "password_error",
            UserError::Storage(_) => "storage_error",
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            UserError::Validation(_) => "error.validation",
            UserError::EmailTaken(_) => "error.email_taken",
            UserError::InvalidCredentials => "error.invalid_credentials",
            UserError::NotFound(_) => "error.user_not_found",
            UserError::AccessDenied(_) => "error.access_denied",
            UserError::AccountDisabled => "error.account_disabled",
            UserError::SessionRevoked => "error.session_revoked",
            UserError::Password(PasswordError::WeakPassword { .. }) => "error.weak_password",
            UserError::Token(JwtError::MissingToken) => "error.missing_token",
            UserError::Token(JwtError::TokenExpired) => "error.token_expired",
            UserError::Token(JwtError::TokenValidation(_)) => "error.invalid_token",
            UserError::Token(JwtError::TokenCreation(_))
            | UserError::Password(_)
            | UserError::Storage(_) => "error.internal",
        }
    }

    fn message_params(&self) -> HashMap<String, String> {
        match self {
            UserError::EmailTaken(email) => HashMap::from([("email".to_string(), email.clone())]),
            _ => HashMap::new(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            UserError::Validation(reason) | UserError::AccessDenied(reason) => Some(reason.clone()),
            UserError::Password(PasswordError::WeakPassword { violations }) => {
                Some(violations.join("; "))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(UserError::EmailTaken("a@b.co".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(UserError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(UserError::AccountDisabled.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            UserError::Token(JwtError::TokenExpired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            UserError::from(anyhow::anyhow!("connection reset")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_weak_password_details() {
        let err = UserError::from(PasswordError::WeakPassword {
            violations: vec!["too short".into(), "no digits".into()],
        });

        assert_eq!(err.error_code(), "weak_password");
        assert_eq!(err.details().as_deref(), Some("too short; no digits"));
    }
}
