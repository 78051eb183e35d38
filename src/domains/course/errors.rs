use axum::http::StatusCode;
use std::collections::HashMap;

use crate::shared::errors::LocalizedError;

#[derive(Debug, thiserror::Error)]
pub enum CourseError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Course not found: {0}")]
    CourseNotFound(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Published course content cannot be edited")]
    AlreadyPublished,
    #[error("Course needs at least {required} lessons to be published, it has {found}")]
    InvalidPublication { required: usize, found: usize },
    #[error("Course is not open for enrollment")]
    NotPublished,
    #[error("User is already enrolled")]
    AlreadyEnrolled,
    #[error("Payment required for a course priced at {price:.2}")]
    PaymentRequired { price: f64 },
    #[error("User is not enrolled in this course")]
    NotEnrolled,
    #[error("Certificate not found: {0}")]
    CertificateNotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for CourseError {
    fn from(err: anyhow::Error) -> Self {
        CourseError::Storage(format!("{:#}", err))
    }
}

impl LocalizedError for CourseError {
    fn status_code(&self) -> StatusCode {
        match self {
            CourseError::Validation(_) | CourseError::InvalidPublication { .. } => {
                StatusCode::BAD_REQUEST
            }
            CourseError::CourseNotFound(_)
            | CourseError::UserNotFound(_)
            | CourseError::CertificateNotFound(_) => StatusCode::NOT_FOUND,
            CourseError::AccessDenied(_) => StatusCode::FORBIDDEN,
            CourseError::AlreadyPublished | CourseError::AlreadyEnrolled => StatusCode::CONFLICT,
            CourseError::NotPublished | CourseError::NotEnrolled => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CourseError::PaymentRequired { .. } => StatusCode::PAYMENT_REQUIRED,
            CourseError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            CourseError::Validation(_) => "validation_error",
            CourseError::CourseNotFound(_) => "course_not_found",
            CourseError::UserNotFound(_) => "user_not_found",
            CourseError::AccessDenied(_) => "access_denied",
            CourseError::AlreadyPublished => "course_already_published",
            CourseError::InvalidPublication { .. } => "invalid_publication",
            CourseError::NotPublished => "course_not_published",
            CourseError::AlreadyEnrolled => "already_enrolled",
            CourseError::PaymentRequired { .. } => "payment_required",
            CourseError::NotEnrolled => "not_enrolled",
            CourseError::CertificateNotFound(_) => "certificate_not_found",
            CourseError::Storage(_) => "storage_error",
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            CourseError::Validation(_) => "error.validation",
            CourseError::CourseNotFound(_) => "error.course_not_found",
            CourseError::UserNotFound(_) => "error.user_not_found",
            CourseError::AccessDenied(_) => "error.access_denied",
            CourseError::AlreadyPublished => "error.course_already_published",
            CourseError::InvalidPublication { .. } => "error.invalid_publication",
            CourseError::NotPublished => "error.course_not_published",
            CourseError::AlreadyEnrolled => "error.already_enrolled",
            CourseError::PaymentRequired { .. } => "error.payment_required",
            CourseError::NotEnrolled => "error.not_enrolled",
            CourseError::CertificateNotFound(_) => "error.certificate_not_found",
            CourseError::Storage(_) => "error.internal",
        }
    }

    fn message_params(&self) -> HashMap<String, String> {
        match self {
            CourseError::InvalidPublication { required, found } => HashMap::from([
                ("required".to_string(), required.to_string()),
                ("found".to_string(), found.to_string()),
            ]),
            CourseError::PaymentRequired { price } => {
                HashMap::from([("price".to_string(), format!("{:.2}", price))])
            }
            _ => HashMap::new(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            CourseError::Validation(reason) | CourseError::AccessDenied(reason) => {
                Some(reason.clone())
            }
            _ => None,
        }
    }
}
