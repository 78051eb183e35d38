use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use std::convert::Infallible;
use std::sync::Arc;

use crate::domains::user::dto::Claims;
use crate::domains::user::errors::UserError;
use crate::domains::user::services::JwtError;
use crate::shared::errors::HandlerError;
use crate::shared::models::User;
use crate::shared::state::AppState;
use crate::system::locale::locale_from_parts;

/// The authenticated caller, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub claims: Claims,
    pub user: User,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.role.is_admin()
    }

    /// Admin-only endpoints call this first.
    pub fn require_admin(&self) -> Result<(), UserError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(UserError::AccessDenied("administrator role required".to_string()))
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_string())
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = HandlerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let locale = locale_from_parts(parts);

        let Some(token) = bearer_token(parts) else {
            let err = UserError::Token(JwtError::MissingToken);
            return Err(state.error_response(&locale, &err).await);
        };

        let (claims, user) = state
            .localize(&locale, state.user_service.authenticate(&token).await)
            .await?;
        Ok(CurrentUser { claims, user })
    }
}

/// The caller when a valid token was sent. Bad or missing tokens yield
/// `None` instead of rejecting.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeUser(None));
        };

        let current = state
            .user_service
            .authenticate(&token)
            .await
            .ok()
            .map(|(claims, user)| CurrentUser { claims, user });
        Ok(MaybeUser(current))
    }
}

impl MaybeUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref().map(|current| &current.user)
    }
}
