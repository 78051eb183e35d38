use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domains::user::dto::{AuthResponse, LoginRequest, RegisterRequest, UserDto};
use crate::domains::user::errors::UserError;
use crate::domains::user::handlers::CurrentUser;
use crate::shared::errors::HandlerError;
use crate::shared::models::UserRole;
use crate::shared::state::{success, AppState};
use crate::shared::utils::date_util::DateUtil;
use crate::system::locale::LocaleExtractor;

/// Self-registration. Administrators are only created by seeding or by an
/// existing administrator changing a role.
fn requested_role(role: Option<&str>) -> Result<UserRole, UserError> {
    let role = match role {
        Some(raw) => UserRole::parse(raw).map_err(UserError::Validation)?,
        None => UserRole::default(),
    };

    if role.is_admin() {
        return Err(UserError::AccessDenied(
            "the admin role cannot be self-assigned".to_string(),
        ));
    }
    Ok(role)
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    let role = state.localize(&locale, requested_role(payload.role.as_deref())).await?;

    let user = state
        .localize(
            &locale,
            state
                .user_service
                .register(&payload.name, &payload.email, &payload.password, role)
                .await,
        )
        .await?;

    let message = state.message(&locale, "auth.registered").await;
    Ok((StatusCode::CREATED, success(message, UserDto::from(&user))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, HandlerError> {
    let issued = state
        .localize(
            &locale,
            state.user_service.login(&payload.email, &payload.password).await,
        )
        .await?;

    let response = AuthResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
        user: UserDto::from(&issued.user),
    };

    let message = state.message(&locale, "auth.login_success").await;
    Ok(success(message, response))
}

pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
) -> Result<Json<Value>, HandlerError> {
    let response = state
        .user_service
        .jwt_service()
        .get_token_validation_response(&current.claims);

    let message = state.message(&locale, "auth.token_valid").await;
    Ok(success(message, response))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
) -> Result<Json<Value>, HandlerError> {
    state.user_service.logout(&current.claims.jti).await;

    let message = state.message(&locale, "auth.logout_success").await;
    Ok(success(message, Value::Null))
}

pub async fn auth_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "auth",
        "active_sessions": state.user_service.active_sessions().await,
        "issuer": state.config().auth.issuer,
        "token_expiry_hours": state.config().auth.token_expiry_hours,
        "timestamp": DateUtil::to_rfc3339(&DateUtil::now())
    }))
}
