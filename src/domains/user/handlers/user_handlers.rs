use axum::extract::{Json, Path, Query, State};
use serde_json::Value;
use std::sync::Arc;

use crate::domains::user::dto::{
    ChangePasswordRequest, ChangeRoleRequest, ListUsersQuery, UpdateProfileRequest, UserDto,
};
use crate::domains::user::errors::UserError;
use crate::domains::user::handlers::CurrentUser;
use crate::shared::errors::HandlerError;
use crate::shared::models::{User, UserRole};
use crate::shared::state::{success, AppState};
use crate::system::locale::LocaleExtractor;

fn user_dtos(users: &[User]) -> Vec<UserDto> {
    users.iter().map(UserDto::from).collect()
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
) -> Result<Json<Value>, HandlerError> {
    let message = state.message(&locale, "user.profile").await;
    Ok(success(message, UserDto::from(&current.user)))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, HandlerError> {
    let user = state
        .localize(
            &locale,
            state
                .user_service
                .update_profile(current.id(), payload.name.as_deref(), payload.email.as_deref())
                .await,
        )
        .await?;

    let message = state.message(&locale, "user.profile_updated").await;
    Ok(success(message, UserDto::from(&user)))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, HandlerError> {
    state
        .localize(
            &locale,
            state
                .user_service
                .change_password(current.id(), &payload.current_password, &payload.new_password)
                .await,
        )
        .await?;

    let message = state.message(&locale, "user.password_changed").await;
    Ok(success(message, Value::Null))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Value>, HandlerError> {
    state.localize(&locale, current.require_admin()).await?;

    let result = match query.role.as_deref() {
        Some(raw) => match UserRole::parse(raw) {
            Ok(role) => state.user_service.list_by_role(role).await,
            Err(reason) => Err(UserError::Validation(reason)),
        },
        None => state.user_service.list_all().await,
    };
    let users = state.localize(&locale, result).await?;

    let message = state.message(&locale, "user.listed").await;
    Ok(success(message, user_dtos(&users)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    if current.id() != user_id {
        state.localize(&locale, current.require_admin()).await?;
    }

    let user = state
        .localize(&locale, state.user_service.get_by_id(&user_id).await)
        .await?;

    let message = state.message(&locale, "user.profile").await;
    Ok(success(message, UserDto::from(&user)))
}

pub async fn change_role(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Path(user_id): Path<String>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<Value>, HandlerError> {
    state.localize(&locale, current.require_admin()).await?;

    let role = state
        .localize(&locale, UserRole::parse(&payload.role).map_err(UserError::Validation))
        .await?;
    let user = state
        .localize(&locale, state.user_service.change_role(&user_id, role).await)
        .await?;

    let message = state.message(&locale, "user.role_changed").await;
    Ok(success(message, UserDto::from(&user)))
}

pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    state.localize(&locale, current.require_admin()).await?;

    let user = state
        .localize(&locale, state.user_service.deactivate(&user_id).await)
        .await?;

    let message = state.message(&locale, "user.deactivated").await;
    Ok(success(message, UserDto::from(&user)))
}

pub async fn activate_user(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    state.localize(&locale, current.require_admin()).await?;

    let user = state
        .localize(&locale, state.user_service.reactivate(&user_id).await)
        .await?;

    let message = state.message(&locale, "user.activated").await;
    Ok(success(message, UserDto::from(&user)))
}
