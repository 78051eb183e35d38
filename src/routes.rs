use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domains::course::handlers::{
    add_module, create_course, enroll, get_certificate, get_course, instructor_courses,
    list_catalog, my_certificates, publish_course, update_progress,
};
use crate::domains::user::handlers::{
    activate_user, auth_health, change_password, change_role, deactivate_user, get_profile,
    get_user, list_users, login, logout, register, update_profile, validate_token,
};
use crate::shared::state::AppState;
use crate::shared::utils::date_util::DateUtil;
use crate::system::database;
use crate::system::locale::LocaleRegistry;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config", get(config_handler))
        // Auth
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/validate", get(validate_token))
        .route("/auth/logout", post(logout))
        .route("/auth/health", get(auth_health))
        // Users
        .route("/users", get(list_users))
        .route("/users/me", get(get_profile).patch(update_profile))
        .route("/users/me/password", post(change_password))
        .route("/users/me/certificates", get(my_certificates))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/role", put(change_role))
        .route("/users/{id}/deactivate", post(deactivate_user))
        .route("/users/{id}/activate", post(activate_user))
        // Courses
        .route("/courses", get(list_catalog).post(create_course))
        .route("/courses/{id}", get(get_course))
        .route("/courses/{id}/modules", post(add_module))
        .route("/courses/{id}/publish", post(publish_course))
        .route("/courses/{id}/enroll", post(enroll))
        .route("/courses/{id}/progress", put(update_progress).patch(update_progress))
        .route("/instructors/{id}/courses", get(instructor_courses))
        .route("/certificates/{id}", get(get_certificate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let shared = &state.shared_state;
    let databases = match &shared.db_manager {
        Some(manager) => json!(database::health_check(manager).await),
        None => json!({}),
    };

    Json(json!({
        "status": "healthy",
        "timestamp": DateUtil::to_rfc3339(&DateUtil::now()),
        "environment": shared.config.environment,
        "storage": shared.storage_backend(),
        "databases": databases
    }))
}

async fn config_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let config = state.config();
    let locales: Vec<Value> = LocaleRegistry::new()
        .get_supported_locales()
        .iter()
        .map(|locale| json!({"code": locale.code(), "name": locale.to_full_name()}))
        .collect();

    Json(json!({
        "environment": config.environment,
        "server": {
            "host": config.server.host,
            "port": config.server.port
        },
        "databases": config.databases.len(),
        "courses": {
            "min_lessons_to_publish": config.courses.min_lessons_to_publish,
            "certificate_base_url": config.courses.certificate_base_url
        },
        "locales": locales
    }))
}
