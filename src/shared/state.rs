use anyhow::Result;
use axum::Json;
use std::sync::Arc;
use tracing::info;

use crate::domains::course::repository::{
    CertificateRepository, CourseRepository, InMemoryCertificateRepository,
    InMemoryCourseRepository, MongoCertificateRepository, MongoCourseRepository,
};
use crate::domains::course::services::CourseService;
use crate::domains::user::repository::{InMemoryUserRepository, MongoUserRepository, UserRepository};
use crate::domains::user::services::{
    JwtConfig, JwtService, PasswordConfig, PasswordService, UserService,
};
use crate::shared::errors::{self, HandlerError, LocalizedError};
use crate::system::config::AppConfig;
use crate::system::database::{self, DatabaseManager, DatabaseService};
use crate::system::locale::{t, Locale, MessageLoader};

/// System-level dependencies shared by every domain.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<AppConfig>,
    pub message_loader: Arc<MessageLoader>,
    /// `None` when running on in-memory storage
    pub db_manager: Option<DatabaseManager>,
}

impl SharedState {
    pub fn storage_backend(&self) -> &'static str {
        if self.db_manager.is_some() {
            "mongodb"
        } else {
            "memory"
        }
    }
}

pub struct AppState {
    pub shared_state: SharedState,
    pub user_service: Arc<UserService>,
    pub course_service: Arc<CourseService>,
}

struct Repositories {
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    certificates: Arc<dyn CertificateRepository>,
}

impl Repositories {
    fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            courses: Arc::new(InMemoryCourseRepository::new()),
            certificates: Arc::new(InMemoryCertificateRepository::new()),
        }
    }

    async fn mongo(manager: &DatabaseManager) -> Result<Self> {
        let database = database::get_database(manager, None).await?;

        let users = MongoUserRepository::new(&database);
        users.ensure_indexes().await?;

        Ok(Self {
            users: Arc::new(users),
            courses: Arc::new(MongoCourseRepository::new(&database)),
            certificates: Arc::new(MongoCertificateRepository::new(&database)),
        })
    }
}

impl AppState {
    /// Connects to MongoDB when databases are configured, otherwise keeps
    /// everything in memory.
    pub async fn initialize(config: AppConfig) -> Result<Arc<Self>> {
        let (db_manager, repositories) = if config.uses_database() {
            let manager = DatabaseService::initialize(&config).await?;
            let repositories = Repositories::mongo(&manager).await?;
            info!(connections = ?manager.read().await.list_connections(), "using MongoDB storage");
            (Some(manager), repositories)
        } else {
            info!("no database configured, using in-memory storage");
            (None, Repositories::in_memory())
        };

        Ok(Arc::new(Self::assemble(config, db_manager, repositories)))
    }

    #[cfg(test)]
    pub fn in_memory(config: AppConfig) -> Arc<Self> {
        Arc::new(Self::assemble(config, None, Repositories::in_memory()))
    }

    fn assemble(
        config: AppConfig,
        db_manager: Option<DatabaseManager>,
        repositories: Repositories,
    ) -> Self {
        let user_service = UserService::new(
            repositories.users.clone(),
            PasswordService::new(PasswordConfig::from(&config.auth)),
            JwtService::new(JwtConfig::from(&config.auth)),
        );
        let course_service = CourseService::new(
            repositories.courses,
            repositories.certificates,
            repositories.users,
            config.courses.clone(),
        );

        let shared_state = SharedState {
            message_loader: Arc::new(MessageLoader::new(&config.locales_path)),
            config: Arc::new(config),
            db_manager,
        };

        Self {
            shared_state,
            user_service: Arc::new(user_service),
            course_service: Arc::new(course_service),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.shared_state.config
    }

    pub async fn error_response<E: LocalizedError>(&self, locale: &Locale, err: &E) -> HandlerError {
        errors::error_response(&self.shared_state.message_loader, locale, err).await
    }

    /// Maps a domain error to a localized HTTP error.
    pub async fn localize<T, E: LocalizedError>(
        &self,
        locale: &Locale,
        result: Result<T, E>,
    ) -> Result<T, HandlerError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => Err(self.error_response(locale, &err).await),
        }
    }

    pub async fn message(&self, locale: &Locale, key: &str) -> String {
        t(&self.shared_state.message_loader, key, locale).await
    }
}

/// Success envelope used by every handler.
pub fn success<T: serde::Serialize>(message: String, data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": message,
        "data": data
    }))
}
