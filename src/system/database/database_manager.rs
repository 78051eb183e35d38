use anyhow::{Context, Result};
use mongodb::{options::ClientOptions, Client, Database};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use crate::system::config::{AppConfig, DatabaseConfig};

pub type DatabaseHandle = Arc<Database>;
pub type DatabaseManager = Arc<RwLock<DatabaseService>>;

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub database_name: String,
    pub database: DatabaseHandle,
}

/// Named MongoDB connections. The first configured database is `default`,
/// the rest are `db1`, `db2`, ...
pub struct DatabaseService {
    connections: HashMap<String, ConnectionInfo>,
    default_connection: Option<String>,
}

impl DatabaseService {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            default_connection: None,
        }
    }

    pub async fn initialize(config: &AppConfig) -> Result<DatabaseManager> {
        let mut service = DatabaseService::new();

        for (index, db_config) in config.databases.iter().enumerate() {
            let connection_name = connection_name(index);
            let connection_info = Self::create_connection(db_config, &connection_name).await?;

            info!(
                connection = %connection_name,
                database = %db_config.database,
                "connected to database"
            );

            if index == 0 {
                service.default_connection = Some(connection_name.clone());
            }

            service.connections.insert(connection_name, connection_info);
        }

        if service.connections.is_empty() {
            return Err(anyhow::anyhow!("No database connections configured"));
        }

        info!(
            connections = service.connections.len(),
            "database manager initialized"
        );

        Ok(Arc::new(RwLock::new(service)))
    }

    async fn create_connection(
        config: &DatabaseConfig,
        connection_name: &str,
    ) -> Result<ConnectionInfo> {
        let mut client_options = ClientOptions::parse(connection_string(config))
            .await
            .with_context(|| {
                format!("Failed to parse connection string for {}", connection_name)
            })?;

        client_options.max_pool_size = Some(config.max_connections);
        client_options.connect_timeout = Some(Duration::from_secs(config.connection_timeout));
        client_options.server_selection_timeout =
            Some(Duration::from_secs(config.connection_timeout));
        client_options.app_name = Some("lms".to_string());

        let client = Client::with_options(client_options)
            .with_context(|| format!("Failed to create MongoDB client for {}", connection_name))?;

        let database = client.database(&config.database);

        database
            .run_command(bson::doc! { "ping": 1 })
            .await
            .with_context(|| format!("Failed to ping database {}", connection_name))?;

        Ok(ConnectionInfo {
            database_name: config.database.clone(),
            database: Arc::new(database),
        })
    }

    pub fn get_database(&self, name: Option<&str>) -> Result<DatabaseHandle> {
        let connection_name = match name {
            Some(name) => name.to_string(),
            None => self
                .default_connection
                .clone()
                .ok_or_else(|| anyhow::anyhow!("No default database connection"))?,
        };

        self.connections
            .get(&connection_name)
            .map(|conn| conn.database.clone())
            .ok_or_else(|| anyhow::anyhow!("Database connection '{}' not found", connection_name))
    }

    /// `name=database` pairs, sorted by connection name.
    pub fn list_connections(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .connections
            .iter()
            .map(|(name, conn)| format!("{}={}", name, conn.database_name))
            .collect();
        names.sort();
        names
    }

    pub async fn health_check(&self) -> HashMap<String, bool> {
        let mut results = HashMap::new();

        for (name, conn) in &self.connections {
            let is_healthy = conn
                .database
                .run_command(bson::doc! { "ping": 1 })
                .await
                .is_ok();

            results.insert(name.clone(), is_healthy);
        }

        results
    }
}

impl Default for DatabaseService {
    fn default() -> Self {
        Self::new()
    }
}

fn connection_name(index: usize) -> String {
    if index == 0 {
        "default".to_string()
    } else {
        format!("db{}", index)
    }
}

fn connection_string(config: &DatabaseConfig) -> String {
    match (&config.username, &config.password) {
        (Some(username), Some(password)) => format!(
            "mongodb://{}:{}@{}:{}/{}",
            username, password, config.host, config.port, config.database
        ),
        _ => format!(
            "mongodb://{}:{}/{}",
            config.host, config.port, config.database
        ),
    }
}

pub async fn get_database(manager: &DatabaseManager, name: Option<&str>) -> Result<DatabaseHandle> {
    let service = manager.read().await;
    service.get_database(name)
}

pub async fn health_check(manager: &DatabaseManager) -> HashMap<String, bool> {
    let service = manager.read().await;
    service.health_check().await
}
