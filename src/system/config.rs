use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub connection_timeout: u64,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub token_expiry_hours: i64,
    pub issuer: String,
    pub password_min_length: usize,
    /// Character classes a password must contain; all off by default
    pub password_rules: PasswordRules,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRules {
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub special_chars: bool,
}

/// Administrator account created at startup when `ADMIN_PASSWORD` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSeedConfig {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfig {
    pub min_lessons_to_publish: usize,
    pub certificate_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub databases: Vec<DatabaseConfig>,
    pub auth: AuthConfig,
    pub admin: Option<AdminSeedConfig>,
    pub courses: CourseConfig,
    pub locales_path: String,
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
            },
            log: LogConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
            databases: vec![],
            auth: AuthConfig {
                jwt_secret: "lms-development-secret".to_string(),
                token_expiry_hours: 24,
                issuer: "lms-service".to_string(),
                password_min_length: 8,
                password_rules: PasswordRules::default(),
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            admin: None,
            courses: CourseConfig {
                min_lessons_to_publish: 3,
                certificate_base_url: "https://lms.com".to_string(),
            },
            locales_path: "locales".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let mut config = AppConfig::default();

        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        config.environment = environment.clone();

        // Later files override earlier ones
        let env_files = [
            "configs/.env.default".to_string(),
            format!("configs/.env.{}", environment),
            "configs/.env.local".to_string(),
        ];

        for env_file in env_files {
            if Path::new(&env_file).exists() {
                load_env_file(&env_file)?;
            }
        }

        config.load_from_env();

        Ok(config)
    }

    fn load_from_env(&mut self) {
        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse("SERVER_PORT") {
            self.server.port = port;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(format) = env_parse("LOG_FORMAT") {
            self.log.format = format;
        }

        if let Ok(secret) = env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(hours) = env_parse("JWT_EXPIRY_HOURS") {
            self.auth.token_expiry_hours = hours;
        }
        if let Ok(issuer) = env::var("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }
        if let Some(min_length) = env_parse("PASSWORD_MIN_LENGTH") {
            self.auth.password_min_length = min_length;
        }
        if let Some(cost) = env_parse("PASSWORD_BCRYPT_COST") {
            self.auth.bcrypt_cost = cost;
        }
        let rules = &mut self.auth.password_rules;
        for (key, flag) in [
            ("PASSWORD_REQUIRE_UPPERCASE", &mut rules.uppercase),
            ("PASSWORD_REQUIRE_LOWERCASE", &mut rules.lowercase),
            ("PASSWORD_REQUIRE_DIGITS", &mut rules.digits),
            ("PASSWORD_REQUIRE_SPECIAL", &mut rules.special_chars),
        ] {
            if let Some(value) = env_parse::<bool>(key) {
                *flag = value;
            }
        }

        if let Ok(password) = env::var("ADMIN_PASSWORD") {
            self.admin = Some(AdminSeedConfig {
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "System Admin".to_string()),
                email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@lms.com".to_string()),
                password,
            });
        }

        if let Some(min_lessons) = env_parse("COURSE_MIN_LESSONS_TO_PUBLISH") {
            self.courses.min_lessons_to_publish = min_lessons;
        }
        if let Ok(base_url) = env::var("CERTIFICATE_BASE_URL") {
            self.courses.certificate_base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Ok(path) = env::var("LOCALES_PATH") {
            self.locales_path = path;
        }

        // DB_*, DB1_*, DB2_* ... until the first missing host
        let mut db_index = 0;
        loop {
            let prefix = if db_index == 0 { "DB".to_string() } else { format!("DB{}", db_index) };

            let Ok(host) = env::var(format!("{}_HOST", prefix)) else {
                break;
            };

            let db_config = DatabaseConfig {
                host,
                port: env_parse(&format!("{}_PORT", prefix)).unwrap_or(27017),
                database: env::var(format!("{}_DATABASE", prefix))
                    .unwrap_or_else(|_| "lms".to_string()),
                username: env::var(format!("{}_USERNAME", prefix)).ok(),
                password: env::var(format!("{}_PASSWORD", prefix)).ok(),
                connection_timeout: env_parse(&format!("{}_CONNECTION_TIMEOUT", prefix))
                    .unwrap_or(10),
                max_connections: env_parse(&format!("{}_MAX_CONNECTIONS", prefix))
                    .unwrap_or(10),
            };

            if db_index < self.databases.len() {
                self.databases[db_index] = db_config;
            } else {
                self.databases.push(db_config);
            }
            db_index += 1;
        }
    }

    pub fn uses_database(&self) -> bool {
        !self.databases.is_empty()
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

fn load_env_file(path: &str) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read env file {}", path))?;

    for (key, value) in content.lines().filter_map(parse_env_line) {
        unsafe {
            env::set_var(key, value);
        }
    }

    Ok(())
}

/// Parses one `KEY=value` line, skipping blanks and comments and stripping
/// one pair of matching quotes around the value.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let value = value.trim();
    let value = if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        &value[1..value.len() - 1]
    } else {
        value
    };

    Some((key, value))
}

#[cfg(test)]
impl AppConfig {
    /// Defaults with the cheapest bcrypt cost so tests stay fast.
    pub fn for_tests() -> Self {
        let mut config = AppConfig::default();
        config.auth.bcrypt_cost = 4;
        config.environment = "test".to_string();
        config
    }
}
