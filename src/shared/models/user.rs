use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::utils::date_util::{DateTime, DateUtil};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Teacher,
    Specialist,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Student,
        UserRole::Teacher,
        UserRole::Specialist,
        UserRole::Admin,
    ];

    /// Accepts the English names and their Spanish equivalents.
    pub fn parse(role: &str) -> Result<Self, String> {
        match role.trim().to_lowercase().as_str() {
            "student" | "estudiante" => Ok(UserRole::Student),
            "teacher" | "maestro" => Ok(UserRole::Teacher),
            "specialist" | "especialista" => Ok(UserRole::Specialist),
            "admin" | "administrator" | "administrador" => Ok(UserRole::Admin),
            _ => {
                let expected: Vec<&str> = Self::ALL.iter().map(UserRole::as_str).collect();
                Err(format!(
                    "invalid role '{}', expected one of: {}",
                    role.trim(),
                    expected.join(", ")
                ))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
            UserRole::Specialist => "specialist",
            UserRole::Admin => "admin",
        }
    }

    pub fn can_author_courses(&self) -> bool {
        matches!(self, UserRole::Teacher | UserRole::Specialist)
    }

    pub fn is_admin(&self) -> bool {
        *self == UserRole::Admin
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::parse(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Always lowercase
    pub email: String,
    pub role: UserRole,
    pub password_hash: String,
    pub is_active: bool,
    pub registered_at: DateTime,
    pub last_login: Option<DateTime>,
}

impl User {
    pub fn new(name: &str, email: &str, password_hash: String, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            role,
            password_hash,
            is_active: true,
            registered_at: DateUtil::now(),
            last_login: None,
        }
    }

    pub fn record_login(&mut self) {
        self.last_login = Some(DateUtil::now());
    }

    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn reactivate(&mut self) {
        self.is_active = true;
    }
}
