use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::utils::date_util::{DateTime, DateUtil};

/// One login. Its id is the `jti` of the access token issued with it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserSession {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime,
    pub expires_at: DateTime,
    pub is_active: bool,
}

impl UserSession {
    pub fn new(user_id: &str, expires_at: DateTime) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: DateUtil::now(),
            expires_at,
            is_active: true,
        }
    }

    pub fn is_expired(&self) -> bool {
        DateUtil::is_past(&self.expires_at)
    }

    pub fn is_valid(&self) -> bool {
        self.is_active && !self.is_expired()
    }

    pub fn invalidate(&mut self) {
        self.is_active = false;
    }
}
