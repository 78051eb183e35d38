use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::shared::models::UserSession;
use crate::shared::utils::date_util::DateTime;

/// Login sessions, kept in process memory. Tokens whose session is missing
/// or inactive are refused even if their signature is valid.
#[derive(Debug, Default)]
pub struct SessionService {
    sessions: RwLock<HashMap<String, UserSession>>,
}

impl SessionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&self, user_id: &str, expires_at: DateTime) -> UserSession {
        let session = UserSession::new(user_id, expires_at);

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.is_valid());
        sessions.insert(session.session_id.clone(), session.clone());

        session
    }

    pub async fn is_valid(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).is_some_and(UserSession::is_valid)
    }

    pub async fn revoke(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.invalidate();
            debug!(session_id, user_id = %session.user_id, "session revoked");
        }
    }

    pub async fn revoke_all_for_user(&self, user_id: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut revoked = 0;
        for session in sessions.values_mut().filter(|s| s.user_id == user_id && s.is_active) {
            session.invalidate();
            revoked += 1;
        }
        revoked
    }

    pub async fn active_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.values().filter(|s| s.is_valid()).count()
    }
}
