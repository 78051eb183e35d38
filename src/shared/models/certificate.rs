use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::utils::date_util::{DateTime, DateUtil};

/// Issued once per user and course when progress reaches 100%.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub issued_at: DateTime,
}

impl Certificate {
    pub fn new(user_id: &str, course_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            issued_at: DateUtil::now(),
        }
    }

    pub fn verification_url(&self, base_url: &str) -> String {
        format!("{}/verify/cert/{}", base_url.trim_end_matches('/'), self.id)
    }
}
