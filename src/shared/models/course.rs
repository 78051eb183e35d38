use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::shared::models::User;
use crate::shared::utils::date_util::{DateTime, DateUtil};

pub const COMPLETE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseModule {
    pub title: String,
    pub lessons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub instructor_id: String,
    /// Zero means free
    pub price: f64,
    pub modules: Vec<CourseModule>,
    pub published: bool,
    /// User ids in enrollment order
    pub enrolled: Vec<String>,
    /// Percent complete per enrolled user, in [0, 100]
    pub progress: HashMap<String, f64>,
    pub created_at: DateTime,
}

impl Course {
    pub fn new(title: &str, instructor_id: &str, price: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            instructor_id: instructor_id.to_string(),
            price,
            modules: Vec::new(),
            published: false,
            enrolled: Vec::new(),
            progress: HashMap::new(),
            created_at: DateUtil::now(),
        }
    }

    pub fn add_module(&mut self, title: &str, lessons: Vec<String>) {
        self.modules.push(CourseModule {
            title: title.trim().to_string(),
            lessons,
        });
    }

    pub fn total_lessons(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    pub fn is_free(&self) -> bool {
        self.price <= 0.0
    }

    pub fn is_enrolled(&self, user_id: &str) -> bool {
        self.enrolled.iter().any(|id| id == user_id)
    }

    pub fn enroll(&mut self, user_id: &str) {
        self.enrolled.push(user_id.to_string());
        self.progress.insert(user_id.to_string(), 0.0);
    }

    pub fn progress_of(&self, user_id: &str) -> Option<f64> {
        self.progress.get(user_id).copied()
    }

    /// Instructor of the course or an administrator
    pub fn is_managed_by(&self, user: &User) -> bool {
        user.role.is_admin() || user.id == self.instructor_id
    }
}
