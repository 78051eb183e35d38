mod memory;
mod mongo;

pub use memory::{InMemoryCertificateRepository, InMemoryCourseRepository};
pub use mongo::{MongoCertificateRepository, MongoCourseRepository};

use anyhow::Result;
use async_trait::async_trait;

use crate::shared::models::{Certificate, Course};

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn insert(&self, course: &Course) -> Result<()>;

    /// Replaces the stored record with the same id.
    async fn update(&self, course: &Course) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Course>>;

    /// All courses, oldest first.
    async fn list(&self) -> Result<Vec<Course>>;
}

#[async_trait]
pub trait CertificateRepository: Send + Sync {
    async fn insert(&self, certificate: &Certificate) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Certificate>>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Certificate>>;
}
